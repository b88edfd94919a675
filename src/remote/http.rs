//! HTTP client for a document-store REST surface.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{Result, TrackerError};
use crate::record::{Record, Status};

use super::RemoteCollection;

/// Remote collection reached over HTTP.
///
/// Endpoints:
/// - `POST   {base}/collections/{name}/documents` — insert, returns `{"id"}`
/// - `GET    {base}/collections/{name}/documents` — list, optional equality
///   filters as query parameters
/// - `DELETE {base}/collections/{name}/documents/{id}`
#[derive(Clone)]
pub struct HttpCollection {
  client: reqwest::Client,
  base_url: Url,
  collection: String,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
  id: String,
}

impl HttpCollection {
  pub fn new(config: &RemoteConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| TrackerError::Remote(format!("Invalid remote base url: {}", e)))?;

    Ok(Self {
      client: reqwest::Client::new(),
      base_url,
      collection: config.collection.clone(),
    })
  }

  fn documents_url(&self) -> Result<Url> {
    self
      .base_url
      .join(&format!("collections/{}/documents", self.collection))
      .map_err(|e| TrackerError::Remote(format!("Invalid documents url: {}", e)))
  }

  fn document_url(&self, id: &str) -> Result<Url> {
    self
      .base_url
      .join(&format!("collections/{}/documents/{}", self.collection, id))
      .map_err(|e| TrackerError::Remote(format!("Invalid document url: {}", e)))
  }
}

#[async_trait]
impl RemoteCollection for HttpCollection {
  async fn insert(&self, record: &Record) -> Result<String> {
    let response = self
      .client
      .post(self.documents_url()?)
      .json(record)
      .send()
      .await
      .map_err(|e| TrackerError::Remote(format!("Failed to insert record: {}", e)))?
      .error_for_status()
      .map_err(|e| TrackerError::Remote(format!("Insert rejected: {}", e)))?;

    let body: InsertResponse = response
      .json()
      .await
      .map_err(|e| TrackerError::Remote(format!("Failed to parse insert response: {}", e)))?;

    Ok(body.id)
  }

  async fn query_all(&self) -> Result<Vec<Record>> {
    let response = self
      .client
      .get(self.documents_url()?)
      .send()
      .await
      .map_err(|e| TrackerError::Remote(format!("Failed to fetch records: {}", e)))?
      .error_for_status()
      .map_err(|e| TrackerError::Remote(format!("Fetch rejected: {}", e)))?;

    response
      .json()
      .await
      .map_err(|e| TrackerError::Remote(format!("Failed to parse records: {}", e)))
  }

  async fn query_where(&self, char_name: &str, item: &str, status: Status) -> Result<Vec<Record>> {
    let response = self
      .client
      .get(self.documents_url()?)
      .query(&[
        ("char", char_name),
        ("item", item),
        ("status", status.as_str()),
      ])
      .send()
      .await
      .map_err(|e| TrackerError::Remote(format!("Failed to query records: {}", e)))?
      .error_for_status()
      .map_err(|e| TrackerError::Remote(format!("Query rejected: {}", e)))?;

    response
      .json()
      .await
      .map_err(|e| TrackerError::Remote(format!("Failed to parse query result: {}", e)))
  }

  async fn delete_by_id(&self, id: &str) -> Result<()> {
    self
      .client
      .delete(self.document_url(id)?)
      .send()
      .await
      .map_err(|e| TrackerError::Remote(format!("Failed to delete record {}: {}", id, e)))?
      .error_for_status()
      .map_err(|e| TrackerError::Remote(format!("Delete of {} rejected: {}", id, e)))?;

    Ok(())
  }
}
