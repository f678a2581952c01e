//! Async HTTP client for the SmartPlay open-data endpoint.

use std::{future::Future, time::Duration};

use courtwatch_core::{record::Record, source::DataSource};
use reqwest::Client;

use crate::{Error, Result, payload};

/// Public tennis availability file published by LCSD.
pub const DEFAULT_URL: &str =
  "https://data.smartplay.lcsd.gov.hk/rest/cms/api/v1/publ/contents/open-data/tennis/file";

/// Connection settings for the feed.
#[derive(Debug, Clone)]
pub struct SourceConfig {
  pub url:     String,
  pub timeout: Duration,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self { url: DEFAULT_URL.to_owned(), timeout: Duration::from_secs(15) }
  }
}

/// [`DataSource`] backed by a single HTTP GET.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SmartPlaySource {
  client: Client,
  url:    String,
}

impl SmartPlaySource {
  pub fn new(config: SourceConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, url: config.url })
  }

  pub fn url(&self) -> &str { &self.url }

  async fn get(&self) -> Result<Vec<Record>> {
    let resp = self.client.get(&self.url).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status(status));
    }

    let body = resp.bytes().await?;
    let records = payload::decode(&body)?;
    tracing::debug!(url = %self.url, rows = records.len(), "fetched availability");
    Ok(records)
  }
}

impl DataSource for SmartPlaySource {
  type Error = Error;

  fn fetch(&self) -> impl Future<Output = Result<Vec<Record>>> + Send + '_ {
    self.get()
  }
}

#[cfg(test)]
mod tests {
  use axum::{Router, http::StatusCode, routing::get};
  use tokio::net::TcpListener;

  use super::*;

  /// Serve `router` on an ephemeral port and return its base URL.
  async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn source(base: &str, path: &str) -> SmartPlaySource {
    SmartPlaySource::new(SourceConfig {
      url:     format!("{base}{path}"),
      timeout: Duration::from_secs(2),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn fetches_and_decodes_envelope() {
    let base = serve(Router::new().route(
      "/tennis",
      get(|| async {
        axum::Json(serde_json::json!({
          "data": [
            {
              "District_Name_EN": "Wan Chai",
              "Venue_Name_EN": "Victoria Park Tennis Court",
              "Available_Date": "2024-01-01",
              "Session_Start_Time": "19:00",
              "Available_Courts": "3"
            }
          ]
        }))
      }),
    ))
    .await;

    let records = source(&base, "/tennis").fetch().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].district.as_deref(), Some("Wan Chai"));
    assert_eq!(records[0].available_count, 3);
  }

  #[tokio::test]
  async fn non_success_status_is_an_error() {
    let base = serve(Router::new().route(
      "/tennis",
      get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance") }),
    ))
    .await;

    let err = source(&base, "/tennis").fetch().await.unwrap_err();
    assert!(matches!(err, Error::Status(s) if s == StatusCode::SERVICE_UNAVAILABLE));
  }

  #[tokio::test]
  async fn html_body_is_a_payload_error() {
    let base = serve(Router::new().route("/tennis", get(|| async { "<html></html>" }))).await;

    let err = source(&base, "/tennis").fetch().await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
  }

  #[tokio::test]
  async fn unreachable_host_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source(&format!("http://{addr}"), "/").fetch().await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
  }
}
