//! Google Sheets lead sink.
//!
//! Appends one row per lead through the Sheets `values:append` endpoint
//! using a bearer access token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::model::LeadRecord;
use super::sink::LeadSink;
use crate::error::LeadError;

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sheets sink configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub access_token: SecretString,
    pub api_base: String,
    /// Upper bound on one append, connect to response body.
    pub request_timeout: Duration,
}

impl SheetsConfig {
    /// Returns `None` unless both `GOOGLE_SHEET_ID` and
    /// `GOOGLE_SHEETS_ACCESS_TOKEN` are set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let spreadsheet_id = lookup("GOOGLE_SHEET_ID").filter(|s| !s.trim().is_empty())?;
        let access_token =
            lookup("GOOGLE_SHEETS_ACCESS_TOKEN").filter(|s| !s.trim().is_empty())?;
        let sheet_name = lookup("GOOGLE_SHEET_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Sheet1".to_string());
        let api_base = lookup("GOOGLE_SHEETS_API_BASE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Some(Self {
            spreadsheet_id,
            sheet_name,
            access_token: SecretString::from(access_token),
            api_base,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }
}

pub struct SheetsLeadSink {
    config: SheetsConfig,
    client: reqwest::Client,
}

impl SheetsLeadSink {
    pub fn new(config: SheetsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build Sheets HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { config, client }
    }

    /// `{base}/v4/spreadsheets/{id}/values/{sheet}!A1:append`, with the id
    /// and range each encoded as a single path segment.
    fn append_url(&self) -> Result<Url, LeadError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| LeadError::Http(format!("invalid API base: {e}")))?;
        let range = format!("{}!A1:append", self.config.sheet_name);
        url.path_segments_mut()
            .map_err(|()| LeadError::Http("API base cannot carry a path".into()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.config.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        Ok(url)
    }

    async fn send(&self, record: &LeadRecord) -> Result<(), LeadError> {
        let body = serde_json::json!({ "values": [record.row_json()] });

        let response = self
            .client
            .post(self.append_url()?)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LeadError::Timeout(self.config.request_timeout)
                } else {
                    LeadError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LeadSink for SheetsLeadSink {
    fn name(&self) -> &str {
        "google_sheets"
    }

    async fn append(&self, record: &LeadRecord) -> Result<(), LeadError> {
        // The client timeout covers the request; this also bounds the
        // error-body read on rejections.
        match tokio::time::timeout(self.config.request_timeout, self.send(record)).await {
            Ok(Ok(())) => {
                debug!(lead_id = %record.id, "Row appended to sheet");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(lead_id = %record.id, "Sheet append timed out");
                Err(LeadError::Timeout(self.config.request_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::*;
    use crate::campaigns::CampaignKind;
    use crate::leads::model::column;
    use crate::orchestrator::model::Profile;

    #[derive(Default)]
    struct Captured {
        range: Option<String>,
        query: Option<std::collections::HashMap<String, String>>,
        auth: Option<String>,
        body: Option<serde_json::Value>,
    }

    async fn start_stub(status: StatusCode) -> (String, Arc<Mutex<Captured>>) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let app = Router::new()
            .route(
                "/v4/spreadsheets/{id}/values/{range}",
                post(
                    move |State(captured): State<Arc<Mutex<Captured>>>,
                          Path((_id, range)): Path<(String, String)>,
                          Query(query): Query<std::collections::HashMap<String, String>>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let mut c = captured.lock().await;
                        c.range = Some(range);
                        c.query = Some(query);
                        c.auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        c.body = Some(body);
                        (status, Json(serde_json::json!({})))
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://127.0.0.1:{port}"), captured)
    }

    fn config(api_base: String) -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: "sheet-123".into(),
            sheet_name: "Leads".into(),
            access_token: SecretString::from("token-abc".to_string()),
            api_base,
            request_timeout: Duration::from_secs(5),
        }
    }

    fn record() -> LeadRecord {
        let profile = Profile {
            name: Some("Ali".into()),
            email: Some("ali@example.com".into()),
            ..Default::default()
        };
        LeadRecord::new(
            &profile,
            CampaignKind::IncomeProtection,
            &[
                (column::ANNUAL_INCOME, "60000".into()),
                (column::COVERAGE_YEARS, "20".into()),
            ],
        )
    }

    #[tokio::test]
    async fn appends_row_with_bearer_token() {
        let (base, captured) = start_stub(StatusCode::OK).await;
        let sink = SheetsLeadSink::new(config(base));

        sink.append(&record()).await.unwrap();

        let c = captured.lock().await;
        assert_eq!(c.range.as_deref(), Some("Leads!A1:append"));
        let query = c.query.as_ref().unwrap();
        assert_eq!(query["valueInputOption"], "USER_ENTERED");
        assert_eq!(query["insertDataOption"], "INSERT_ROWS");
        assert_eq!(c.auth.as_deref(), Some("Bearer token-abc"));

        let row = &c.body.as_ref().unwrap()["values"][0];
        assert_eq!(row.as_array().unwrap().len(), 16);
        assert_eq!(row[column::NAME], "Ali");
        assert_eq!(row[column::SELECTED_PLAN], "sgsa");
        assert_eq!(row[column::ANNUAL_INCOME], "60000");
        assert!(row[column::LEGACY_AMOUNT].is_null());
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, _captured) = start_stub(StatusCode::FORBIDDEN).await;
        let sink = SheetsLeadSink::new(config(base));

        let err = sink.append(&record()).await.unwrap_err();
        assert!(matches!(err, LeadError::Rejected { status: 403, .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let sink = SheetsLeadSink::new(config("http://127.0.0.1:9".into()));
        let err = sink.append(&record()).await.unwrap_err();
        assert!(matches!(err, LeadError::Http(_)));
    }

    #[tokio::test]
    async fn sheet_name_is_one_encoded_segment() {
        let (base, captured) = start_stub(StatusCode::OK).await;
        let mut config = config(format!("{base}/"));
        config.sheet_name = "Q3 leads #1/2026?".into();
        let sink = SheetsLeadSink::new(config);

        let url = sink.append_url().unwrap();
        assert!(url.path().ends_with("/values/Q3%20leads%20%231%2F2026%3F!A1:append"));
        assert!(url.query().is_none());

        sink.append(&record()).await.unwrap();
        let c = captured.lock().await;
        assert_eq!(c.range.as_deref(), Some("Q3 leads #1/2026?!A1:append"));
        assert_eq!(c.query.as_ref().unwrap()["valueInputOption"], "USER_ENTERED");
    }

    #[tokio::test]
    async fn unresponsive_sheet_times_out() {
        let app = Router::new().route(
            "/v4/spreadsheets/{id}/values/{range}",
            post(|| async {
                std::future::pending::<()>().await;
                StatusCode::OK
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = config(format!("http://127.0.0.1:{port}"));
        config.request_timeout = Duration::from_millis(200);
        let sink = SheetsLeadSink::new(config);

        let result = tokio::time::timeout(Duration::from_secs(5), sink.append(&record()))
            .await
            .expect("append should give up on its own");
        assert!(matches!(result, Err(LeadError::Timeout(d)) if d == Duration::from_millis(200)));
    }

    #[test]
    fn config_requires_id_and_token() {
        assert!(SheetsConfig::from_lookup(|_| None).is_none());
        assert!(
            SheetsConfig::from_lookup(|k| (k == "GOOGLE_SHEET_ID").then(|| "x".to_string()))
                .is_none()
        );

        let config = SheetsConfig::from_lookup(|k| match k {
            "GOOGLE_SHEET_ID" => Some("abc".into()),
            "GOOGLE_SHEETS_ACCESS_TOKEN" => Some("tok".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.sheet_name, "Sheet1");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.access_token.expose_secret(), "tok");
    }
}
