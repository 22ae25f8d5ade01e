//! API client for the Adobe Analytics 2.0 and collection endpoints.
//!
//! Covers the server-to-server OAuth token exchange, windowed/paged audit-log
//! fetching, export validation, the occurrences report used by the
//! existing-data check, and bulk ingestion.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, multipart, Client, Method};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::SessionData;
use crate::compress;
use crate::config::Config;
use crate::dates::{self, DateWindow};
use crate::models::AuditRecord;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the IMS token exchange
const IMS_BASE_URL: &str = "https://ims-na1.adobelogin.com";

/// Base URL for the analytics API (audit logs, reports)
const ANALYTICS_BASE_URL: &str = "https://analytics.adobe.io";

/// Base URL for the collection API (validation, bulk ingestion)
const COLLECT_BASE_URL: &str = "https://analytics-collection.adobe.io";

/// HTTP request timeout in seconds, unless the config overrides it
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Audit-log page size
const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Visitor group id the collection endpoints require
const COLLECT_VGID: &str = "usage_group1";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UsageLogPage {
    #[serde(default)]
    content: Vec<AuditRecord>,
    #[serde(rename = "lastPage", default = "default_last_page")]
    last_page: bool,
    #[serde(rename = "totalPages", default)]
    total_pages: i64,
}

fn default_last_page() -> bool {
    true
}

/// Outcome of the bulk validation endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationOutcome {
    #[serde(default)]
    pub success: bool,
}

/// Filters and bounds for one audit-log fetch. Only the date range is
/// required; everything else narrows the server-side query.
#[derive(Debug, Clone)]
pub struct UsageLogQuery {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub login: Option<String>,
    pub ip: Option<String>,
    pub rsid: Option<String>,
    pub event_type: Option<String>,
    pub event: Option<String>,
    pub limit: u32,
}

impl UsageLogQuery {
    pub fn new(start_date: chrono::NaiveDate, end_date: chrono::NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            login: None,
            ip: None,
            rsid: None,
            event_type: None,
            event: None,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Authenticated client. Holds the bearer token; all vendor-specific headers
/// are composed per request, never stored on the underlying `reqwest::Client`.
pub struct ApiClient {
    client: Client,
    config: Config,
    session: Option<SessionData>,
    ims_base: String,
    analytics_base: String,
    collect_base: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config: config.clone(),
            session: None,
            ims_base: IMS_BASE_URL.to_string(),
            analytics_base: ANALYTICS_BASE_URL.to_string(),
            collect_base: COLLECT_BASE_URL.to_string(),
        })
    }

    /// Point the client at different hosts (tests run against a local mock)
    pub fn with_base_urls(mut self, ims: &str, analytics: &str, collect: &str) -> Self {
        self.ims_base = ims.trim_end_matches('/').to_string();
        self.analytics_base = analytics.trim_end_matches('/').to_string();
        self.collect_base = collect.trim_end_matches('/').to_string();
        self
    }

    pub fn session(&self) -> Option<&SessionData> {
        self.session.as_ref()
    }

    /// Exchange client credentials for a bearer token.
    pub async fn authenticate(&mut self) -> Result<()> {
        let url = format!(
            "{}/ims/token/v3?client_id={}",
            self.ims_base, self.config.client_id
        );
        let params = [
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.config.scopes.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::TokenExchange {
                status,
                body: ApiError::truncate_body(&body),
            }
            .into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        self.session = Some(SessionData::new(token.access_token));
        info!("authenticated with IMS");
        Ok(())
    }

    /// Redo the token exchange after an authentication failure. Nothing is
    /// retried automatically; callers re-invoke the failed operation.
    pub async fn refresh_access_token(&mut self) -> Result<()> {
        self.authenticate().await
    }

    /// Base request with auth headers for the analytics/collection APIs
    fn request(&self, method: Method, url: &str) -> Result<reqwest::RequestBuilder> {
        let token = self
            .session
            .as_ref()
            .map(|session| session.access_token.as_str())
            .ok_or(ApiError::Unauthorized)?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("x-api-key", &self.config.client_id))
    }

    /// Check if response is successful, returning an error with status and
    /// body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    // ===== Audit logs =====

    /// Fetch the complete ordered sequence of audit records for the query's
    /// date range, splitting it into windows the endpoint accepts and paging
    /// through each. Any failed page aborts the whole fetch.
    pub async fn fetch_usage_logs(&self, query: &UsageLogQuery) -> Result<Vec<AuditRecord>> {
        let windows = dates::split_range(query.start_date, query.end_date)?;
        let url = format!(
            "{}/api/{}/auditlogs/usage",
            self.analytics_base, self.config.company_id
        );

        info!(
            start = %query.start_date,
            end = %query.end_date,
            windows = windows.len(),
            "fetching usage audit logs"
        );

        let mut all_records = Vec::new();
        for window in &windows {
            self.fetch_window(&url, query, window, &mut all_records)
                .await?;
        }

        info!(records = all_records.len(), "fetch complete");
        Ok(all_records)
    }

    async fn fetch_window(
        &self,
        url: &str,
        query: &UsageLogQuery,
        window: &DateWindow,
        out: &mut Vec<AuditRecord>,
    ) -> Result<()> {
        debug!(start = %window.start_param(), end = %window.end_param(), "fetching window");

        let mut page: u32 = 0;
        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("startDate", window.start_param()),
                ("endDate", window.end_param()),
                ("limit", query.limit.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(login) = &query.login {
                params.push(("login", login.clone()));
            }
            if let Some(ip) = &query.ip {
                params.push(("ip", ip.clone()));
            }
            if let Some(rsid) = &query.rsid {
                params.push(("rsid", rsid.clone()));
            }
            if let Some(event_type) = &query.event_type {
                params.push(("eventType", event_type.clone()));
            }
            if let Some(event) = &query.event {
                params.push(("event", event.clone()));
            }

            let response = self
                .request(Method::GET, url)?
                .query(&params)
                .send()
                .await
                .context("Failed to send audit log request")?;
            let response = Self::check_response(response).await?;

            let page_data: UsageLogPage = response
                .json()
                .await
                .context("Failed to parse audit log page")?;

            debug!(
                page = page + 1,
                total_pages = page_data.total_pages,
                rows = page_data.content.len(),
                "fetched page"
            );
            out.extend(page_data.content);

            if page_data.last_page {
                return Ok(());
            }
            page += 1;
        }
    }

    // ===== Collection endpoints =====

    /// Submit the gzipped export to the validation endpoint.
    pub async fn validate_export(&self, csv_path: &Path) -> Result<ValidationOutcome> {
        let url = format!("{}/aa/collect/v1/events/validate", self.collect_base);
        let response = self.send_export(&url, csv_path).await?;
        response
            .json()
            .await
            .context("Failed to parse validation response")
    }

    /// Submit the gzipped export to the ingestion endpoint and return the
    /// parsed ingestion response. Callers run the submission guard first.
    pub async fn submit_export(&self, csv_path: &Path) -> Result<Value> {
        let url = format!("{}/aa/collect/v1/events", self.collect_base);
        let response = self.send_export(&url, csv_path).await?;
        response
            .json()
            .await
            .context("Failed to parse ingestion response")
    }

    /// Gzip and POST an export as a multipart upload. The collection headers
    /// live on this one request only.
    async fn send_export(&self, url: &str, csv_path: &Path) -> Result<reqwest::Response> {
        let compressed = compress::gzip_file(csv_path)
            .with_context(|| format!("Failed to compress export: {}", csv_path.display()))?;
        let file_name = csv_path
            .file_name()
            .map(|name| format!("{}.gz", name.to_string_lossy()))
            .unwrap_or_else(|| "export.csv.gz".to_string());

        let part = multipart::Part::bytes(compressed).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let response = self
            .request(Method::POST, url)?
            .header(header::ACCEPT, "application/json")
            .header("x-adobe-vgid", COLLECT_VGID)
            .multipart(form)
            .send()
            .await
            .context("Failed to send export upload")?;
        Self::check_response(response).await
    }

    // ===== Reporting =====

    /// Run the occurrences ranked report over a date window, for the
    /// existing-data check.
    pub async fn occurrences_report(&self, rsid: &str, window: &DateWindow) -> Result<Value> {
        let url = format!(
            "{}/api/{}/reports",
            self.analytics_base, self.config.company_id
        );

        let body = serde_json::json!({
            "rsid": rsid,
            "globalFilters": [
                {"type": "dateRange", "dateRange": window.date_range_param()}
            ],
            "metricContainer": {
                "metrics": [
                    {
                        "columnId": "metrics/occurrences:::0",
                        "id": "metrics/occurrences",
                        "filters": ["STATIC_ROW_COMPONENT_1"]
                    }
                ],
                "metricFilters": [
                    {
                        "id": "STATIC_ROW_COMPONENT_1",
                        "type": "segment",
                        "segmentId": "All_Visits"
                    }
                ]
            },
            "settings": {
                "countRepeatInstances": true,
                "includeAnnotations": true,
                "dimensionSort": "asc"
            }
        });

        let response = self
            .request(Method::POST, &url)?
            .header(header::ACCEPT, "application/json")
            .header("x-proxy-global-company-id", &self.config.company_id)
            .json(&body)
            .send()
            .await
            .context("Failed to send report request")?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse report response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_log_page_defaults_to_last_page() {
        // A page without `lastPage` must not loop forever
        let page: UsageLogPage = serde_json::from_str("{}").unwrap();
        assert!(page.last_page);
        assert!(page.content.is_empty());
    }

    #[test]
    fn test_usage_log_page_parses_content() {
        let page: UsageLogPage = serde_json::from_value(serde_json::json!({
            "content": [{"eventType": 5, "login": "jane@example.com"}],
            "lastPage": false,
            "totalPages": 3
        }))
        .unwrap();
        assert_eq!(page.content.len(), 1);
        assert!(!page.last_page);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_validation_outcome_defaults_to_failure() {
        let outcome: ValidationOutcome = serde_json::from_str("{}").unwrap();
        assert!(!outcome.success);
    }
}
