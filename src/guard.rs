//! Pre-submission safety checks.
//!
//! Submission is allowed only after the export passes bulk validation and
//! the target report suite shows no existing data for the export's date
//! range. The two failure modes stay distinct: a tripped safety check is
//! [`ApiError::ExistingData`], never a generic request failure.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::api::{ApiClient, ApiError};
use crate::dates::DateWindow;
use crate::export;

/// Occurrence totals at or below this are written off as stray rows outside
/// the requested range rather than real data.
pub const EXISTING_DATA_TOLERANCE: f64 = 2.0;

pub fn has_existing_data(total: f64) -> bool {
    total > EXISTING_DATA_TOLERANCE
}

/// First occurrences total from a reporting-API response.
pub fn summary_total(report: &Value) -> Result<f64, ApiError> {
    let totals = report
        .get("summaryData")
        .and_then(|summary| summary.get("totals"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ApiError::InvalidResponse("summaryData.totals missing from report response".to_string())
        })?;
    totals.first().and_then(Value::as_f64).ok_or_else(|| {
        ApiError::InvalidResponse("summaryData.totals is empty or non-numeric".to_string())
    })
}

/// Run both pre-submission checks against a written export.
pub async fn ensure_safe_to_submit(client: &ApiClient, csv_path: &Path) -> Result<()> {
    let outcome = client.validate_export(csv_path).await?;
    if !outcome.success {
        return Err(ApiError::ValidationRejected.into());
    }
    info!("export passed bulk validation");

    let summary = export::read_summary(csv_path)?;
    info!(
        rsid = %summary.rsid,
        min_date = %summary.min_date,
        max_date = %summary.max_date,
        "checking report suite for existing data"
    );

    let window = DateWindow::inclusive(summary.min_date, summary.max_date)?;
    let report = client.occurrences_report(&summary.rsid, &window).await?;
    let total = summary_total(&report)?;

    if has_existing_data(total) {
        return Err(ApiError::ExistingData { total }.into());
    }
    info!(total, "no existing data for the export date range");
    Ok(())
}

/// Validate, check for existing data, then submit. The ingestion call is
/// never reached when either check fails.
pub async fn guarded_submit(client: &ApiClient, csv_path: &Path) -> Result<Value> {
    ensure_safe_to_submit(client, csv_path).await?;
    client.submit_export(csv_path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tolerance_boundary() {
        assert!(!has_existing_data(0.0));
        assert!(!has_existing_data(1.0));
        assert!(!has_existing_data(2.0));
        assert!(has_existing_data(3.0));
        assert!(has_existing_data(2.5));
        assert!(has_existing_data(1000.0));
    }

    #[test]
    fn test_summary_total_reads_first_total() {
        let report = json!({"summaryData": {"totals": [236.0, 12.0]}});
        assert_eq!(summary_total(&report).unwrap(), 236.0);
    }

    #[test]
    fn test_summary_total_missing_summary_data() {
        let report = json!({"rows": []});
        assert!(matches!(
            summary_total(&report),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_summary_total_empty_totals() {
        let report = json!({"summaryData": {"totals": []}});
        assert!(matches!(
            summary_total(&report),
            Err(ApiError::InvalidResponse(_))
        ));
    }
}
