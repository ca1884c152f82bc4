// Reading exports back for the downstream profile-lookup step

use crate::error::{HarvestError, Result};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

/// Columns the lookup step selects by header label.
pub const REQUIRED_COLUMNS: [&str; 2] = ["Reviewer Name", "Reviewer Company"];

const ANONYMOUS: &str = "anonymous";

/// One export row as the lookup step sees it. Other columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnrichmentRow {
    #[serde(rename = "Reviewer Name")]
    pub reviewer_name: String,
    #[serde(rename = "Reviewer Company")]
    pub reviewer_company: String,
}

impl EnrichmentRow {
    pub fn profile_query(&self) -> Option<String> {
        profile_query(&self.reviewer_name, &self.reviewer_company)
    }
}

/// Read an export by header label, failing before any row is read when a
/// required column is absent.
pub fn read_for_enrichment(csv_bytes: &[u8]) -> Result<Vec<EnrichmentRow>> {
    let mut reader = ReaderBuilder::new().from_reader(csv_bytes);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(HarvestError::MissingColumns(missing));
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<EnrichmentRow>, _>>()?;
    debug!("Read {} rows for enrichment", rows.len());
    Ok(rows)
}

/// Search query for a reviewer's profile, or `None` for anonymous reviewers.
///
/// The company column usually reads "Title, Company"; only the segment after
/// the last comma names the employer.
pub fn profile_query(name: &str, company: &str) -> Option<String> {
    let name = name.trim();
    if name.eq_ignore_ascii_case(ANONYMOUS) {
        return None;
    }

    let employer = company.rsplit(',').next().unwrap_or(company).trim();
    Some(format!("{} {} site:linkedin.com/in", name, employer))
}

/// Output name for an enriched export: `processed_<name>`, or a timestamped
/// variant when that name is already taken.
pub fn processed_file_name(file_name: &str, taken: bool, now: NaiveDateTime) -> String {
    if taken {
        format!("processed_{}_{}", now.format("%Y%m%d_%H%M%S"), file_name)
    } else {
        format!("processed_{}", file_name)
    }
}
