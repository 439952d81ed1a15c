//! Part records and their enrichment results.

use serde::{Deserialize, Serialize};

use crate::status::RowStatus;

/// Placeholder for enrichment fields that have not been attempted yet.
pub const PENDING: &str = "Pending";
/// Placeholder for enrichment fields the remote lookup could not resolve.
pub const NOT_FOUND: &str = "Not found";
/// Generic per-row error tag attached to failed rows.
pub const API_ERROR: &str = "API Error";

/// One valid input row: a part number and the vendor website to search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    pub part: String,
    pub website: String,
}

impl PartRecord {
    pub fn new(part: impl Into<String>, website: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            website: website.into(),
        }
    }
}

/// The three fields returned by the enrichment service for a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub link: String,
    pub lifecycle: String,
    pub datasheet: String,
}

impl EnrichmentResult {
    pub fn not_found() -> Self {
        Self {
            link: NOT_FOUND.to_string(),
            lifecycle: NOT_FOUND.to_string(),
            datasheet: NOT_FOUND.to_string(),
        }
    }

    /// Replace blank fields with the "Not found" sentinel.
    pub fn normalized(self) -> Self {
        fn or_not_found(value: String) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                NOT_FOUND.to_string()
            } else {
                trimmed.to_string()
            }
        }

        Self {
            link: or_not_found(self.link),
            lifecycle: or_not_found(self.lifecycle),
            datasheet: or_not_found(self.datasheet),
        }
    }
}

/// A part record together with its enrichment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub part: String,
    pub website: String,
    pub link: String,
    pub lifecycle: String,
    pub datasheet: String,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl EnrichedRecord {
    /// Fresh record with every enrichment field set to "Pending".
    pub fn pending(record: PartRecord) -> Self {
        Self {
            part: record.part,
            website: record.website,
            link: PENDING.to_string(),
            lifecycle: PENDING.to_string(),
            datasheet: PENDING.to_string(),
            status: RowStatus::Pending,
            error_detail: None,
        }
    }

    pub fn begin(&mut self) {
        debug_assert!(self.status.can_transition_to(RowStatus::Processing));
        self.status = RowStatus::Processing;
    }

    /// Return a row abandoned in Processing to Pending.
    pub fn requeue(&mut self) {
        debug_assert!(self.status.can_transition_to(RowStatus::Pending));
        self.status = RowStatus::Pending;
    }

    pub fn complete(&mut self, result: EnrichmentResult) {
        debug_assert!(self.status.can_transition_to(RowStatus::Completed));
        self.link = result.link;
        self.lifecycle = result.lifecycle;
        self.datasheet = result.datasheet;
        self.status = RowStatus::Completed;
        self.error_detail = None;
    }

    /// Mark the row failed. All three fields become "Not found".
    pub fn fail(&mut self, detail: impl Into<String>) {
        debug_assert!(self.status.can_transition_to(RowStatus::Failed));
        let not_found = EnrichmentResult::not_found();
        self.link = not_found.link;
        self.lifecycle = not_found.lifecycle;
        self.datasheet = not_found.datasheet;
        self.status = RowStatus::Failed;
        self.error_detail = Some(detail.into());
    }

    pub fn lifecycle_class(&self) -> LifecycleClass {
        LifecycleClass::classify(&self.lifecycle)
    }
}

/// Coarse grouping of free-text lifecycle statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleClass {
    Active,
    Obsolete,
    Unknown,
}

impl LifecycleClass {
    pub fn classify(lifecycle: &str) -> Self {
        let lower = lifecycle.to_lowercase();
        if lower.contains("active") || lower.contains("in stock") {
            Self::Active
        } else if lower.contains("obsolete") || lower.contains("eol") || lower.contains("discontinued") {
            Self::Obsolete
        } else {
            Self::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_record() {
        let record = EnrichedRecord::pending(PartRecord::new("ABC123", "vendor.com"));
        assert_eq!(record.part, "ABC123");
        assert_eq!(record.website, "vendor.com");
        assert_eq!(record.link, PENDING);
        assert_eq!(record.lifecycle, PENDING);
        assert_eq!(record.datasheet, PENDING);
        assert_eq!(record.status, RowStatus::Pending);
        assert!(record.error_detail.is_none());
    }

    #[test]
    fn test_complete_then_fail_on_retry() {
        let mut record = EnrichedRecord::pending(PartRecord::new("ABC123", "vendor.com"));
        record.begin();
        record.fail(API_ERROR);
        assert_eq!(record.status, RowStatus::Failed);
        assert_eq!(record.link, NOT_FOUND);
        assert_eq!(record.error_detail.as_deref(), Some(API_ERROR));

        record.begin();
        record.complete(EnrichmentResult {
            link: "https://vendor.com/abc123".to_string(),
            lifecycle: "Active".to_string(),
            datasheet: "https://vendor.com/abc123.pdf".to_string(),
        });
        assert_eq!(record.status, RowStatus::Completed);
        assert_eq!(record.lifecycle, "Active");
        assert!(record.error_detail.is_none());
    }

    #[test]
    fn test_normalized_result() {
        let result = EnrichmentResult {
            link: "  https://vendor.com/x ".to_string(),
            lifecycle: "".to_string(),
            datasheet: "   ".to_string(),
        }
        .normalized();

        assert_eq!(result.link, "https://vendor.com/x");
        assert_eq!(result.lifecycle, NOT_FOUND);
        assert_eq!(result.datasheet, NOT_FOUND);
    }

    #[test]
    fn test_lifecycle_classification() {
        assert_eq!(LifecycleClass::classify("Active"), LifecycleClass::Active);
        assert_eq!(LifecycleClass::classify("In Stock"), LifecycleClass::Active);
        assert_eq!(LifecycleClass::classify("EOL"), LifecycleClass::Obsolete);
        assert_eq!(LifecycleClass::classify("Discontinued"), LifecycleClass::Obsolete);
        assert_eq!(LifecycleClass::classify("NRND"), LifecycleClass::Unknown);
        assert_eq!(LifecycleClass::classify(NOT_FOUND), LifecycleClass::Unknown);
    }

    #[test]
    fn test_error_detail_omitted_from_json() {
        let record = EnrichedRecord::pending(PartRecord::new("ABC123", "vendor.com"));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("error_detail").is_none());
        assert_eq!(json["status"], "pending");
    }
}
