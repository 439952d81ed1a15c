//! # PartScout Domain Models
//!
//! Core data structures shared by the import, processing and export stages.
//!
//! ## Key Models
//!
//! - **PartRecord**: a part number and the vendor website to search, one per valid input row
//! - **EnrichedRecord**: a part record plus link, lifecycle, datasheet and row status
//! - **EnrichmentResult**: the three fields returned by the remote lookup for one part
//! - **RowStatus** / **RunState** / **Progress**: per-row and per-run processing state

pub mod part;
pub mod status;

pub use part::*;
pub use status::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_row_is_requeued() {
        let mut enriched = EnrichedRecord::pending(PartRecord::new("LM317T", "ti.com"));
        enriched.begin();
        enriched.requeue();
        assert_eq!(enriched.status, RowStatus::Pending);
        assert_eq!(enriched.link, PENDING);
    }

    #[test]
    fn test_not_found_result() {
        let result = EnrichmentResult::not_found();
        assert_eq!(result.link, NOT_FOUND);
        assert_eq!(result.lifecycle, NOT_FOUND);
        assert_eq!(result.datasheet, NOT_FOUND);
    }
}
