use async_trait::async_trait;
use partscout_models::EnrichmentResult;
use tracing::warn;

use crate::error::EnrichmentError;

/// Looks up link, lifecycle and datasheet for a part on a vendor website.
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    async fn enrich(&self, part: &str, website: &str) -> Result<EnrichmentResult, EnrichmentError>;

    /// Never fails: any error is logged and replaced by the all-"Not found" result.
    async fn enrich_or_not_found(&self, part: &str, website: &str) -> EnrichmentResult {
        match self.enrich(part, website).await {
            Ok(result) => result,
            Err(error) => {
                warn!(error = %error, part, website, "Enrichment failed, substituting Not found");
                EnrichmentResult::not_found()
            }
        }
    }
}
