use thiserror::Error;

/// Failure of a single enrichment lookup.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("No API key configured for the enrichment service")]
    MissingCredential,

    #[error("Failed to call enrichment API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Enrichment API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No response from AI")]
    EmptyResponse,

    #[error("Failed to parse enrichment response: {0}")]
    Malformed(String),
}

