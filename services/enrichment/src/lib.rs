//! PartScout Enrichment Client
//!
//! Asks a search-grounded language model for the product page, lifecycle
//! status and datasheet of a part.

pub mod client;
pub mod error;
pub mod gemini;
pub mod prompt;

pub use client::EnrichmentClient;
pub use error::EnrichmentError;
pub use gemini::GeminiClient;
