pub mod config;
pub mod logging;
pub mod error;
pub mod sheet;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use sheet::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.enrichment.model, "gemini-3-pro-preview");
        assert!(config.enrichment.timeout_seconds.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_configured_api_key_is_kept() {
        let mut enrichment = EnrichmentConfig {
            api_key: "configured".to_string(),
            ..EnrichmentConfig::default()
        };
        enrichment.resolve_api_key();
        assert_eq!(enrichment.api_key, "configured");
        assert!(enrichment.has_api_key());
    }

    #[test]
    fn test_error_handling() {
        let error = PartScoutError::read("corrupt workbook");
        assert_eq!(error.error_code(), "READ_ERROR");
        assert_eq!(error.http_status_code(), 400);
    }
}
