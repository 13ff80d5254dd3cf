use super::{types::Config, ConfigError};
use crate::work::parse_identifiers;

/// Longest accepted transfer time limit (30 days).
const MAX_TRANSFER_TIMEOUT_SECS: u64 = 30 * 24 * 60 * 60;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration
/// Currently validates:
/// - Page URL template is http(s) and contains `{id}`
/// - Transfer program is set and its arguments reference `{url}`
/// - Transfer timeout is between 1 second and 30 days
/// - Download file extension is not empty
/// - Filler entries parse as identifiers
/// - Status port is not 0 when the endpoint is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let template = &config.extraction.page_url_template;
    if !template.contains("{id}") {
        return Err(invalid(
            "extraction.page_url_template must contain the {id} placeholder",
        ));
    }
    if !(template.starts_with("http://") || template.starts_with("https://")) {
        return Err(invalid(
            "extraction.page_url_template must be an http(s) URL",
        ));
    }

    if config.transfer.program.trim().is_empty() {
        return Err(invalid("transfer.program cannot be empty"));
    }
    if !config.transfer.args.iter().any(|a| a.contains("{url}")) {
        return Err(invalid(
            "transfer.args must contain the {url} placeholder",
        ));
    }

    let timeout = config.transfer.timeout_secs;
    if timeout == 0 || timeout > MAX_TRANSFER_TIMEOUT_SECS {
        return Err(invalid(format!(
            "transfer.timeout_secs must be between 1 and {}",
            MAX_TRANSFER_TIMEOUT_SECS
        )));
    }

    let extension = config.download.file_extension.trim();
    if extension.is_empty() || extension.contains('/') {
        return Err(invalid(
            "download.file_extension must be a non-empty name",
        ));
    }

    let filler = parse_identifiers(&config.classifier.filler, config.classifier.max_range_len);
    if let Some(err) = filler.rejected.first() {
        return Err(invalid(format!("classifier.filler: {}", err)));
    }

    if config.status.enabled && config.status.port == 0 {
        return Err(invalid("status.port cannot be 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_template_without_placeholder() {
        let mut config = Config::default();
        config.extraction.page_url_template = "https://example.com/episodes".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("{id}"));
    }

    #[test]
    fn test_validate_template_scheme() {
        let mut config = Config::default();
        config.extraction.page_url_template = "ftp://example.com/{id}".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_transfer_args_need_url() {
        let mut config = Config::default();
        config.transfer.args = vec!["-o".to_string(), "{output}".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_transfer_timeout_bounds() {
        let mut config = Config::default();
        config.transfer.timeout_secs = u64::MAX;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("transfer.timeout_secs"));

        config.transfer.timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        config.transfer.timeout_secs = MAX_TRANSFER_TIMEOUT_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_bad_filler() {
        let mut config = Config::default();
        config.classifier.filler = vec!["5".to_string(), "9-2".to_string()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("9-2"));
    }

    #[test]
    fn test_validate_status_port_zero_fails() {
        let mut config = Config::default();
        config.status.port = 0;
        assert!(validate_config(&config).is_ok());

        config.status.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
