use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.max_links must be positive")]
    InvalidMaxLinks,

    #[error("server.max_payload_bytes must be positive")]
    InvalidMaxPayloadBytes,

    #[error("downloader.program must not be empty")]
    EmptyProgram,

    #[error("downloader.output_path must not be empty")]
    EmptyOutputPath,

    #[error("auth.password is set but blank; unset it to run without authorization")]
    BlankPassword,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_downloader(config)?;
    validate_auth(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_links == 0 {
        return Err(ValidationError::InvalidMaxLinks);
    }

    if config.server.max_payload_bytes == 0 {
        return Err(ValidationError::InvalidMaxPayloadBytes);
    }

    Ok(())
}

fn validate_downloader(config: &Config) -> Result<(), ValidationError> {
    if config.downloader.program.trim().is_empty() {
        return Err(ValidationError::EmptyProgram);
    }

    if config.downloader.output_path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyOutputPath);
    }

    Ok(())
}

fn validate_auth(config: &Config) -> Result<(), ValidationError> {
    match &config.auth.password {
        Some(password) if password.trim().is_empty() => Err(ValidationError::BlankPassword),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_max_links() {
        let mut config = Config::default();
        config.server.max_links = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidMaxLinks)));
    }

    #[test]
    fn test_zero_payload_limit() {
        let mut config = Config::default();
        config.server.max_payload_bytes = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidMaxPayloadBytes)));
    }

    #[test]
    fn test_empty_program() {
        let mut config = Config::default();
        config.downloader.program = "  ".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::EmptyProgram)));
    }

    #[test]
    fn test_empty_output_path() {
        let mut config = Config::default();
        config.downloader.output_path = PathBuf::new();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::EmptyOutputPath)));
    }

    #[test]
    fn test_blank_password() {
        let mut config = Config::default();
        config.auth.password = Some(" ".to_string());

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::BlankPassword)));
    }
}
