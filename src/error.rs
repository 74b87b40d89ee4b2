use thiserror::Error;

/// Startup errors at the binary boundary. Remote failures never reach this
/// type; the engine converts them to user-visible messages at its intent
/// boundary.
#[derive(Debug, Error)]
pub enum VervalError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_is_prefixed() {
        let err = VervalError::Config("portal_base_url harus diakhiri '/'".into());
        assert_eq!(
            err.to_string(),
            "Config error: portal_base_url harus diakhiri '/'"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "verval.toml");
        assert!(matches!(VervalError::from(io), VervalError::Io(_)));
    }
}
