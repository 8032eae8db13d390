use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_errors_convert_with_question_mark() {
        fn parse(raw: &str) -> Result<url::Url> {
            Ok(url::Url::parse(raw)?)
        }
        assert!(matches!(parse("not a url"), Err(Error::Url(_))));
    }

    #[test]
    fn websocket_errors_are_boxed() {
        let err = Error::from(tokio_tungstenite::tungstenite::Error::ConnectionClosed);
        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.to_string().starts_with("WebSocket error"));
    }

    #[test]
    fn config_errors_are_transparent() {
        let err = Error::from(ConfigError::MissingField { field: "url" });
        assert_eq!(err.to_string(), "missing required field: url");
    }
}
