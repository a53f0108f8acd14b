use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unknown rotation anchor keyword '{0}'")]
    UnknownAnchorKeyword(String),
    #[error("unsupported flow alignment '{0}'")]
    UnsupportedAlignment(String),
    #[error("unsupported background-size value '{0}'")]
    UnsupportedBackgroundSize(String),
    #[error("unsupported background-position value '{0}'")]
    UnsupportedBackgroundPosition(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to load resource '{source_id}': {source}")]
    Resource {
        source_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LayoutError {
    pub(crate) fn resource(
        source_id: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LayoutError::Resource {
            source_id: source_id.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_names_the_source() {
        let err = LayoutError::resource("logo.png", "truncated stream");
        let message = err.to_string();
        assert!(message.contains("logo.png"));
        assert!(message.contains("truncated stream"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn anchor_error_names_the_token() {
        let err = LayoutError::UnknownAnchorKeyword("middle".to_string());
        assert_eq!(err.to_string(), "unknown rotation anchor keyword 'middle'");
    }
}
