//! Error taxonomy surfaced by the content layer.
//!
//! Every variant is caught at the orchestrator boundary and turned into the
//! `error` text of the read model; nothing here is allowed to take down the UI.

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Network, authorization or server failure talking to Drive or Calendar.
    #[error("Content source unavailable: {0}")]
    SourceUnavailable(String),

    /// A record or document did not have the expected shape.
    #[error("Malformed content in {context}: {reason}")]
    MalformedContent { context: String, reason: String },

    /// Required configuration is absent or out of range.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Stored cache failed validation.
    #[error("Cache unusable: {0}")]
    CacheCorrupt(String),
}

impl ContentError {
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        ContentError::MalformedContent {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

impl From<ApiError> for ContentError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidResponse(reason) => ContentError::malformed("API response", reason),
            other => ContentError::SourceUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_map_to_source_unavailable() {
        let err: ContentError = ApiError::Unauthorized.into();
        assert!(matches!(err, ContentError::SourceUnavailable(_)));

        let err: ContentError = ApiError::RateLimited.into();
        assert!(matches!(err, ContentError::SourceUnavailable(_)));
    }

    #[test]
    fn test_invalid_response_maps_to_malformed() {
        let err: ContentError = ApiError::InvalidResponse("bad json".into()).into();
        assert!(matches!(err, ContentError::MalformedContent { .. }));
    }
}
