use thiserror::Error;

/// The practice selection is incomplete.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Please select a topic.")]
    MissingTopic,
    #[error("Please select a time limit.")]
    MissingTimeBudget,
    #[error("Please select both a topic and a time limit.")]
    MissingTopicAndTimeBudget,
    #[error("Unknown time limit: {0}")]
    UnknownTimeBudget(String),
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
}

/// Fetching a paragraph failed. The session goes back to idle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    Api(String),
    #[error("API request failed with status {0}")]
    Status(u16),
    #[error("No content generated. Please try again.")]
    EmptyResponse,
    #[error("No bundled paragraphs for topic {0}")]
    NoBundledText(String),
}

/// Persisting a finished session failed. Soft failure: metrics stay as shown.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Could not save your results: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not encode your results: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Saved history is unreadable: {0}")]
    Unreadable(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("A paragraph request is already in flight")]
    RequestInFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_messages_are_user_facing() {
        assert_eq!(
            ConfigurationError::MissingTopicAndTimeBudget.to_string(),
            "Please select both a topic and a time limit."
        );
    }

    #[test]
    fn session_error_wraps_provider_error() {
        let err: SessionError = ProviderError::Status(503).into();
        assert_eq!(err.to_string(), "API request failed with status 503");
        assert!(matches!(err, SessionError::Provider(ProviderError::Status(503))));
    }
}
