#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("io error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unexpected error: {0:#}")]
    Other(#[from] anyhow::Error),
}

impl FeedError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Network(format!("request timed out: {err}"));
        }
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            return Self::NotFound(err.to_string());
        }
        Self::Network(err.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_read_like_messages() {
        let err = FeedError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        assert_eq!(err.to_string(), "io error: permission denied");

        let err = FeedError::from(anyhow::anyhow!("inner").context("outer"));
        assert_eq!(err.to_string(), "unexpected error: outer: inner");
    }
}
