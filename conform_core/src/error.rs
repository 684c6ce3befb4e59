// src/error.rs
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ConformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Serde YAML error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unparsable date '{0}': expected YYYY-MM-DD or an RFC 3339 timestamp")]
    DateParse(String),

    #[error("Endpoint placeholder '${{{0}}}' has no value in the submitted configuration")]
    UnresolvedPlaceholder(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ConformError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ConformError::Io(_) => "io_error",
            ConformError::SerdeJson(_) | ConformError::SerdeYaml(_) => "parse_error",
            ConformError::InvalidInput(_) => "invalid_input",
            ConformError::DateParse(_) => "invalid_date",
            ConformError::UnresolvedPlaceholder(_) => "unresolved_placeholder",
            ConformError::InvalidEndpoint(_) => "invalid_endpoint",
            ConformError::NotFound(_) => "not_found",
            ConformError::Other(_) => "internal_error",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "code": self.code_str(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_message_keeps_braces() {
        let err = ConformError::UnresolvedPlaceholder("subdomain".to_string());
        assert_eq!(
            err.to_string(),
            "Endpoint placeholder '${subdomain}' has no value in the submitted configuration"
        );
        assert_eq!(err.code_str(), "unresolved_placeholder");
    }

    #[test]
    fn test_to_json_shape() {
        let value = ConformError::NotFound("variant 'x'".to_string()).to_json();
        assert_eq!(value["code"], "not_found");
        assert_eq!(value["message"], "Not found: variant 'x'");
    }
}
