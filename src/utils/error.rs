use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Request rejected by server (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid quantity '{value}': {reason}")]
    InvalidQuantity { value: String, reason: String },

    #[error("Invalid price '{value}': {reason}")]
    InvalidPrice { value: String, reason: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Line {key} is not in the cart")]
    LineNotFound { key: String },

    #[error("Line {key} has already been removed")]
    LineRemoved { key: String },

    #[error("No price change notice on the page")]
    NoticeMissing,

    #[error("A request for {target} is already in flight")]
    RequestInFlight { target: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Configuration,
    Input,
    PageState,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CartError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CartError::ApiError(_) => ErrorCategory::Network,
            CartError::Rejected { .. } => ErrorCategory::Server,
            CartError::ConfigError { .. }
            | CartError::ConfigValidationError { .. }
            | CartError::InvalidConfigValueError { .. }
            | CartError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CartError::InvalidQuantity { .. }
            | CartError::InvalidPrice { .. }
            | CartError::ValidationError { .. } => ErrorCategory::Input,
            CartError::LineNotFound { .. }
            | CartError::LineRemoved { .. }
            | CartError::NoticeMissing
            | CartError::RequestInFlight { .. } => ErrorCategory::PageState,
            CartError::IoError(_) | CartError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 使用者可以直接重試
            ErrorCategory::PageState => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Transport failures and in-flight rejections go away when the user repeats the action.
    pub fn is_retryable(&self) -> bool {
        match self {
            CartError::ApiError(e) => e.is_timeout() || e.is_connect(),
            CartError::Rejected { status, .. } => *status >= 500,
            CartError::RequestInFlight { .. } => true,
            _ => false,
        }
    }

    /// The text a shopper sees in a notification.
    pub fn user_friendly_message(&self) -> String {
        match self {
            CartError::ApiError(_) => "Could not reach the shop, check your connection".to_string(),
            CartError::Rejected { message, .. } => message.clone(),
            CartError::InvalidQuantity { value, .. } => {
                format!("'{}' is not a valid quantity", value)
            }
            CartError::LineNotFound { .. } | CartError::LineRemoved { .. } => {
                "This product is no longer in your cart".to_string()
            }
            CartError::NoticeMissing => "There is nothing to confirm".to_string(),
            CartError::RequestInFlight { .. } => {
                "Please wait, the previous request is still being processed".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the shop is reachable and repeat the action",
            ErrorCategory::Server => "Read the server message; repeat the action once the cause is fixed",
            ErrorCategory::Configuration => "Fix the configuration file or command line arguments",
            ErrorCategory::Input => "Enter a whole, non-negative number or a valid value",
            ErrorCategory::PageState => "Reload the cart snapshot and try again",
            ErrorCategory::System => "Check file permissions and the snapshot file format",
        }
    }
}

pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_surfaces_server_message() {
        let err = CartError::Rejected {
            status: 400,
            message: "out of stock".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "out of stock");
        assert_eq!(err.category(), ErrorCategory::Server);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_severity_ordering() {
        let in_flight = CartError::RequestInFlight {
            target: "line 1/tea".to_string(),
        };
        let config = CartError::MissingConfigError {
            field: "cart.snapshot".to_string(),
        };
        assert_eq!(in_flight.severity(), ErrorSeverity::Low);
        assert!(in_flight.is_retryable());
        assert!(config.severity() > in_flight.severity());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = CartError::Rejected {
            status: 502,
            message: "Bad gateway".to_string(),
        };
        assert!(err.is_retryable());
    }
}
