use thiserror::Error;

/// Failures talking to the inventory backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{resource} '{id}' was not found")]
    NotFound { resource: String, id: String },
    /// Backend refused the request; `message` is the server's own text
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Message shown to the user as-is
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Multi-line help block printed by the CLI under the error
    pub fn troubleshooting(&self) -> String {
        let mut out = String::new();
        match self {
            ApiError::NotFound { resource, .. } => {
                out.push_str("🔧 RESOURCE NOT FOUND:\n");
                out.push_str(&format!("   → The {resource} may have been deleted\n"));
                out.push_str("   → Go back to the list and pick another entry");
            }
            ApiError::Rejected { status, .. } => {
                out.push_str(&format!("🔧 REQUEST REJECTED (HTTP {status}):\n"));
                out.push_str("   → The order may have changed since it was loaded\n");
                out.push_str("   → The current state has been re-fetched; review it and retry");
            }
            ApiError::Unauthorized(_) => {
                out.push_str("🔧 AUTHENTICATION FAILED:\n");
                out.push_str("   → Token is invalid or expired\n");
                out.push_str("   → Set token: export INVENTORY_ADMIN_API__TOKEN=your_token");
            }
            ApiError::Network(_) => {
                out.push_str("🔧 LOCAL NETWORK TROUBLESHOOTING:\n");
                out.push_str("   → Check the backend is running\n");
                out.push_str("   → Verify api.base_url in inventory-admin.toml");
            }
            ApiError::Decode(_) => {
                out.push_str("🔧 UNEXPECTED RESPONSE:\n");
                out.push_str("   → Backend and client versions may not match");
            }
            ApiError::Config(_) => {
                out.push_str("🔧 QUICK FIXES:\n");
                out.push_str("   → Check inventory-admin.toml and INVENTORY_ADMIN_* variables");
            }
        }
        out
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::Config(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_is_verbatim() {
        let err = ApiError::rejected(409, "Only pending orders can be approved");
        assert_eq!(err.to_string(), "Only pending orders can be approved");
        assert_eq!(err.user_message(), "Only pending orders can be approved");
    }

    #[test]
    fn test_not_found_helpers() {
        let err = ApiError::not_found("purchase order", "po-9");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("po-9"));
        assert!(err.troubleshooting().contains("Go back to the list"));
    }
}
