use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::protocol::UserId;

/// Claims of a token issued by the auth collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric user ID, as a string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: UserId, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: now + ttl_seconds,
            iat: now,
        }
    }

    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Auth(format!("Invalid subject: {}", self.sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_subject() {
        let claims = Claims::new(42, 60);
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let mut claims = Claims::new(1, 60);
        claims.sub = "alice".to_string();
        assert!(claims.user_id().is_err());
    }

    #[test]
    fn test_extra_claims_are_ignored() {
        let json = r#"{"sub":"7","exp":4102444800,"iat":1700000000,"username":"alice","role":"admin"}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(serde_json::to_value(&claims).unwrap().as_object().unwrap().len(), 3);
    }
}
