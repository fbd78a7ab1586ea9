//! HS256 access tokens

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub tenant_id: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_hours: i64,
}

impl JwtManager {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_hours,
        }
    }

    /// Issue a token for `user_id` within `tenant_id`
    pub fn generate_access_token(
        &self,
        user_id: &str,
        tenant_id: &str,
        role: &str,
    ) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            role: role.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })
    }

    pub fn expiry_hours(&self) -> i64 {
        self.expiry_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-jwt-secret-key-for-testing-only";

    #[test]
    fn test_token_round_trip() {
        let manager = JwtManager::new(SECRET, 24);
        let token = manager
            .generate_access_token("user-1", "tenant-1", "admin")
            .unwrap();

        let claims = manager.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.tenant_id, "tenant-1");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new(SECRET, 24)
            .generate_access_token("user-1", "tenant-1", "member")
            .unwrap();

        let other = JwtManager::new("another-secret", 24);
        assert!(matches!(
            other.validate_access_token(&token),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new(SECRET, 24);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: "user-1".into(),
            tenant_id: "tenant-1".into(),
            role: "member".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            manager.validate_access_token(&token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let manager = JwtManager::new(SECRET, 24);
        assert!(manager.validate_access_token("not-a-jwt").is_err());
        assert!(manager.validate_access_token("").is_err());
    }
}
