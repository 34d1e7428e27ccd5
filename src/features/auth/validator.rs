use super::model::{AuthenticatedUser, Role};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Verifies HS256 bearer tokens minted by the identity provider
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    #[serde(rename = "exp")]
    _exp: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, issuer: Option<&str>, leeway: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway.as_secs();
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthenticatedUser::new(data.claims.sub, data.claims.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const SECRET: &str = "test-secret";

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: String,
        role: &'a str,
        exp: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
    }

    fn token(role: &str, exp_offset: i64, iss: Option<&str>) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as u64;
        let claims = TestClaims {
            sub: user_id.to_string(),
            role,
            exp,
            iss,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        (user_id, token)
    }

    #[test]
    fn test_valid_token_resolves_user() {
        let validator = JwtValidator::new(SECRET, None, Duration::from_secs(0));
        let (user_id, token) = token("driver", 3600, None);

        let user = validator.validate_token(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, Role::Driver);
    }

    #[test]
    fn test_expired_token_rejected() {
        let validator = JwtValidator::new(SECRET, None, Duration::from_secs(0));
        let (_, token) = token("admin", -3600, None);

        assert!(matches!(
            validator.validate_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let validator = JwtValidator::new("other-secret", None, Duration::from_secs(0));
        let (_, token) = token("admin", 3600, None);

        assert!(validator.validate_token(&token).is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let validator = JwtValidator::new(SECRET, None, Duration::from_secs(0));
        let (_, token) = token("both", 3600, None);

        assert!(validator.validate_token(&token).is_err());
    }

    #[test]
    fn test_issuer_enforced_when_configured() {
        let validator = JwtValidator::new(SECRET, Some("food-recovery"), Duration::from_secs(0));
        let (_, good) = token("reporter", 3600, Some("food-recovery"));
        let (_, bad) = token("reporter", 3600, Some("someone-else"));

        assert!(validator.validate_token(&good).is_ok());
        assert!(validator.validate_token(&bad).is_err());
    }
}
