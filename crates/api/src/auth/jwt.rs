//! JWT access-token generation/validation and the bearer-token identity
//! resolver.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload. The
//! gRPC layer strips the `Bearer ` prefix from the `authorization` metadata
//! entry; [`JwtIdentityResolver`] turns the remaining token into an
//! [`Identity`].

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use trellis_core::access::{Identity, IdentityResolver, RequestContext};
use trellis_core::error::{CoreError, CoreResult};
use uuid::Uuid;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the caller's id.
    pub sub: String,
    /// Role name used for permission grants (e.g. `"admin"`, `"coach"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes.
    pub access_token_expiry_mins: i64,
}

/// Default access token expiry in minutes.
pub const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

/// Generate an HS256 access token for `subject` acting as `role`.
pub fn generate_access_token(
    subject: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// Resolves the acting identity from the request's bearer token.
pub struct JwtIdentityResolver {
    config: JwtConfig,
}

impl JwtIdentityResolver {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn acting_identity(&self, ctx: &RequestContext) -> CoreResult<Identity> {
        let token = ctx
            .bearer_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::Unauthenticated("missing bearer token".into()))?;

        let claims = validate_token(token, &self.config).map_err(|err| {
            tracing::debug!(error = %err, request_id = ?ctx.request_id, "Rejected bearer token");
            CoreError::Unauthenticated("invalid or expired token".into())
        })?;

        Ok(Identity {
            subject: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Helper to build a test config with a known secret.
    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        }
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = test_config();
        let subject = Uuid::new_v4().to_string();
        let token = generate_access_token(&subject, "coach", &config)
            .expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, subject);
        assert_eq!(claims.role, "coach");
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();

        // Expired well beyond the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "someone".to_string(),
            role: "member".to_string(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            access_token_expiry_mins: 15,
        };
        let token = generate_access_token("someone", "admin", &test_config())
            .expect("token generation should succeed");

        assert!(validate_token(&token, &config_b).is_err());
    }

    #[tokio::test]
    async fn resolver_returns_identity_from_claims() {
        let config = test_config();
        let token = generate_access_token("user-1", "admin", &config).unwrap();
        let resolver = JwtIdentityResolver::new(config);

        let identity = resolver
            .acting_identity(&RequestContext::with_token(token))
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity {
                subject: "user-1".into(),
                role: "admin".into()
            }
        );
    }

    #[tokio::test]
    async fn resolver_rejects_missing_and_garbage_tokens() {
        let resolver = JwtIdentityResolver::new(test_config());

        assert_matches!(
            resolver.acting_identity(&RequestContext::default()).await,
            Err(CoreError::Unauthenticated(_))
        );
        assert_matches!(
            resolver
                .acting_identity(&RequestContext::with_token("not.a.jwt"))
                .await,
            Err(CoreError::Unauthenticated(_))
        );
    }
}
