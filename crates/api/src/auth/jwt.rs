//! Signed access/refresh token issuance and verification.
//!
//! Both token classes are HS256-signed JWTs carrying a [`Claims`] payload
//! that binds a subject (the user's email) to a session id. Access and
//! refresh tokens are signed with cryptographically independent secrets so
//! leaking one class's key cannot be used to forge the other class.
//!
//! Verification here covers signature, issuer, and expiry only. Session
//! liveness is deliberately NOT checked -- that is the session manager's
//! job, performed by the request gate after decoding.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use clinio_core::types::DbId;

/// If a refresh token is used with no more than this much lifetime left,
/// the caller rotates it: the old token is invalidated and a new one issued.
/// Amortizes rotation cost while bounding how long a compromised token
/// remains usable.
pub const ROTATION_THRESHOLD_SECS: i64 = 2 * 3600;

/// Which of the two independently keyed token classes a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Short-lived, stateless, never persisted.
    Access,
    /// Long-lived; its signature is persisted for revocation checking.
    Refresh,
}

/// JWT claims embedded in every token of either class.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's email.
    pub sub: String,
    /// Issuer -- the configured application name.
    pub iss: String,
    /// The session this token references (never owns).
    pub sid: DbId,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Configuration for token issuance and verification.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens. Must differ from
    /// `access_secret`.
    pub refresh_secret: String,
    /// Issuer claim stamped into and required from every token.
    pub issuer: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
/// Default issuer claim.
const DEFAULT_ISSUER: &str = "clinio";

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default  |
    /// |----------------------------|----------|----------|
    /// | `JWT_ACCESS_SECRET`        | **yes**  | --       |
    /// | `JWT_REFRESH_SECRET`       | **yes**  | --       |
    /// | `JWT_ISSUER`               | no       | `clinio` |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`     |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`      |
    ///
    /// # Panics
    ///
    /// Panics if either secret is missing, empty, or if both are equal --
    /// misconfiguration should fail fast at startup.
    pub fn from_env() -> Self {
        let access_secret = std::env::var("JWT_ACCESS_SECRET")
            .expect("JWT_ACCESS_SECRET must be set in the environment");
        assert!(!access_secret.is_empty(), "JWT_ACCESS_SECRET must not be empty");

        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .expect("JWT_REFRESH_SECRET must be set in the environment");
        assert!(!refresh_secret.is_empty(), "JWT_REFRESH_SECRET must not be empty");
        assert!(
            access_secret != refresh_secret,
            "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must be independent"
        );

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.into());

        let access_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        Self {
            access_secret,
            refresh_secret,
            issuer,
            access_expiry_mins,
            refresh_expiry_days,
        }
    }

    /// The signing secret for a token class.
    fn secret(&self, class: TokenClass) -> &str {
        match class {
            TokenClass::Access => &self.access_secret,
            TokenClass::Refresh => &self.refresh_secret,
        }
    }

    /// The configured lifetime of a token class.
    fn lifetime(&self, class: TokenClass) -> chrono::Duration {
        match class {
            TokenClass::Access => chrono::Duration::minutes(self.access_expiry_mins),
            TokenClass::Refresh => chrono::Duration::days(self.refresh_expiry_days),
        }
    }
}

/// A freshly issued token together with its expiry instant.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The encoded, signed JWT.
    pub token: String,
    /// Expiration time (UTC Unix timestamp), as stamped into the claims.
    pub expires_at: i64,
}

/// Issue a token of the given class binding `subject` to `session_id`.
pub fn issue(
    class: TokenClass,
    subject: &str,
    session_id: DbId,
    config: &JwtConfig,
) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let exp = now + config.lifetime(class).num_seconds();

    let claims = Claims {
        sub: subject.to_string(),
        iss: config.issuer.clone(),
        sid: session_id,
        iat: now,
        exp,
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret(class).as_bytes()),
    )?;

    Ok(IssuedToken {
        token,
        expires_at: exp,
    })
}

/// Decode and verify a token against the given class's secret.
///
/// Checks signature, issuer, and expiry. Returns `None` -- never an error --
/// on malformed input, a wrong signature, a wrong issuer, or an expired
/// token: verification failure is an expected outcome for forged or stale
/// tokens in normal operation, not an exceptional one.
pub fn decode_claims(token: &str, class: TokenClass, config: &JwtConfig) -> Option<Claims> {
    let mut validation = Validation::default(); // HS256, validates exp
    validation.set_issuer(&[&config.issuer]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret(class).as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

/// Boolean form of [`decode_claims`] for callers that only need a verdict.
pub fn verify(token: &str, class: TokenClass, config: &JwtConfig) -> bool {
    decode_claims(token, class, config).is_some()
}

/// The signature segment of an encoded JWT.
///
/// This is the part persisted (hashed) for refresh-token revocation
/// checking. Returns `None` if the input is not a three-segment JWT.
pub fn signature_of(token: &str) -> Option<&str> {
    let mut parts = token.split('.');
    let (_, _, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || signature.is_empty() {
        return None;
    }
    Some(signature)
}

/// Whether a refresh token expiring at `expires_at` (Unix timestamp) should
/// be rotated when used at instant `now`.
pub fn needs_rotation(expires_at: i64, now: i64) -> bool {
    expires_at - now <= ROTATION_THRESHOLD_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to build a test config with known secrets.
    fn test_config() -> JwtConfig {
        JwtConfig {
            access_secret: "access-secret-that-is-long-enough".to_string(),
            refresh_secret: "refresh-secret-that-is-long-enough".to_string(),
            issuer: "clinio-test".to_string(),
            access_expiry_mins: 15,
            refresh_expiry_days: 7,
        }
    }

    #[test]
    fn issue_and_decode_roundtrip() {
        let config = test_config();
        let issued = issue(TokenClass::Access, "doc@clinic.test", 42, &config)
            .expect("issuance should succeed");

        let claims = decode_claims(&issued.token, TokenClass::Access, &config)
            .expect("decoding a fresh token should succeed");
        assert_eq!(claims.sub, "doc@clinic.test");
        assert_eq!(claims.sid, 42);
        assert_eq!(claims.iss, "clinio-test");
        assert_eq!(claims.exp, issued.expires_at);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_fails_verification() {
        let config = test_config();
        let issued = issue(TokenClass::Access, "doc@clinic.test", 7, &config)
            .expect("issuance should succeed");

        // Flip the last character of the token.
        let mut tampered = issued.token.clone();
        let last = tampered.pop().expect("token is non-empty");
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(verify(&issued.token, TokenClass::Access, &config));
        assert!(
            !verify(&tampered, TokenClass::Access, &config),
            "a single flipped byte must invalidate the token"
        );
    }

    #[test]
    fn cross_class_keys_are_isolated() {
        let config = test_config();
        let access = issue(TokenClass::Access, "a@clinic.test", 1, &config).unwrap();
        let refresh = issue(TokenClass::Refresh, "a@clinic.test", 1, &config).unwrap();

        assert!(!verify(&access.token, TokenClass::Refresh, &config));
        assert!(!verify(&refresh.token, TokenClass::Access, &config));
    }

    #[test]
    fn expired_token_fails() {
        let config = test_config();

        // Manually encode an already-expired token, well past the default
        // 60-second leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "doc@clinic.test".to_string(),
            iss: config.issuer.clone(),
            sid: 1,
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.access_secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(!verify(&token, TokenClass::Access, &config));
    }

    #[test]
    fn wrong_issuer_fails() {
        let config = test_config();
        let other = JwtConfig {
            issuer: "someone-else".to_string(),
            ..test_config()
        };
        let issued = issue(TokenClass::Access, "doc@clinic.test", 1, &other).unwrap();

        assert!(
            !verify(&issued.token, TokenClass::Access, &config),
            "token from a different issuer must fail"
        );
    }

    #[test]
    fn garbage_input_is_a_clean_false() {
        let config = test_config();
        assert!(!verify("", TokenClass::Access, &config));
        assert!(!verify("not-a-jwt", TokenClass::Access, &config));
        assert!(!verify("a.b", TokenClass::Refresh, &config));
    }

    #[test]
    fn signature_of_extracts_third_segment() {
        let config = test_config();
        let issued = issue(TokenClass::Refresh, "doc@clinic.test", 3, &config).unwrap();

        let signature = signature_of(&issued.token).expect("a JWT has a signature segment");
        assert!(issued.token.ends_with(signature));
        assert!(!signature.contains('.'));

        assert_eq!(signature_of("only.two"), None);
        assert_eq!(signature_of("a.b.c.d"), None);
        assert_eq!(signature_of("trailing.dot."), None);
    }

    #[test]
    fn rotation_threshold_boundaries() {
        let now = 1_000_000;
        // Exactly at the threshold rotates.
        assert!(needs_rotation(now + ROTATION_THRESHOLD_SECS, now));
        // One second above does not.
        assert!(!needs_rotation(now + ROTATION_THRESHOLD_SECS + 1, now));
        // Already expired still reports "rotate" (caller rejects earlier).
        assert!(needs_rotation(now - 1, now));
    }
}
