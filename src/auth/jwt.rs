use crate::types::{AppError, Claims, Result};
use crate::utils::config::AuthConfig;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Authentication service for bearer-token management and password hashing.
///
/// Provides password storage using salted Argon2id and signed, time-bounded
/// JWT credentials using HS256. Constructed once at startup from [`AuthConfig`]
/// and shared behind an `Arc`; nothing here reads the environment.
pub struct AuthService {
    jwt_secret: String,
    /// Token validity in seconds.
    token_expiry: i64,
    argon2: Argon2<'static>,
}

impl AuthService {
    /// Creates a new AuthService.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for signing tokens (should be at least 32 chars)
    /// * `token_expiry_hours` - Token validity in hours
    /// * `hash_time_cost` - Optional argon2 time-cost override
    pub fn new(
        jwt_secret: String,
        token_expiry_hours: i64,
        hash_time_cost: Option<u32>,
    ) -> Result<Self> {
        let argon2 = match hash_time_cost {
            Some(t_cost) => {
                let params = Params::new(
                    Params::DEFAULT_M_COST,
                    t_cost,
                    Params::DEFAULT_P_COST,
                    None,
                )
                .map_err(|e| AppError::Internal(format!("Invalid hash cost: {}", e)))?;
                Argon2::new(
                    argon2::Algorithm::Argon2id,
                    argon2::Version::V0x13,
                    params,
                )
            }
            None => Argon2::default(),
        };

        Ok(Self {
            jwt_secret,
            token_expiry: token_expiry_hours * 3600,
            argon2,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(
            config.jwt_secret.clone(),
            config.token_expiry_hours,
            config.hash_time_cost,
        )
    }

    /// Hashes a password using Argon2id with a fresh per-hash salt.
    ///
    /// Returns a PHC-formatted hash string. A hashing failure is fatal to the
    /// write that requested it.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verifies a password against a stored Argon2 hash.
    ///
    /// A mismatched password yields `Ok(false)`; only an unparseable stored
    /// hash is an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Issues a signed token asserting the given user identity.
    pub fn issue_token(&self, user_id: i64, email: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            exp: (now + Duration::seconds(self.token_expiry)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token's signature, structure, and expiry, returning the claims.
    ///
    /// All failure modes collapse into [`AppError::Auth`]; callers at the HTTP
    /// boundary present one generic message regardless of which check failed.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> AuthService {
        AuthService::new(
            "test-secret-key-that-is-at-least-32-chars".to_string(),
            24,
            None,
        )
        .expect("should build service")
    }

    #[test]
    fn test_password_hashing() {
        let service = create_test_service();
        let password = "Test1234!";

        let hash = service
            .hash_password(password)
            .expect("should hash password");

        // Hash should not equal the original password
        assert_ne!(hash, password);

        // Hash should be in PHC format (starts with $argon2)
        assert!(hash.starts_with("$argon2"), "hash should be in PHC format");
    }

    #[test]
    fn test_password_verification_success() {
        let service = create_test_service();
        let password = "secure_password_456";

        let hash = service
            .hash_password(password)
            .expect("should hash password");
        let is_valid = service
            .verify_password(password, &hash)
            .expect("should verify");

        assert!(is_valid, "correct password should verify successfully");
    }

    #[test]
    fn test_password_verification_failure() {
        let service = create_test_service();

        let hash = service
            .hash_password("correct_password")
            .expect("should hash password");
        let is_valid = service
            .verify_password("wrong_password", &hash)
            .expect("should verify");

        assert!(!is_valid, "wrong password should fail verification");
    }

    #[test]
    fn test_custom_time_cost() {
        let service = AuthService::new("another-secret-long-enough-for-tests".to_string(), 1, Some(2))
            .expect("should build service");

        let hash = service.hash_password("pw-with-cost").expect("should hash");
        assert!(service.verify_password("pw-with-cost", &hash).expect("should verify"));
        // Time cost is embedded in the PHC string
        assert!(hash.contains("t=2"), "PHC string should carry the configured t_cost");
    }

    #[test]
    fn test_token_roundtrip() {
        let service = create_test_service();

        let token = service
            .issue_token(42, "admin@example.com")
            .expect("should issue token");
        let claims = service.verify_token(&token).expect("should verify token");

        assert_eq!(claims.sub, 42, "subject should match user id");
        assert_eq!(claims.email, "admin@example.com", "email should match");
    }

    #[test]
    fn test_token_verification_invalid_token() {
        let service = create_test_service();

        let result = service.verify_token("invalid.token.here");

        assert!(result.is_err(), "invalid token should fail verification");
    }

    #[test]
    fn test_token_verification_wrong_secret() {
        let service1 = AuthService::new("secret-one-that-is-32-chars-long".to_string(), 24, None)
            .expect("should build");
        let service2 = AuthService::new("secret-two-that-is-32-chars-long".to_string(), 24, None)
            .expect("should build");

        let token = service1
            .issue_token(7, "test@example.com")
            .expect("should issue");
        let result = service2.verify_token(&token);

        assert!(result.is_err(), "token from different secret should fail");
    }

    #[test]
    fn test_token_verification_expired() {
        let service = create_test_service();

        // Hand-encode claims already past expiry (beyond the default leeway)
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "old@example.com".to_string(),
            exp: (now - 3600) as usize,
            iat: (now - 7200) as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test-secret-key-that-is-at-least-32-chars".as_bytes()),
        )
        .expect("should encode");

        let result = service.verify_token(&token);
        assert!(
            result.is_err(),
            "expired token should fail regardless of signature validity"
        );
    }

    #[test]
    fn test_claims_expiration_window() {
        let service = create_test_service();
        let token = service
            .issue_token(9, "user@example.com")
            .expect("should issue");
        let claims = service.verify_token(&token).expect("should verify");

        let now = Utc::now().timestamp() as usize;

        // iat should be around now
        assert!(
            claims.iat <= now && claims.iat >= now - 5,
            "iat should be current timestamp"
        );

        // exp should be iat + 24h
        let expected_exp = claims.iat + 24 * 3600;
        assert!(
            claims.exp >= expected_exp - 5 && claims.exp <= expected_exp + 5,
            "exp should be iat + token lifetime"
        );
    }
}
