use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::error::{ApiError, ErrorCode, Result};

pub const ISSUER: &str = "consultation-gateway";

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_seconds: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiration_seconds: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(ApiError::Configuration(
                "JWT secret must not be empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiration_seconds,
        })
    }

    /// Issue a token for a user with the configured lifetime
    pub fn issue_token(&self, user_id: Uuid, username: &str, roles: Vec<Role>) -> Result<String> {
        let claims = Claims::new(user_id, username.to_string(), roles, self.expiration_seconds);
        self.encode_token(&claims)
    }

    pub fn encode_token(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to encode token: {}", e)))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    ApiError::with_code(ErrorCode::TokenExpired, "Token expired")
                }
                _ => ApiError::with_code(ErrorCode::TokenInvalid, "Invalid authentication token"),
            })
    }
}
