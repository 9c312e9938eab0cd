use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Username
    pub uid: i32,       // User ID
    pub is_admin: bool, // Admin flag, trusted downstream as already verified
    pub exp: usize,     // Expiration timestamp
}

/// Sign a new JWT token for a user.
pub fn sign(user_id: i32, username: &str, is_admin: bool, secret: &str) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(7))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        is_admin,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let token = sign(42, "alice", true, "test-secret").unwrap();
        let claims = verify(&token, "test-secret").unwrap();

        assert_eq!(claims.uid, 42);
        assert_eq!(claims.sub, "alice");
        assert!(claims.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign(42, "alice", false, "test-secret").unwrap();
        assert!(verify(&token, "other-secret").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify("not.a.token", "test-secret").is_err());
    }
}
