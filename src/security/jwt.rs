use crate::domain::auth::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// How long an issued token stays valid, in hours
const TOKEN_LIFETIME_HOURS: i64 = 10;

/// Claim set embedded in issued tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated user
    pub sub: String,
    /// Authority granted to the user for route authorization
    pub role: Role,
    /// Issue time (unix timestamp)
    pub iat: i64,
    /// Expiration time (unix timestamp)
    pub exp: i64,
}

/// Issues an HS256-signed token for [username] carrying [role], valid for 10 hours.
pub fn create_token(
    username: &str,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_owned(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verifies [token]'s signature and expiration, returning its claims when valid.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    const SECRET: &str = "test-secret-which-is-long-enough";

    #[test]
    fn issued_token_round_trips() {
        let token = create_token("jdoe", Role::Manager, SECRET).expect("token should sign");

        let claims = validate_token(&token, SECRET).expect("token should verify");
        assert_eq!("jdoe", claims.sub);
        assert_eq!(Role::Manager, claims.role);
        assert_eq!(claims.iat + 10 * 60 * 60, claims.exp);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = create_token("jdoe", Role::Superadmin, "a-different-secret-entirely")
            .expect("token should sign");

        let verify_result = validate_token(&token, SECRET);
        assert_that!(verify_result).is_err();
    }

    #[test]
    fn rejects_garbage() {
        let verify_result = validate_token("not-even-a-jwt", SECRET);
        assert_that!(verify_result).is_err();
    }
}
