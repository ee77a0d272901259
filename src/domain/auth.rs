use crate::external_connections::ExternalConnectivity;
use crate::security::{jwt, password};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The authorities a principal can hold. Every principal holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Superadmin,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "SUPERADMIN",
            Role::Manager => "MANAGER",
        }
    }
}

/// Authority assignment is by username convention. Roles should really be a stored
/// attribute on the user record, keeping the convention until accounts grow one.
pub fn role_for_username(username: &str) -> Role {
    if username == "superadmin" {
        Role::Superadmin
    } else {
        Role::Manager
    }
}

/// The stored credential material for a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub username: String,
    pub password_hash: String,
}

pub mod driven_ports {
    use super::*;

    /// Looks up stored credentials by username.
    pub trait CredentialReader {
        async fn credentials_for(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<StoredCredentials>, anyhow::Error>;
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// Unknown usernames and wrong passwords are deliberately indistinguishable
    #[error("the presented credentials were not accepted")]
    BadCredentials,
    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

pub struct AuthService;

impl AuthService {
    /// Verifies [username]/[password] against stored credentials and issues a signed
    /// token on success.
    pub async fn login(
        &self,
        username: &str,
        plaintext_password: &str,
        jwt_secret: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        credentials: &impl driven_ports::CredentialReader,
    ) -> Result<String, LoginError> {
        let stored = credentials
            .credentials_for(username, &mut *ext_cxn)
            .await
            .context("looking up credentials for login")?
            .ok_or(LoginError::BadCredentials)?;

        let password_matches = password::verify_password(plaintext_password, &stored.password_hash)
            .map_err(|hash_err| anyhow::anyhow!("stored password hash is unusable: {hash_err}"))?;
        if !password_matches {
            return Err(LoginError::BadCredentials);
        }

        let token = jwt::create_token(username, role_for_username(username), jwt_secret)
            .context("signing a login token")?;
        Ok(token)
    }
}
