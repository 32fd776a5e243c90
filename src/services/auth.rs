//! Registration and API token handling.
//!
//! Token format: `wired_{prefix}_{secret}` where:
//! - `wired_` is a fixed prefix for identification
//! - `{prefix}` is 8 chars used for database lookup (stored as `token_prefix`)
//! - `{secret}` is the random remainder
//!
//! Only the SHA-256 hash of the full token is stored. Lookups go by prefix
//! and the hash is compared in constant time.

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{self, CreateApiToken, CreateUser, DbPool, User};
use crate::error::{Error, Result};
use crate::models::{normalize_technologies, Actor, UserRole};

const TOKEN_PREFIX: &str = "wired_";
const PREFIX_LEN: usize = 8;
const SECRET_LEN: usize = 32;

const ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub technological_stack: Vec<String>,
}

/// A resolved bearer token.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub token_id: String,
    pub actor: Actor,
}

/// Service for registration and token validation.
#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    bootstrap_token: Option<String>,
}

impl AuthService {
    pub fn new(db: DbPool, bootstrap_token: Option<String>) -> Self {
        Self {
            db,
            bootstrap_token,
        }
    }

    /// Register a user and issue their first token.
    ///
    /// Admin accounts require the configured bootstrap token.
    pub async fn register(
        &self,
        input: Registration,
        bootstrap: Option<&str>,
    ) -> Result<(User, String)> {
        let name = input.name.trim();
        let email = input.email.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::Validation("Name is required".into()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(Error::Validation("A valid email is required".into()));
        }

        if input.role == UserRole::Admin && !self.bootstrap_matches(bootstrap) {
            warn!(email = %email, "Rejected admin registration without bootstrap token");
            return Err(Error::Forbidden);
        }

        let user = db::create_user(
            &self.db,
            CreateUser {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                email,
                phone_number: input.phone_number,
                role: input.role,
                technological_stack: normalize_technologies(&input.technological_stack),
            },
        )
        .await?;

        let token = self.issue_token(&user.id).await?;

        info!(user_id = %user.id, role = %user.role, "Registered user");

        Ok((user, token))
    }

    /// Issue a new token for a user. The plaintext is only ever returned here.
    pub async fn issue_token(&self, user_id: &str) -> Result<String> {
        let prefix = nanoid::nanoid!(PREFIX_LEN, &ALPHABET);
        let secret = nanoid::nanoid!(SECRET_LEN, &ALPHABET);
        let token = format!("{}{}_{}", TOKEN_PREFIX, prefix, secret);

        db::create_api_token(
            &self.db,
            CreateApiToken {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                token_prefix: prefix,
                token_hash: hash_token(&token),
            },
        )
        .await?;

        debug!(user_id = %user_id, "Issued API token");

        Ok(token)
    }

    /// Resolve a bearer token to the acting user.
    pub async fn validate(&self, token: &str) -> Result<TokenIdentity> {
        let prefix = token_prefix(token).ok_or(Error::InvalidToken)?;

        let row = db::get_api_token_by_prefix(&self.db, prefix)
            .await?
            .ok_or(Error::InvalidToken)?;

        if !constant_time_eq(&hash_token(token), &row.token_hash) {
            return Err(Error::InvalidToken);
        }

        if row.revoked_at.is_some() {
            return Err(Error::InvalidToken);
        }

        let user = db::get_user(&self.db, &row.user_id)
            .await
            .map_err(|_| Error::InvalidToken)?;

        Ok(TokenIdentity {
            token_id: row.id,
            actor: Actor::new(user.id, user.role),
        })
    }

    /// Record token usage.
    pub async fn touch(&self, token_id: &str) -> Result<()> {
        db::touch_api_token(&self.db, token_id).await
    }

    fn bootstrap_matches(&self, presented: Option<&str>) -> bool {
        match (self.bootstrap_token.as_deref(), presented) {
            (Some(expected), Some(presented)) => constant_time_eq(expected, presented),
            _ => false,
        }
    }
}

/// Extract the lookup prefix from a token of the form `wired_{prefix}_{secret}`.
fn token_prefix(token: &str) -> Option<&str> {
    let body = token.strip_prefix(TOKEN_PREFIX)?;
    let prefix = body.get(..PREFIX_LEN)?;
    let rest = body.get(PREFIX_LEN..)?;
    let secret = rest.strip_prefix('_')?;
    if secret.is_empty() {
        return None;
    }
    Some(prefix)
}

/// Hash a token using SHA-256.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
