use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{Profile, PublicUser},
        jwt::{JwtKeys, SESSION_TTL},
        password::{hash_password_blocking, verify_password_blocking},
        repo::UserStore,
        repo_types::NewUser,
    },
    error::AppError,
};

const MAX_EMAIL_LEN: usize = 320;
const MIN_PASSWORD_LEN: usize = 8;

/// Trimmed, validated credentials.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.chars().count() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Trims both fields and reports the first rule they break.
pub fn validate_credentials(
    email: Option<&str>,
    password: Option<&str>,
) -> Result<Credentials, AppError> {
    let email = email.map(str::trim).unwrap_or_default();
    let password = password.map(str::trim).unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".into(),
        ));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".into(),
        ));
    }

    Ok(Credentials {
        email: email.to_owned(),
        password: password.to_owned(),
    })
}

/// The lookup is only a fast path; the store's uniqueness guard decides
/// concurrent registrations.
#[instrument(skip(store, creds), fields(email = %creds.email))]
pub async fn register_user(
    store: &dyn UserStore,
    creds: Credentials,
) -> Result<PublicUser, AppError> {
    if store.find_by_email(&creds.email).await?.is_some() {
        warn!("email already registered");
        return Err(AppError::Conflict);
    }

    let hash = hash_password_blocking(creds.password).await?;
    let user = store
        .create(NewUser {
            email: &creds.email,
            password_hash: &hash,
        })
        .await?;

    info!(user_id = %user.id, "user registered");
    Ok(user.into())
}

#[instrument(skip(store, keys, creds), fields(email = %creds.email))]
pub async fn login_user(
    store: &dyn UserStore,
    keys: &JwtKeys,
    creds: Credentials,
) -> Result<String, AppError> {
    let Some(user) = store.find_by_email(&creds.email).await? else {
        warn!("login unknown email");
        return Err(AppError::NotFound);
    };

    if !verify_password_blocking(creds.password, user.password_hash).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(user.id, SESSION_TTL)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

#[instrument(skip(store))]
pub async fn load_profile(store: &dyn UserStore, user_id: Uuid) -> Result<Profile, AppError> {
    match store.find_by_id(user_id).await? {
        Some(user) => Ok(user.into()),
        None => {
            warn!("token refers to a missing user");
            Err(AppError::NotFound)
        }
    }
}
