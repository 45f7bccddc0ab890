use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    auth::dto::Profile,
    client::{ApiClient, ClientError},
};

const TOKEN_KEY: &str = "token";
const EXPIRES_AT_KEY: &str = "expiresAt";

/// Matches the server-side token lifetime.
pub const SESSION_LIFETIME_MS: i64 = 24 * 60 * 60 * 1000;

/// Where a page load should end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
}

/// String key/value storage that survives restarts, in the spirit of browser
/// local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    /// Writes every entry or none of them.
    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<(), ClientError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.set_all(&[(key, value)])
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        for (key, value) in entries {
            self.values.insert((*key).to_owned(), (*value).to_owned());
        }
        Ok(())
    }
}

/// JSON object on disk, rewritten on every write. The in-memory copy only
/// changes once the file has been written.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        let mut next = self.values.clone();
        for (key, value) in entries {
            next.insert((*key).to_owned(), (*value).to_owned());
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&next)?)?;
        self.values = next;
        Ok(())
    }
}

/// Remembers the login token and its absolute expiry. Validity is checked
/// passively on each page load; an expired session is left in storage and
/// simply overwritten by the next login.
pub struct SessionManager<S> {
    store: S,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores the token with an expiry 24h after `now`; returns that expiry
    /// in milliseconds since the epoch.
    pub fn remember(&mut self, token: &str, now: OffsetDateTime) -> Result<i64, ClientError> {
        let expires_at = unix_millis(now) + SESSION_LIFETIME_MS;
        self.store
            .set_all(&[(TOKEN_KEY, token), (EXPIRES_AT_KEY, &expires_at.to_string())])?;
        debug!(expires_at, "session stored");
        Ok(expires_at)
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.store.get(EXPIRES_AT_KEY)?.parse().ok()
    }

    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        match (self.token(), self.expires_at()) {
            (Some(_), Some(expires_at)) => unix_millis(now) < expires_at,
            _ => false,
        }
    }

    /// The login page forwards to home while the session is active; a
    /// protected page sends the user back to login once it is not.
    pub fn destination(&self, now: OffsetDateTime) -> Route {
        if self.is_active(now) {
            Route::Home
        } else {
            Route::Login
        }
    }

    /// Logs in through `api` and remembers the returned token.
    pub async fn login(
        &mut self,
        api: &ApiClient,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<String, ClientError> {
        let resp = api.login(email, password).await?;
        self.remember(&resp.token, now)?;
        info!(email, "logged in");
        Ok(resp.token)
    }

    /// Loads the profile for the home page, or `None` when the session is
    /// missing or expired and the caller should route to login.
    pub async fn current_user(
        &self,
        api: &ApiClient,
        now: OffsetDateTime,
    ) -> Result<Option<Profile>, ClientError> {
        let Some(token) = self.token().filter(|_| self.is_active(now)) else {
            return Ok(None);
        };
        Ok(Some(api.me(&token).await?.user))
    }
}

fn unix_millis(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000_000) as i64
}
