//! Session credentials and the two stores they live in.
//!
//! The token and user are kept in a cookie jar (shared with the HTTP client so
//! backend cookies round-trip) and mirrored into a local persistent store.
//! [`SessionRepository`] is the only thing that touches both.

use dashmap::DashMap;
use parking_lot::Mutex;
use reqwest::Url;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{TOKEN_KEY, USER_KEY};
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: serde_json::Value,
}

impl Session {
    // Name shown on optimistic comments
    pub fn display_name(&self) -> String {
        ["name", "displayName", "username", "email"]
            .iter()
            .find_map(|field| self.user.get(*field).and_then(|v| v.as_str()))
            .unwrap_or("You")
            .to_string()
    }

    pub fn photo(&self) -> Option<String> {
        ["profileImage", "photo", "avatar"]
            .iter()
            .find_map(|field| self.user.get(*field).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    pub fn user_id(&self) -> Option<String> {
        match self.user.get("_id").or_else(|| self.user.get("id"))? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// Minimal string key/value store, the shape of browser storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// Cookie jar keyed by cookie name. Domain/path scoping is not needed for a
// client that only ever talks to one API root.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: DashMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    // "name=value; Path=/; Max-Age=0" -> store or drop the cookie
    fn apply_set_cookie(&self, header: &str) {
        let mut parts = header.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let expired = parts.any(|attr| {
            let attr = attr.trim().to_ascii_lowercase();
            attr == "max-age=0" || attr.starts_with("max-age=-")
        });
        if expired || value.trim().is_empty() {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.trim().to_string());
        }
    }
}

impl KeyValueStore for CookieJar {
    fn get(&self, key: &str) -> Option<String> {
        self.cookies.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.cookies.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.cookies.remove(key);
        Ok(())
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.apply_set_cookie(raw);
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        let joined = self
            .cookies
            .iter()
            .map(|entry| format!("{}={}", entry.key(), entry.value()))
            .collect::<Vec<_>>()
            .join("; ");
        if joined.is_empty() {
            return None;
        }
        HeaderValue::from_str(&joined).ok()
    }
}

// In-process store, used when nothing should touch the disk
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

// JSON object on disk, read and rewritten on every access
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(StorageError::Read {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw).map_err(write_err)
    }

    fn update(&self, f: impl FnOnce(&mut HashMap<String, String>)) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut values = self.load()?;
        f(&mut values);
        self.save(&values)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                warn!("Local store unreadable, ignoring: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

/// Single read/write/clear surface over the cookie jar and the local store.
///
/// Reads prefer the cookie and fall back to the local store. Writes and
/// clears always hit both.
pub struct SessionRepository {
    cookies: Arc<CookieJar>,
    local: Arc<dyn KeyValueStore>,
}

impl SessionRepository {
    pub fn new(cookies: Arc<CookieJar>, local: Arc<dyn KeyValueStore>) -> Self {
        Self { cookies, local }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(CookieJar::new()), Arc::new(MemoryStore::new()))
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(CookieJar::new()), Arc::new(FileStore::new(path)))
    }

    pub fn cookie_jar(&self) -> Arc<CookieJar> {
        Arc::clone(&self.cookies)
    }

    pub fn token(&self) -> Option<String> {
        self.cookies
            .get(TOKEN_KEY)
            .or_else(|| self.local.get(TOKEN_KEY))
            .filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<serde_json::Value> {
        let from_cookie = self
            .cookies
            .get(USER_KEY)
            .and_then(|raw| urlencoding::decode(&raw).ok().map(|s| s.into_owned()));
        let raw = from_cookie.or_else(|| self.local.get(USER_KEY))?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!("Stored user is not valid JSON: {}", e);
                None
            }
        }
    }

    pub fn read(&self) -> Option<Session> {
        let token = self.token()?;
        let user = self.user().unwrap_or(serde_json::Value::Null);
        Some(Session { token, user })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn write(&self, session: &Session) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&session.user)?;

        self.cookies.set(TOKEN_KEY, &session.token)?;
        self.cookies.set(USER_KEY, &urlencoding::encode(&user_json))?;

        self.local.set(TOKEN_KEY, &session.token)?;
        self.local.set(USER_KEY, &user_json)?;

        info!("Session stored");
        Ok(())
    }

    // Both stores are always cleared; the first failure is reported
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut first_err = None;
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.cookies.remove(key) {
                first_err.get_or_insert(e);
            }
            if let Err(e) = self.local.remove(key) {
                first_err.get_or_insert(e);
            }
        }
        info!("Session cleared");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// Where the client "goes" when the session dies
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

// Logs the redirect and remembers the last route
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    last: Mutex<Option<String>>,
}

impl LoggingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_redirect(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl Navigator for LoggingNavigator {
    fn redirect(&self, route: &str) {
        info!("Redirecting to {}", route);
        *self.last.lock() = Some(route.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session {
            token: "abc123".into(),
            user: json!({"_id": "u1", "name": "Mia Ink", "profileImage": "https://cdn/mia.png"}),
        }
    }

    #[test]
    fn write_fans_out_to_both_stores() {
        let jar = Arc::new(CookieJar::new());
        let local = Arc::new(MemoryStore::new());
        let repo = SessionRepository::new(Arc::clone(&jar), local.clone());

        repo.write(&session()).unwrap();

        assert_eq!(jar.get(TOKEN_KEY).as_deref(), Some("abc123"));
        assert_eq!(local.get(TOKEN_KEY).as_deref(), Some("abc123"));
        assert_eq!(repo.read(), Some(session()));
    }

    #[test]
    fn falls_back_to_local_store_when_cookie_missing() {
        let jar = Arc::new(CookieJar::new());
        let repo = SessionRepository::new(Arc::clone(&jar), Arc::new(MemoryStore::new()));
        repo.write(&session()).unwrap();

        jar.remove(TOKEN_KEY).unwrap();
        jar.remove(USER_KEY).unwrap();

        let restored = repo.read().unwrap();
        assert_eq!(restored.token, "abc123");
        assert_eq!(restored.display_name(), "Mia Ink");
    }

    #[test]
    fn cookie_wins_over_local_store() {
        let jar = Arc::new(CookieJar::new());
        let local = Arc::new(MemoryStore::new());
        let repo = SessionRepository::new(Arc::clone(&jar), local.clone());
        local.set(TOKEN_KEY, "stale").unwrap();
        jar.set(TOKEN_KEY, "fresh").unwrap();

        assert_eq!(repo.token().as_deref(), Some("fresh"));
    }

    #[test]
    fn clear_empties_both_stores() {
        let jar = Arc::new(CookieJar::new());
        let local = Arc::new(MemoryStore::new());
        let repo = SessionRepository::new(Arc::clone(&jar), local.clone());
        repo.write(&session()).unwrap();

        repo.clear().unwrap();

        assert!(jar.is_empty());
        assert!(local.get(TOKEN_KEY).is_none());
        assert!(local.get(USER_KEY).is_none());
        assert!(!repo.is_authenticated());
    }

    #[test]
    fn set_cookie_headers_update_the_jar() {
        let jar = CookieJar::new();
        let url: Url = "http://localhost/api".parse().unwrap();
        let set = [HeaderValue::from_static("refresh=r1; Path=/; HttpOnly")];
        jar.set_cookies(&mut set.iter(), &url);
        assert_eq!(jar.get("refresh").as_deref(), Some("r1"));

        let cookie_header = jar.cookies(&url).unwrap();
        assert_eq!(cookie_header.to_str().unwrap(), "refresh=r1");

        let expire = [HeaderValue::from_static("refresh=; Max-Age=0")];
        jar.set_cookies(&mut expire.iter(), &url);
        assert!(jar.get("refresh").is_none());
        assert!(jar.cookies(&url).is_none());
    }

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileStore::new(&path).set(TOKEN_KEY, "persisted").unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("persisted"));

        reopened.remove(TOKEN_KEY).unwrap();
        assert!(FileStore::new(&path).get(TOKEN_KEY).is_none());
    }

    #[test]
    fn session_user_fields() {
        let s = session();
        assert_eq!(s.user_id().as_deref(), Some("u1"));
        assert_eq!(s.photo().as_deref(), Some("https://cdn/mia.png"));

        let anonymous = Session {
            token: "t".into(),
            user: serde_json::Value::Null,
        };
        assert_eq!(anonymous.display_name(), "You");
    }

    #[test]
    fn navigator_remembers_route() {
        let nav = LoggingNavigator::new();
        assert!(nav.last_redirect().is_none());
        nav.redirect("/login");
        assert_eq!(nav.last_redirect().as_deref(), Some("/login"));
    }
}
