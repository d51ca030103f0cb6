use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock};

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const DEFAULT_KEYRING_SERVICE: &str = "amora";

/// Key-value storage for session tokens.
///
/// Writes are last-write-wins and `remove` is idempotent, so concurrent
/// callers need no further coordination.
pub trait CredentialStore: Send + Sync + fmt::Debug {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn remove(&self, name: &str);
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth_token(token: &str) -> Self {
        let store = Self::new();
        store.set(AUTH_TOKEN_KEY, token);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.remove(name);
    }
}

/// Credential store backed by the operating system keychain.
///
/// Each token name maps to one keychain entry under the configured service.
pub struct KeyringCredentialStore {
    service: String,
    entries: Mutex<HashMap<String, keyring::Entry>>,
}

impl fmt::Debug for KeyringCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringCredentialStore")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn with_entry<R>(
        &self,
        name: &str,
        op: impl FnOnce(&keyring::Entry) -> keyring::Result<R>,
    ) -> keyring::Result<R> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = match entries.entry(name.to_string()) {
            hash_map::Entry::Occupied(slot) => slot.into_mut(),
            hash_map::Entry::Vacant(slot) => slot.insert(keyring::Entry::new(&self.service, name)?),
        };
        op(entry)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        match self.with_entry(name, |entry| entry.get_password()) {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!("Failed to read {} from keychain: {}", name, e);
                None
            }
        }
    }

    fn set(&self, name: &str, value: &str) {
        if let Err(e) = self.with_entry(name, |entry| entry.set_password(value)) {
            tracing::warn!("Failed to store {} in keychain: {}", name, e);
        }
    }

    fn remove(&self, name: &str) {
        match self.with_entry(name, |entry| entry.delete_credential()) {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => tracing::warn!("Failed to remove {} from keychain: {}", name, e),
        }
    }
}

/// Credential store persisted as a JSON object on disk.
///
/// The file is read once on open and rewritten after every mutation, readable
/// by the owner only on unix. A missing or unreadable file starts the store
/// empty; write failures are logged.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileCredentialStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create credential directory {:?}: {}", parent, e);
                return;
            }
        }
        let contents = match serde_json::to_vec_pretty(entries) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to encode credentials: {}", e);
                return;
            }
        };
        if let Err(e) = write_private(&self.path, &contents) {
            tracing::warn!("Failed to write credentials to {:?}: {}", self.path, e);
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        let mut entries = self.lock();
        entries.insert(name.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, name: &str) {
        let mut entries = self.lock();
        if entries.remove(name).is_some() {
            self.persist(&entries);
        }
    }
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // Tighten files created before the mode was set.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

fn load_entries(path: &Path) -> HashMap<String, String> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            tracing::warn!("Failed to read credentials from {:?}: {}", path, e);
            return HashMap::new();
        }
    };
    serde_json::from_slice(&contents).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed credential file {:?}: {}", path, e);
        HashMap::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryCredentialStore::new();
        assert!(store.get(AUTH_TOKEN_KEY).is_none());

        store.set(AUTH_TOKEN_KEY, "a");
        store.set(AUTH_TOKEN_KEY, "b");
        assert_eq!(store.get(AUTH_TOKEN_KEY).as_deref(), Some("b"));

        store.remove(AUTH_TOKEN_KEY);
        store.remove(AUTH_TOKEN_KEY);
        assert!(store.get(AUTH_TOKEN_KEY).is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::open(&path);
        store.set(AUTH_TOKEN_KEY, "token-1");
        store.set(REFRESH_TOKEN_KEY, "refresh-1");
        store.remove(REFRESH_TOKEN_KEY);

        let reopened = FileCredentialStore::open(&path);
        assert_eq!(reopened.get(AUTH_TOKEN_KEY).as_deref(), Some("token-1"));
        assert!(reopened.get(REFRESH_TOKEN_KEY).is_none());
    }

    #[test]
    fn file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, b"{not json").expect("write");

        let store = FileCredentialStore::open(&path);
        assert!(store.get(AUTH_TOKEN_KEY).is_none());

        store.set(AUTH_TOKEN_KEY, "fresh");
        assert_eq!(
            FileCredentialStore::open(&path).get(AUTH_TOKEN_KEY).as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn keyring_store_set_get_remove() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let store = KeyringCredentialStore::new("amora-test");
        assert!(store.get(AUTH_TOKEN_KEY).is_none());

        store.set(AUTH_TOKEN_KEY, "token-1");
        store.set(REFRESH_TOKEN_KEY, "refresh-1");
        assert_eq!(store.get(AUTH_TOKEN_KEY).as_deref(), Some("token-1"));

        store.remove(AUTH_TOKEN_KEY);
        store.remove(AUTH_TOKEN_KEY);
        assert!(store.get(AUTH_TOKEN_KEY).is_none());
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-1"));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let fresh = dir.path().join("fresh.json");
        FileCredentialStore::open(&fresh).set(AUTH_TOKEN_KEY, "secret-token");
        let mode = std::fs::metadata(&fresh).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let existing = dir.path().join("existing.json");
        std::fs::write(&existing, b"{}").expect("write");
        std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o644))
            .expect("chmod");
        FileCredentialStore::open(&existing).set(AUTH_TOKEN_KEY, "secret-token");
        let mode = std::fs::metadata(&existing).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
