//! Login state: the bearer token and where it is kept between runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// An authenticated session, created at login and destroyed at logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    token: String,
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into().trim().to_string();
        if token.is_empty() || token == BEARER_PREFIX.trim() {
            return Err(AuthError::MissingToken);
        }
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header. Tokens that already carry the
    /// `Bearer ` prefix are passed through unchanged.
    pub fn authorization(&self) -> String {
        if self.token.starts_with(BEARER_PREFIX) {
            self.token.clone()
        } else {
            format!("{BEARER_PREFIX}{}", self.token)
        }
    }
}

/// File-backed storage for the token of the current login.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, if any.
    pub fn load(&self) -> Result<Option<AuthSession>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                debug!(path = %self.path.display(), "loaded token");
                Ok(AuthSession::new(contents).ok())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the saved session, failing when nobody is logged in.
    pub fn require(&self) -> Result<AuthSession, AuthError> {
        self.load()?.ok_or(AuthError::NotLoggedIn)
    }

    pub fn save(&self, session: &AuthSession) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, session.token())?;
        restrict_permissions(&self.path)?;
        info!(path = %self.path.display(), "saved token");
        Ok(())
    }

    /// Remove the saved token. Returns false if there was none.
    pub fn clear(&self) -> Result<bool, AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "removed token");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> TokenStore {
        let dir = std::env::temp_dir().join(format!("vocazoo-auth-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        TokenStore::new(dir.join("nested").join("token"))
    }

    #[test]
    fn test_authorization_header() {
        let session = AuthSession::new("abc.def").unwrap();
        assert_eq!(session.authorization(), "Bearer abc.def");

        let prefixed = AuthSession::new("Bearer abc.def").unwrap();
        assert_eq!(prefixed.authorization(), "Bearer abc.def");
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(AuthSession::new("  ").is_err());
        assert!(AuthSession::new("Bearer ").is_err());
    }

    #[test]
    fn test_store_lifecycle() {
        let store = temp_store("lifecycle");
        assert_eq!(store.load().unwrap(), None);
        assert!(matches!(store.require(), Err(AuthError::NotLoggedIn)));

        let session = AuthSession::new("token-1").unwrap();
        store.save(&session).unwrap();
        assert!(store.path().ends_with("nested/token"));
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), Some(session));

        assert!(store.clear().unwrap());
        assert!(!store.path().exists());
        assert!(!store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }
}
