use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simanbas_common::models::Token;
use simanbas_common::Result;
use std::path::{Path, PathBuf};

/// Authenticated identity handed to [`crate::client::ApiClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub base_url: String,
    pub username: String,
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub obtained_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "bearer".into()
}

impl Session {
    pub fn from_token(base_url: &str, username: &str, token: Token) -> Self {
        Self {
            base_url: base_url.to_owned(),
            username: username.to_owned(),
            access_token: token.access_token,
            token_type: token.token_type,
            obtained_at: Utc::now(),
        }
    }

    /// Value of the `Authorization` header; FastAPI reports the type in lowercase.
    pub fn authorization(&self) -> String {
        let scheme = if self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{scheme} {}", self.access_token)
    }

    /// A session minted against another backend must not leak its token.
    pub fn matches(&self, base_url: &str) -> bool {
        self.base_url.trim_end_matches('/') == base_url.trim_end_matches('/')
    }

    pub fn cache_path() -> PathBuf {
        if let Ok(p) = std::env::var("SIMANBAS_SESSION") {
            return PathBuf::from(p);
        }
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("simanbas")
            .join("session.json")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::cache_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load() -> Option<Self> {
        Self::load_from(&Self::cache_path())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!("ignoring unreadable session at {}: {e}", path.display());
                None
            }
        }
    }

    /// Returns whether a stored session was removed.
    pub fn clear() -> Result<bool> {
        Self::clear_at(&Self::cache_path())
    }

    pub fn clear_at(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::from_token(
            "http://localhost:8000/api/v1/",
            "teacher1",
            Token { access_token: "abc.def".into(), token_type: "bearer".into() },
        )
    }

    #[test]
    fn bearer_header() {
        assert_eq!(session().authorization(), "Bearer abc.def");
    }

    #[test]
    fn base_url_match_ignores_trailing_slash() {
        let s = session();
        assert!(s.matches("http://localhost:8000/api/v1"));
        assert!(!s.matches("http://exam.example.org/api/v1"));
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simanbas").join("session.json");
        let s = session();
        s.save_to(&path).unwrap();
        assert_eq!(Session::load_from(&path), Some(s));
        assert!(Session::clear_at(&path).unwrap());
        assert!(!Session::clear_at(&path).unwrap());
        assert!(Session::load_from(&path).is_none());
    }

    #[test]
    fn corrupt_session_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Session::load_from(&path).is_none());
    }
}
