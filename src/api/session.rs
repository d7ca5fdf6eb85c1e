/// Session cookies kept between runs.
///
/// The backend authenticates with `access_token` / `refresh_token` cookies.
/// They are captured from `Set-Cookie` headers, replayed as a `Cookie`
/// header, and persisted as JSON in the session file.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub cookies: BTreeMap<String, String>,
    /// Email used for the last successful login.
    pub email: Option<String>,
    pub saved_at: Option<String>,
}

impl Session {
    /// Load the session file. A missing or unreadable file is an empty session.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "discarding unreadable session file");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create session directory")?;
        }
        let mut stamped = self.clone();
        stamped.saved_at = Some(chrono::Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(&stamped).context("failed to serialize session")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Remove the session file if present.
    pub fn delete(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Apply one `Set-Cookie` header value. An empty value or `Max-Age=0`
    /// deletes the cookie. Returns whether anything changed.
    pub fn absorb_set_cookie(&mut self, header: &str) -> bool {
        let mut parts = header.split(';');
        let Some((name, value)) = parts.next().and_then(|kv| kv.split_once('=')) else {
            return false;
        };
        let name = name.trim();
        let value = value.trim().trim_matches('"');
        if name.is_empty() {
            return false;
        }

        let expired = parts.any(|attr| {
            let attr = attr.trim().to_ascii_lowercase();
            attr == "max-age=0" || attr.starts_with("max-age=-")
        });

        if expired || value.is_empty() {
            self.cookies.remove(name).is_some()
        } else {
            self.cookies.insert(name.to_string(), value.to_string()).as_deref() != Some(value)
        }
    }

    /// `Cookie` request header, or `None` when there is nothing to send.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self.cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_and_replays_cookies() {
        let mut s = Session::default();
        assert!(s.absorb_set_cookie("access_token=abc; HttpOnly; Path=/; SameSite=lax"));
        assert!(s.absorb_set_cookie("refresh_token=\"r1\"; HttpOnly; Max-Age=604800"));
        assert_eq!(s.cookie_header().as_deref(), Some("access_token=abc; refresh_token=r1"));
        assert!(!s.absorb_set_cookie("access_token=abc; Path=/"));
    }

    #[test]
    fn expired_cookie_is_removed() {
        let mut s = Session::default();
        s.absorb_set_cookie("access_token=abc");
        assert!(s.absorb_set_cookie("access_token=\"\"; expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0"));
        assert!(s.is_empty());
        assert_eq!(s.cookie_header(), None);
        assert!(!s.absorb_set_cookie("garbage"));
    }

    #[test]
    fn save_load_delete() {
        let path = std::env::temp_dir()
            .join(format!("cargaboard-session-{}", std::process::id()))
            .join("session.json");
        let mut s = Session::default();
        s.absorb_set_cookie("access_token=abc");
        s.email = Some("ana@example.com".into());
        s.save(&path).unwrap();

        let loaded = Session::load(&path);
        assert_eq!(loaded.cookies, s.cookies);
        assert!(loaded.saved_at.is_some());

        Session::delete(&path).unwrap();
        Session::delete(&path).unwrap();
        assert!(Session::load(&path).is_empty());
    }
}
