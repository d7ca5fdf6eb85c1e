/// Session bootstrap, login and logout.
///
/// Every page starts with [`bootstrap`]: if the backend does not recognise
/// the session the page is replaced by a redirect to the login screen and
/// none of its loaders run.
use crate::api::types::Identity;
use crate::api::{ApiError, StatsApi};
use crate::pages::Document;
use crate::pages::chrome;

/// Where an unauthenticated page is sent.
pub const LOGIN_URL: &str = "/login.html";
/// Where a successful login lands.
pub const HOME_URL: &str = "/";
/// Shown for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas";

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(Identity),
    Redirect(&'static str),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Check the session and fill the user menu.
///
/// A 401, an unreachable backend or an unreadable body redirects to
/// [`LOGIN_URL`]. An error status with a JSON body keeps the page and
/// leaves the user widgets empty.
pub fn bootstrap<A: StatsApi + ?Sized>(api: &A, doc: &mut Document) -> AuthOutcome {
    match api.me() {
        Ok(identity) => {
            fill_user(doc, &identity);
            AuthOutcome::Authenticated(identity)
        }
        Err(e @ (ApiError::Unauthorized | ApiError::Transport(_) | ApiError::Decode(_))) => {
            tracing::info!(error = %e, "session rejected, redirecting to login");
            doc.redirect_to(LOGIN_URL);
            AuthOutcome::Redirect(LOGIN_URL)
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not load identity");
            AuthOutcome::Authenticated(Identity::default())
        }
    }
}

/// Write the identity into the header widgets.
pub fn fill_user(doc: &mut Document, identity: &Identity) {
    let name = identity.name.as_deref().filter(|n| !n.is_empty());
    let email = identity.email.as_deref().unwrap_or("");
    doc.set_text(chrome::USER_NAME, name.unwrap_or(email));
    doc.set_text(chrome::USER_FULL_NAME, name.unwrap_or("-"));
    doc.set_text(chrome::USER_EMAIL, email);
}

/// Log in. The cause of a failure is logged, the caller only ever sees
/// [`INVALID_CREDENTIALS`].
pub fn login<A: StatsApi + ?Sized>(api: &A, email: &str, password: &str) -> Result<Identity, &'static str> {
    api.login(email.trim(), password).map_err(|e| {
        tracing::warn!(error = %e, "login failed");
        INVALID_CREDENTIALS
    })
}

/// Log out and return the login URL. The backend call is best effort; the
/// local session is dropped either way.
pub fn logout<A: StatsApi + ?Sized>(api: &A) -> &'static str {
    if let Err(e) = api.logout() {
        tracing::warn!(error = %e, "logout request failed");
    }
    LOGIN_URL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_widgets_fall_back_to_email() {
        let mut doc = Document::new("t");
        crate::pages::declare_chrome(&mut doc, "/", &crate::pages::Filter::Total);
        fill_user(&mut doc, &Identity {
            name: None,
            email: Some("ana@example.com".into()),
        });
        assert_eq!(doc.text(chrome::USER_NAME), Some("ana@example.com"));
        assert_eq!(doc.text(chrome::USER_FULL_NAME), Some("-"));
        assert_eq!(doc.text(chrome::USER_EMAIL), Some("ana@example.com"));

        fill_user(&mut doc, &Identity {
            name: Some("Ana".into()),
            email: None,
        });
        assert_eq!(doc.text(chrome::USER_NAME), Some("Ana"));
        assert_eq!(doc.text(chrome::USER_FULL_NAME), Some("Ana"));
        assert_eq!(doc.text(chrome::USER_EMAIL), Some(""));
    }
}
