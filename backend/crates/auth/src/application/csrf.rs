//! CSRF Guard
//!
//! Synchronizer-token protection bound to the session. One live token per
//! session; it is reused until it expires or is explicitly regenerated.

use std::sync::Arc;

use serde::Serialize;

use crate::application::config::CsrfConfig;
use crate::application::session::Session;
use crate::domain::entity::csrf_token::CsrfToken;

/// Token name and value, as handed to templates and AJAX clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrfTokenData {
    pub name: String,
    pub value: String,
}

/// Issues and validates the session's CSRF token
#[derive(Clone)]
pub struct CsrfGuard {
    session: Session,
    config: Arc<CsrfConfig>,
}

impl CsrfGuard {
    pub fn new(session: Session, config: Arc<CsrfConfig>) -> Self {
        Self { session, config }
    }

    pub fn token_name(&self) -> &str {
        &self.config.token_name
    }

    /// Current token, issuing a new one when absent or expired
    pub fn get_token(&self) -> String {
        let lifetime = self.config.token_lifetime();
        self.session.with_data(|data| match &data.csrf {
            Some(token) if !token.is_expired(lifetime) => token.value.clone(),
            _ => {
                let token = CsrfToken::issue();
                let value = token.value.clone();
                data.csrf = Some(token);
                value
            }
        })
    }

    /// Check a submitted token against the session's token
    pub fn validate_token(&self, candidate: Option<&str>) -> bool {
        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return false;
        };

        let lifetime = self.config.token_lifetime();
        self.session.with_data(|data| {
            data.csrf
                .as_ref()
                .is_some_and(|token| token.matches(candidate) && !token.is_expired(lifetime))
        })
    }

    /// Replace the token unconditionally
    pub fn regenerate_token(&self) -> String {
        let token = CsrfToken::issue();
        let value = token.value.clone();
        self.session.with_data(|data| data.csrf = Some(token));
        value
    }

    pub fn clear_token(&self) {
        self.session.with_data(|data| data.csrf = None);
    }

    pub fn token_data(&self) -> CsrfTokenData {
        CsrfTokenData {
            name: self.token_name().to_string(),
            value: self.get_token(),
        }
    }

    /// Hidden form input carrying the token
    pub fn token_field(&self) -> String {
        let data = self.token_data();
        format!(
            r#"<input type="hidden" name="{}" value="{}">"#,
            escape_html(&data.name),
            escape_html(&data.value)
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
