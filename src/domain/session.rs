use std::fmt;

const PREVIEW_CHARS: usize = 20;

/// An authenticated context: the bearer token returned by the login endpoint.
/// The token is never refreshed; it lives until the remote service expires it.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    /// Wrap a bearer token. Returns `None` for an empty or blank token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return None;
        }
        Some(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// First characters of the token, safe to print.
    pub fn preview(&self) -> String {
        let mut chars = self.token.chars();
        let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .finish()
    }
}
