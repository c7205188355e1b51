use std::fmt;

use anyhow::{Result, bail};

/// Authenticated session context.
///
/// Acquired once at login, passed into the backend client at construction,
/// dropped (or replaced) at logout. Centralizing the bearer token here is
/// what keeps ad-hoc token reads out of individual call sites.
pub struct Session {
    user_id: String,
    token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub(crate) fn bearer_token(&self) -> &str {
        &self.token
    }
}

// The token never appears in logs or debug output.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Resolve the backend bearer token.
///
/// Priority:
/// 1. `PIPEWATCH_TOKEN` environment variable
/// 2. `token` in the `[backend]` config section
pub fn resolve_token(config_token: Option<&str>) -> Result<String> {
    if let Ok(token) = std::env::var("PIPEWATCH_TOKEN")
        && !token.is_empty()
    {
        return Ok(token);
    }
    if let Some(token) = config_token
        && !token.is_empty()
    {
        return Ok(token.to_owned());
    }
    bail!(
        "no backend token found. Set PIPEWATCH_TOKEN or add `token` \
         to the [backend] section of the config file."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_token() {
        let session = Session::new("user-1", "top-secret");
        let printed = format!("{session:?}");
        assert!(printed.contains("user-1"));
        assert!(!printed.contains("top-secret"));
    }

    #[test]
    fn config_token_is_used_when_env_is_absent() {
        // Note: assumes PIPEWATCH_TOKEN is not set in the test environment.
        if std::env::var("PIPEWATCH_TOKEN").is_ok() {
            return;
        }
        assert_eq!(resolve_token(Some("from-config")).unwrap(), "from-config");
        assert!(resolve_token(None).is_err());
        assert!(resolve_token(Some("")).is_err());
    }
}
