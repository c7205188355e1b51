use crate::error::Error;

/// Parsed source repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRepoUrl {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl ParsedRepoUrl {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Parse a repository URL of the form `https://<host>/<owner>/<repo>`.
///
/// Only `https://` is accepted — the backend clones over https with the
/// submitted credential. A trailing `/` or `.git` suffix is tolerated since
/// both are common when copy-pasting from a browser or `git remote -v`.
/// Extra path segments are rejected: the backend expects exactly owner/repo.
///
/// Returns `None` for malformed URLs.
pub fn parse_repo_url(url: &str) -> Option<ParsedRepoUrl> {
    let after_scheme = url.strip_prefix("https://")?;
    let (host, path) = after_scheme.split_once('/')?;
    if host.is_empty() || !host.contains('.') {
        return None;
    }

    let path = path.strip_suffix('/').unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let name = segments.next().filter(|s| !s.is_empty())?;
    if segments.next().is_some() {
        return None;
    }

    Some(ParsedRepoUrl {
        host: host.to_owned(),
        owner: owner.to_owned(),
        name: name.to_owned(),
    })
}

/// Validate a repository URL, rejecting malformed input before any dispatch.
pub fn validate_repo_url(url: &str) -> Result<ParsedRepoUrl, Error> {
    if url.trim().is_empty() {
        return Err(Error::Validation("repository URL is required".to_owned()));
    }
    parse_repo_url(url).ok_or_else(|| {
        Error::Validation(format!(
            "\"{url}\" is not a valid repository URL (expected https://<host>/<owner>/<repo>)"
        ))
    })
}

// ---------------------------------------------------------------------------
// Access token lexical formats
// ---------------------------------------------------------------------------

/// Recognized lexical formats for a repository access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `github_pat_` prefixed fine-grained token, at least 70 chars total.
    FineGrained,
    /// `ghp_` prefixed classic token, at least 36 chars total.
    Classic,
}

/// Validate the lexical shape of an access token.
///
/// The token is write-only: this check is the only thing the client ever does
/// with it besides forwarding it to the backend.
pub fn validate_access_token(token: &str) -> Result<TokenKind, Error> {
    if token.is_empty() {
        return Err(Error::Validation("access token is required".to_owned()));
    }
    if token.starts_with("github_pat_") && token.len() >= 70 {
        return Ok(TokenKind::FineGrained);
    }
    if token.starts_with("ghp_") && token.len() >= 36 {
        return Ok(TokenKind::Classic);
    }
    Err(Error::Validation(
        "access token does not match a recognized format".to_owned(),
    ))
}

/// Validate a webhook secret: required, no shape constraint beyond length.
pub fn validate_webhook_secret(secret: &str) -> Result<(), Error> {
    if secret.trim().is_empty() {
        return Err(Error::Validation("webhook secret is required".to_owned()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
