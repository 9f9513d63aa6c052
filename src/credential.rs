//! Account credentials read from an otpauth secrets file.
//!
//! The file is plain UTF-8 text with one `otpauth://totp/...` URI per line.
//! Blank lines and lines starting with `#` are skipped. A line that cannot be
//! parsed is logged and skipped; it never aborts loading.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{totp::Totp, uri_helper, OtpError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Secrets file {0} does not exist")]
    FileNotFound(PathBuf),
    #[error("Secrets file {0} contains no valid TOTP entries")]
    NoValidCredentials(PathBuf),
    #[error("Could not read secrets file {0}")]
    Io(PathBuf, #[source] io::Error),
}

/// A single account: where it comes from and how to generate its codes.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    issuer: Option<String>,
    account: String,
    display_name: String,
    totp: Totp,
}

impl Credential {
    pub fn new(issuer: Option<String>, account: String, totp: Totp) -> Self {
        let issuer = issuer.filter(|i| !i.is_empty());
        let display_name = match &issuer {
            Some(issuer) => format!("{issuer}:{account}"),
            None => account.clone(),
        };

        Self {
            issuer,
            account,
            display_name,
            totp,
        }
    }

    /// Parses a single `otpauth://totp/...` URI.
    pub fn from_uri(uri: &str) -> Result<Self, OtpError> {
        uri_helper::credential_from_uri(uri)
    }

    pub fn to_uri(&self) -> Result<String, OtpError> {
        uri_helper::credential_to_uri(self)
    }

    pub fn secret(&self) -> &str {
        self.totp.secret()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// `issuer:account`, or just the account when there is no issuer.
    /// Not guaranteed to be unique within a list.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn totp(&self) -> &Totp {
        &self.totp
    }
}

/// Credentials in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialList {
    entries: Vec<Credential>,
}

impl CredentialList {
    pub fn new(entries: Vec<Credential>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Credential> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.entries.iter()
    }

    pub fn display_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|c| c.display_name().to_string())
            .collect()
    }

    /// Position of the first credential whose display name matches.
    pub fn position(&self, display_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|c| c.display_name() == display_name)
    }
}

impl<'a> IntoIterator for &'a CredentialList {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parses secrets file lines, skipping comments, blanks and bad lines.
pub fn parse<I, S>(lines: I) -> CredentialList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match uri_helper::credential_from_uri(line) {
            Ok(credential) => entries.push(credential),
            Err(e) => warn!(line = index + 1, error = %e, "skipping unusable secrets line"),
        }
    }

    CredentialList::new(entries)
}

/// Reads and parses the secrets file at `path`.
///
/// A file without any usable entry is reported as
/// [`StoreError::NoValidCredentials`], distinct from a missing file.
pub fn load(path: &Path) -> Result<CredentialList, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(StoreError::Io(path.to_path_buf(), e)),
    };

    let credentials = parse(content.lines());
    if credentials.is_empty() {
        return Err(StoreError::NoValidCredentials(path.to_path_buf()));
    }

    info!(path = %path.display(), count = credentials.len(), "loaded credentials");
    Ok(credentials)
}
