//! UI-agnostic session state shared by every front-end.
//!
//! A front-end lists the accounts, forwards selection changes and drives
//! [`Authenticator::tick`] from its own timer. The session never spawns a
//! loop of its own.

use tracing::{debug, info, warn};

use crate::{
    config::SessionConfig,
    credential::{self, Credential, CredentialList, StoreError},
    preferences::PreferenceStore,
    schedule::{Tick, Ticker},
    OtpError,
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No account is selected")]
    NoSelection,
    #[error("Unknown account {0:?}")]
    UnknownAccount(String),
    #[error("Could not generate a code")]
    Otp(#[from] OtpError),
}

/// The operations a front-end needs from the core.
pub trait Authenticator {
    /// Display names in file order.
    fn list_accounts(&self) -> Vec<String>;

    /// Selects the first account named `display_name`, remembers it and
    /// returns a fresh tick for it.
    fn select_account(&mut self, display_name: &str, unix_millis: u64)
        -> Result<Tick, SessionError>;

    /// Code and remaining time for the selected account at `unix_millis`.
    fn tick(&mut self, unix_millis: u64) -> Result<Tick, SessionError>;
}

/// Conditions met while opening a session. None of them are fatal.
#[derive(Debug, Default)]
pub struct StartupReport {
    /// Why the credential list is empty, if it is.
    pub credentials_error: Option<StoreError>,
    /// The selection came from the preferences file.
    pub restored_selection: bool,
}

#[derive(Debug)]
pub struct Session {
    credentials: CredentialList,
    preferences: Option<PreferenceStore>,
    selected: Option<usize>,
    ticker: Ticker,
}

impl Session {
    /// Builds a session and picks the startup selection: the remembered
    /// account when it is still in the list, otherwise the first one.
    ///
    /// The startup selection is not written back to the preferences file.
    pub fn new(credentials: CredentialList, preferences: Option<PreferenceStore>) -> Self {
        Self::build(credentials, preferences).0
    }

    fn build(credentials: CredentialList, preferences: Option<PreferenceStore>) -> (Self, bool) {
        let mut session = Self {
            credentials,
            preferences,
            selected: None,
            ticker: Ticker::new(),
        };
        let restored = session.restore_selection();
        (session, restored)
    }

    /// Loads credentials and preferences from the configured paths.
    pub fn open(config: &SessionConfig) -> (Self, StartupReport) {
        let mut report = StartupReport::default();

        let credentials = match credential::load(&config.secrets_path) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "starting without credentials");
                report.credentials_error = Some(e);
                CredentialList::default()
            }
        };

        let preferences = PreferenceStore::new(&config.preferences_path);
        let (session, restored) = Self::build(credentials, Some(preferences));
        report.restored_selection = restored;

        (session, report)
    }

    /// Returns whether the remembered account was found.
    fn restore_selection(&mut self) -> bool {
        let remembered = self
            .preferences
            .as_ref()
            .and_then(PreferenceStore::load)
            .and_then(|name| self.credentials.position(&name));

        self.selected = match remembered {
            Some(index) => Some(index),
            None if self.credentials.is_empty() => None,
            None => Some(0),
        };

        if let Some(credential) = self.selected_credential() {
            info!(account = credential.display_name(), "initial selection");
        }

        remembered.is_some()
    }

    pub fn credentials(&self) -> &CredentialList {
        &self.credentials
    }

    pub fn selected_credential(&self) -> Option<&Credential> {
        self.selected.and_then(|i| self.credentials.get(i))
    }

    /// Display name of the selected account.
    pub fn selected(&self) -> Option<&str> {
        self.selected_credential().map(Credential::display_name)
    }

    fn remember(&self, display_name: &str) {
        let Some(store) = &self.preferences else {
            return;
        };

        if let Err(e) = store.save(display_name) {
            warn!(error = %e, "could not remember selected account");
        }
    }
}

impl Authenticator for Session {
    fn list_accounts(&self) -> Vec<String> {
        self.credentials.display_names()
    }

    fn select_account(
        &mut self,
        display_name: &str,
        unix_millis: u64,
    ) -> Result<Tick, SessionError> {
        let index = self
            .credentials
            .position(display_name)
            .ok_or_else(|| SessionError::UnknownAccount(display_name.to_string()))?;

        debug!(account = display_name, "account selected");
        self.selected = Some(index);
        self.ticker.reset();
        self.remember(display_name);

        self.tick(unix_millis)
    }

    fn tick(&mut self, unix_millis: u64) -> Result<Tick, SessionError> {
        let credential = self
            .selected
            .and_then(|i| self.credentials.get(i))
            .ok_or(SessionError::NoSelection)?;

        self.ticker
            .tick(credential.totp(), unix_millis)
            .map_err(|e| {
                warn!(account = credential.display_name(), error = %e, "code generation failed");
                SessionError::from(e)
            })
    }
}
