use std::collections::BTreeMap;

use crate::domain::CredentialSettings;
use crate::ports::{Credential, CredentialProvider};

/// Resolves credential ids against the `[credentials]` table of the settings file.
///
/// `token_env` entries are read from the environment on every lookup so rotated
/// tokens are picked up by the next refresh pass.
#[derive(Debug, Clone, Default)]
pub struct SettingsCredentialProvider {
    entries: BTreeMap<String, CredentialSettings>,
}

impl SettingsCredentialProvider {
    pub fn new(entries: BTreeMap<String, CredentialSettings>) -> Self {
        Self { entries }
    }
}

impl CredentialProvider for SettingsCredentialProvider {
    fn lookup(&self, id: &str) -> Option<Credential> {
        let entry = self.entries.get(id)?;
        let token = match (&entry.token, &entry.token_env) {
            (Some(token), _) => token.clone(),
            (None, Some(var)) => std::env::var(var).ok().filter(|t| !t.is_empty())?,
            (None, None) => return None,
        };
        Some(Credential { id: id.to_string(), token })
    }
}
