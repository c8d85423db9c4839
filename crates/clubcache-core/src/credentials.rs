use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::APP_NAME;

/// Keyring account the API key is stored under
const API_KEY_ACCOUNT: &str = "google-api-key";

/// OS keychain storage for the Google API key, so it need not live in `.env`.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the API key in the OS keychain
    pub fn store_api_key(api_key: &str) -> Result<()> {
        let entry = Entry::new(APP_NAME, API_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(api_key)
            .context("Failed to store API key in keychain")?;
        Ok(())
    }

    /// Retrieve the API key from the OS keychain
    pub fn get_api_key() -> Result<String> {
        let entry = Entry::new(APP_NAME, API_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve API key from keychain")
    }

    /// Delete the stored API key
    pub fn delete_api_key() -> Result<()> {
        let entry = Entry::new(APP_NAME, API_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete API key from keychain")?;
        Ok(())
    }
}
