//! Message catalog for validation errors and the success page.
//!
//! The JSON layout is the one shared with the other citizen-facing apps:
//!
//! ```json
//! {
//!   "validationMessage": { "activationCode": "...", "password": "..." },
//!   "messages": { "activateLoginSuccessTitle": "..." }
//! }
//! ```
//!
//! Keys that are absent fall back to the built-in English text.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Catalog {
    pub validation_message: ValidationMessages,
    pub messages: Messages,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationMessages {
    pub activation_code: String,
    pub password: String,
    pub new_password_must_be_different_from_old_password: String,
    pub password_confirmation_does_not_match_password: String,
    pub email: String,
    pub phone_number: String,
}

impl Default for ValidationMessages {
    fn default() -> Self {
        Self {
            activation_code: "The activation code must have exactly 10 characters".to_string(),
            password: "The password must have at least 8 characters, one lowercase and one uppercase letter".to_string(),
            new_password_must_be_different_from_old_password:
                "The new password must be different from the old password".to_string(),
            password_confirmation_does_not_match_password:
                "The password confirmation does not match the new password".to_string(),
            email: "Invalid email address".to_string(),
            phone_number: "Invalid mobile phone number".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Messages {
    pub activate_login_success_title: String,
    pub activate_login_success_message: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            activate_login_success_title: "Account activated".to_string(),
            activate_login_success_message: "Your new password is set. You can now sign in."
                .to_string(),
        }
    }
}

impl Catalog {
    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read message catalog: {}", path.display()))?;

        Self::from_json(&raw)
            .with_context(|| format!("Invalid message catalog: {}", path.display()))
    }

    /// Parse a catalog from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the input is not valid JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load from `path` when given, otherwise use the built-in catalog.
    ///
    /// # Errors
    /// Returns an error if the given file cannot be loaded.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
