//! Configuration loaded from `verval.toml`.
//!
//! [`VervalConfig`] holds every configurable parameter. Values missing from
//! the file fall back to the production defaults. The
//! `VERVAL_REGISTRY_COOKIE` environment variable takes precedence over the
//! file for the registry session cookie, which expires and is rotated out of
//! band.

use serde::Deserialize;
use std::path::Path;

use crate::error::VervalError;

#[derive(Debug, Clone, Deserialize)]
pub struct VervalConfig {
    /// Base URL of the monitoring portal (login, listing, detail, decision).
    #[serde(default = "default_portal_base_url")]
    pub portal_base_url: String,

    /// Base URL of the education-data registry.
    #[serde(default = "default_registry_base_url")]
    pub registry_base_url: String,

    /// Base URL of the spreadsheet REST service.
    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,

    /// Id of the worksheet spreadsheet.
    #[serde(default = "default_spreadsheet_id")]
    pub spreadsheet_id: String,

    /// Quoted sheet name used in A1 ranges.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Numeric grid id of the sheet, used by formatting batches.
    #[serde(default = "default_sheet_grid_id")]
    pub sheet_grid_id: i64,

    /// Fixed token in the registry query path.
    #[serde(default = "default_registry_query_token")]
    pub registry_query_token: String,

    /// Provisioned registry session cookie (`djanCook`).
    #[serde(default)]
    pub registry_cookie: String,

    /// Directory holding the credential store and queue cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_portal_base_url() -> String {
    "https://kemendikdasmen.hisense.id/".to_string()
}

fn default_registry_base_url() -> String {
    "https://datadik.kemendikdasmen.go.id/".to_string()
}

fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_spreadsheet_id() -> String {
    "1rtLbHvl6qpQiRat4h79vvLlUAqq15dc1b7p81zaQoqM".to_string()
}

fn default_sheet_name() -> String {
    "'Lembar Kerja'".to_string()
}

fn default_sheet_grid_id() -> i64 {
    340924294
}

fn default_registry_query_token() -> String {
    "173F3996-ED37-4D49-8487-534D0CE53421".to_string()
}

fn default_data_dir() -> String {
    ".verval".to_string()
}

impl Default for VervalConfig {
    fn default() -> Self {
        Self {
            portal_base_url: default_portal_base_url(),
            registry_base_url: default_registry_base_url(),
            sheets_base_url: default_sheets_base_url(),
            spreadsheet_id: default_spreadsheet_id(),
            sheet_name: default_sheet_name(),
            sheet_grid_id: default_sheet_grid_id(),
            registry_query_token: default_registry_query_token(),
            registry_cookie: String::new(),
            data_dir: default_data_dir(),
        }
    }
}

impl VervalConfig {
    /// Load the configuration from `verval.toml` in the current directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> Result<Self, VervalError> {
        let path = Path::new("verval.toml");
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<VervalConfig>(&contents)?
        } else {
            Self::default()
        };

        // The registry cookie rotates; the environment wins over the file.
        if let Ok(cookie) = std::env::var("VERVAL_REGISTRY_COOKIE")
            && !cookie.is_empty()
        {
            config.registry_cookie = cookie;
        }

        // Client code joins relative paths onto these without a separator.
        for (key, url) in [
            ("portal_base_url", &config.portal_base_url),
            ("registry_base_url", &config.registry_base_url),
        ] {
            if !url.ends_with('/') {
                return Err(VervalError::Config(format!("{key} harus diakhiri '/'")));
            }
        }

        Ok(config)
    }
}
