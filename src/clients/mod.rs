pub mod auth;
pub mod error;
pub mod monitoring;
pub mod registry;
pub mod sheets;
pub mod types;

use std::collections::BTreeMap;

pub use auth::AuthClient;
pub use error::ClientError;
pub use monitoring::MonitoringClient;
pub use registry::RegistryClient;
pub use sheets::SheetsClient;
pub use types::{MonitoringRecord, RegistryRecord};

use crate::config::VervalConfig;
use crate::workflow::PendingRow;

/// Every remote operation the workflow engine performs, bundled behind one
/// seam so tests can script the remote world.
pub trait RemoteServices {
    /// Exchange credentials for a session cookie.
    async fn login(&self, username: &str, password: &str) -> Result<String, ClientError>;

    /// Check a stored cookie and return the portal display name.
    async fn validate(&self, cookie: &str) -> Result<String, ClientError>;

    /// Construct the spreadsheet handle from the credential blob. First
    /// writer wins; later calls with a handle already present are no-ops.
    fn init_spreadsheet(&mut self, blob: &str) -> Result<(), ClientError>;

    /// Whether the spreadsheet handle has been constructed.
    fn spreadsheet_ready(&self) -> bool;

    async fn fetch_pending_rows(
        &self,
        verifier_name: &str,
    ) -> Result<(Vec<String>, Vec<PendingRow>), ClientError>;

    async fn commit_decision(
        &self,
        row_index: usize,
        updates: &BTreeMap<String, String>,
        custom_reason: Option<&str>,
    ) -> Result<(), ClientError>;

    async fn mark_skipped(&self, row_index: usize, dark: bool) -> Result<(), ClientError>;

    async fn fetch_school_record(
        &self,
        npsn: &str,
        cookie: &str,
    ) -> Result<MonitoringRecord, ClientError>;

    async fn submit_decision(
        &self,
        params: &[(String, String)],
        cookie: &str,
    ) -> Result<(), ClientError>;

    async fn fetch_school_registry(&self, q: &str) -> Result<RegistryRecord, ClientError>;
}

/// The shipping bundle: four HTTP clients against the configured services.
/// The spreadsheet handle starts absent and is constructed once the
/// credential blob is imported.
pub struct HttpServices {
    auth: AuthClient,
    monitoring: MonitoringClient,
    registry: RegistryClient,
    sheets: Option<SheetsClient>,
    config: VervalConfig,
}

impl HttpServices {
    pub fn new(config: VervalConfig) -> Self {
        Self {
            auth: AuthClient::new(config.portal_base_url.clone()),
            monitoring: MonitoringClient::new(config.portal_base_url.clone()),
            registry: RegistryClient::new(
                config.registry_base_url.clone(),
                config.registry_query_token.clone(),
                config.registry_cookie.clone(),
            ),
            sheets: None,
            config,
        }
    }

    fn sheets(&self) -> Result<&SheetsClient, ClientError> {
        self.sheets
            .as_ref()
            .ok_or_else(|| ClientError::Auth("Service account belum dipilih.".into()))
    }
}

impl RemoteServices for HttpServices {
    async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        self.auth.login(username, password).await
    }

    async fn validate(&self, cookie: &str) -> Result<String, ClientError> {
        self.auth.validate(cookie).await
    }

    fn init_spreadsheet(&mut self, blob: &str) -> Result<(), ClientError> {
        if self.sheets.is_some() {
            return Ok(());
        }
        self.sheets = Some(SheetsClient::from_credential_blob(
            blob,
            self.config.sheets_base_url.clone(),
            self.config.spreadsheet_id.clone(),
            self.config.sheet_name.clone(),
            self.config.sheet_grid_id,
        )?);
        Ok(())
    }

    fn spreadsheet_ready(&self) -> bool {
        self.sheets.is_some()
    }

    async fn fetch_pending_rows(
        &self,
        verifier_name: &str,
    ) -> Result<(Vec<String>, Vec<PendingRow>), ClientError> {
        self.sheets()?.fetch_pending_rows(verifier_name).await
    }

    async fn commit_decision(
        &self,
        row_index: usize,
        updates: &BTreeMap<String, String>,
        custom_reason: Option<&str>,
    ) -> Result<(), ClientError> {
        self.sheets()?
            .commit_decision(row_index, updates, custom_reason)
            .await
    }

    async fn mark_skipped(&self, row_index: usize, dark: bool) -> Result<(), ClientError> {
        self.sheets()?.mark_skipped(row_index, dark).await
    }

    async fn fetch_school_record(
        &self,
        npsn: &str,
        cookie: &str,
    ) -> Result<MonitoringRecord, ClientError> {
        self.monitoring.fetch_school_record(npsn, cookie).await
    }

    async fn submit_decision(
        &self,
        params: &[(String, String)],
        cookie: &str,
    ) -> Result<(), ClientError> {
        self.monitoring.submit_decision(params, cookie).await
    }

    async fn fetch_school_registry(&self, q: &str) -> Result<RegistryRecord, ClientError> {
        self.registry.fetch_school_registry(q).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sheet_operations_fail_fast_without_credential() {
        let services = HttpServices::new(VervalConfig::default());
        assert!(!services.spreadsheet_ready());
        let err = services.fetch_pending_rows("Siti").await.unwrap_err();
        assert_eq!(err, ClientError::Auth("Service account belum dipilih.".into()));
    }

    #[tokio::test]
    async fn init_spreadsheet_is_first_writer_wins() {
        let mut services = HttpServices::new(VervalConfig::default());
        services
            .init_spreadsheet(r#"{"access_token": "one"}"#)
            .unwrap();
        assert!(services.spreadsheet_ready());
        // A second call is a no-op, not an error.
        services.init_spreadsheet("not even json").unwrap();
        assert!(services.spreadsheet_ready());
    }

    #[test]
    fn init_spreadsheet_rejects_bad_blob() {
        let mut services = HttpServices::new(VervalConfig::default());
        let err = services.init_spreadsheet("nope").unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
        assert!(!services.spreadsheet_ready());
    }
}
