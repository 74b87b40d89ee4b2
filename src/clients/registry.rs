//! Lookup client for the government education-data registry.
//!
//! Two calls: a free-text query resolving to a positional list-of-lists with
//! the school's identity, then a personnel listing keyed by the resolved id.
//! The registry session cookie is a fixed, provisioned value (the portal has
//! no per-operator login for this flow).

use std::time::Duration;

use reqwest::{Client, header};
use serde_json::Value;

use super::error::ClientError;
use super::types::{Personnel, RegistryRecord};

const HEAD_OF_SCHOOL_ROLE: &str = "Kepala Sekolah";

pub struct RegistryClient {
    client: Client,
    base_url: String,
    query_token: String,
    session_cookie: String,
}

impl RegistryClient {
    pub fn new(base_url: String, query_token: String, session_cookie: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url,
            query_token,
            session_cookie,
        }
    }

    /// Resolve `q` (an NPSN or free text) to a registry record with the
    /// personnel list and derived head-of-school name.
    pub async fn fetch_school_registry(&self, q: &str) -> Result<RegistryRecord, ClientError> {
        let response = self
            .client
            .post(format!("{}refsp/q/{}", self.base_url, self.query_token))
            .header(header::COOKIE, format!("djanCook={}", self.session_cookie))
            .form(&[("q", q)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "Registry query failed with status {}",
                status.as_u16()
            )));
        }

        let rows: Vec<Vec<Value>> = response.json().await?;
        let Some(first) = rows.first() else {
            return Err(ClientError::NotFound(format!("Data not found for q: {q}")));
        };

        // Positional response: 0 id, 1 name, 3 address, 4..6 subdivisions.
        let col = |i: usize| -> Result<String, ClientError> {
            first
                .get(i)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ClientError::Parse(format!("Registry response missing column {i} for q: {q}"))
                })
        };
        let id = col(0)?;
        let name = col(1)?;
        let address = col(3)?;
        let kecamatan = col(4)?;
        let kabupaten = col(5)?;
        let provinsi = col(6)?;

        let response = self
            .client
            .get(format!("{}ma74/sekolahptk/{id}/1", self.base_url))
            .header(header::COOKIE, format!("djanCook={}", self.session_cookie))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "Registry personnel lookup failed with status {}",
                status.as_u16()
            )));
        }
        let ptk: Vec<Personnel> = response.json().await?;

        let kepala_sekolah = ptk
            .iter()
            .find(|p| p.jabatan_ptk == HEAD_OF_SCHOOL_ROLE)
            .map(|p| p.nama.clone())
            .unwrap_or_default();

        Ok(RegistryRecord {
            id,
            name,
            address,
            kecamatan,
            kabupaten,
            provinsi,
            kepala_sekolah,
            ptk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RegistryClient {
        RegistryClient::new(
            format!("{}/", server.uri()),
            "tok-fixed".into(),
            "cook-fixed".into(),
        )
    }

    fn identity_row() -> serde_json::Value {
        json!([[
            "SCH-1",
            "SDN 1 CONTOH",
            "ignored",
            "Jl. Merdeka 1",
            "CIMAHI",
            "KAB. BANDUNG",
            "JAWA BARAT"
        ]])
    }

    #[tokio::test]
    async fn resolves_identity_and_head_of_school() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refsp/q/tok-fixed"))
            .and(header("cookie", "djanCook=cook-fixed"))
            .and(body_string_contains("q=10101010"))
            .respond_with(ResponseTemplate::new(200).set_body_json(identity_row()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ma74/sekolahptk/SCH-1/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"ptk_id": "p1", "nama": "Sari", "jenis_ptk": "Guru", "jabatan_ptk": "Guru Kelas"},
                {"ptk_id": "p2", "nama": "Budi", "jenis_ptk": "Guru", "jabatan_ptk": "Kepala Sekolah"},
                {"ptk_id": "p3", "nama": "Andi", "jenis_ptk": "Guru", "jabatan_ptk": "Kepala Sekolah"}
            ])))
            .mount(&server)
            .await;

        let record = client(&server).fetch_school_registry("10101010").await.unwrap();
        assert_eq!(record.id, "SCH-1");
        assert_eq!(record.name, "SDN 1 CONTOH");
        assert_eq!(record.address, "Jl. Merdeka 1");
        assert_eq!(record.provinsi, "JAWA BARAT");
        // First matching role wins.
        assert_eq!(record.kepala_sekolah, "Budi");
        assert_eq!(record.ptk.len(), 3);
    }

    #[tokio::test]
    async fn missing_head_of_school_defaults_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refsp/q/tok-fixed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(identity_row()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ma74/sekolahptk/SCH-1/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"ptk_id": "p1", "nama": "Sari", "jenis_ptk": "Guru", "jabatan_ptk": "Guru Kelas"}
            ])))
            .mount(&server)
            .await;

        let record = client(&server).fetch_school_registry("10101010").await.unwrap();
        assert_eq!(record.kepala_sekolah, "");
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refsp/q/tok-fixed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = client(&server).fetch_school_registry("999").await.unwrap_err();
        assert_eq!(err, ClientError::NotFound("Data not found for q: 999".into()));
    }

    #[tokio::test]
    async fn malformed_identity_row_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refsp/q/tok-fixed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([["SCH-1"]])))
            .mount(&server)
            .await;

        let err = client(&server).fetch_school_registry("123").await.unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn transport_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refsp/q/tok-fixed"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client(&server).fetch_school_registry("123").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
