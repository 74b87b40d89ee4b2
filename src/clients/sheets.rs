//! Spreadsheet client over the worksheet REST API.
//!
//! The worksheet is the work queue of record: pending rows are read from a
//! fixed range, decisions are written back as batched value updates, and
//! skipped rows get a formatting-only batch (background band plus one marker
//! cell).
//!
//! The client is constructed from the opaque service-account credential blob;
//! construction is the initialization step, so there is no "not yet
//! initialized" runtime state to check. The blob is JSON carrying a ready
//! bearer `access_token`; minting and refreshing that token is the concern of
//! whoever provisions the blob.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::ClientError;
use crate::workflow::queue::PendingRow;

pub const VERIFIER_COLUMN: &str = "VERIFIKATOR";
pub const STATUS_COLUMN: &str = "STATUS (DITERIMA/DITOLAK)";

/// Number of leading banner rows before the header row in the raw range.
const HEADER_ROW_INDEX: usize = 2;

#[derive(Debug, Deserialize)]
struct CredentialBlob {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug)]
pub struct SheetsClient {
    client: Client,
    base_url: String,
    token: String,
    spreadsheet_id: String,
    sheet_name: String,
    grid_id: i64,
}

impl SheetsClient {
    /// Build an authenticated handle from the stored credential blob.
    ///
    /// An unreadable blob is a parse failure; nothing is sent over the wire
    /// here.
    pub fn from_credential_blob(
        blob: &str,
        base_url: String,
        spreadsheet_id: String,
        sheet_name: String,
        grid_id: i64,
    ) -> Result<Self, ClientError> {
        let credential: CredentialBlob = serde_json::from_str(blob)
            .map_err(|e| ClientError::Parse(format!("Service account tidak valid: {e}")))?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Ok(Self {
            client,
            base_url,
            token: credential.access_token,
            spreadsheet_id,
            sheet_name,
            grid_id,
        })
    }

    /// Read the full data range and keep the rows assigned to `verifier_name`
    /// whose status cell is still blank.
    ///
    /// The third row of the raw range is the header (the two rows above it
    /// are banner rows). Row indices are 1-based positions in the raw range
    /// so write-backs address the live sheet directly.
    pub async fn fetch_pending_rows(
        &self,
        verifier_name: &str,
    ) -> Result<(Vec<String>, Vec<PendingRow>), ClientError> {
        let range = format!("{}!A:Y", self.sheet_name);
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{range}",
            self.base_url, self.spreadsheet_id
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(response.text().await.unwrap_or_default()));
        }
        let body: ValueRangeResponse = response.json().await?;

        if body.values.len() <= HEADER_ROW_INDEX {
            return Ok((Vec::new(), Vec::new()));
        }

        let header: Vec<String> = body.values[HEADER_ROW_INDEX].iter().map(cell_text).collect();
        let verifier_col = header.iter().position(|h| h == VERIFIER_COLUMN);
        let status_col = header.iter().position(|h| h == STATUS_COLUMN);
        let (Some(verifier_col), Some(status_col)) = (verifier_col, status_col) else {
            return Err(ClientError::NotFound(
                "Kolom VERIFIKATOR atau STATUS tidak ditemukan di Sheet.".into(),
            ));
        };

        let pending = body
            .values
            .iter()
            .enumerate()
            .skip(HEADER_ROW_INDEX + 1)
            .filter(|(_, row)| {
                let verifier = row.get(verifier_col).map(cell_text).unwrap_or_default();
                let status = row.get(status_col).map(cell_text).unwrap_or_default();
                verifier == verifier_name && status.trim().is_empty()
            })
            .map(|(index, row)| PendingRow {
                row_index: index + 1,
                cells: row.iter().map(cell_text).collect(),
            })
            .collect();

        Ok((header, pending))
    }

    /// Write an evaluation decision back to the sheet.
    ///
    /// Each form column gets its value at `row_index`. Two conditional extras
    /// follow the plain updates in the same batch: a cross-reference formula
    /// `I{row} = =H{row}` when field "N" is "Sesuai", and — when the operator
    /// supplied a hand-edited rationale — the rationale in column Y plus the
    /// rejected-status literal in column X.
    pub async fn commit_decision(
        &self,
        row_index: usize,
        updates: &BTreeMap<String, String>,
        custom_reason: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut data = Vec::new();
        for (column, value) in updates {
            data.push(json!({
                "range": format!("{}!{column}{row_index}", self.sheet_name),
                "values": [[value]],
            }));
        }

        if updates.get("N").map(String::as_str) == Some("Sesuai") {
            data.push(json!({
                "range": format!("{}!I{row_index}", self.sheet_name),
                "values": [[format!("=H{row_index}")]],
            }));
        }

        if let Some(reason) = custom_reason {
            data.push(json!({
                "range": format!("{}!Y{row_index}", self.sheet_name),
                "values": [[reason]],
            }));
            data.push(json!({
                "range": format!("{}!X{row_index}", self.sheet_name),
                "values": [["DITOLAK"]],
            }));
        }

        let url = format!(
            "{}/v4/spreadsheets/{}/values:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({
                "valueInputOption": "USER_ENTERED",
                "data": data,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Transport(response.text().await.unwrap_or_default()));
        }
        Ok(())
    }

    /// Mark a row skipped with a formatting-only batch: a background band
    /// over columns J..X and the marker cell in column X.
    ///
    /// The dark variant paints the band gray and writes the "HITAM" marker,
    /// which makes the status cell non-blank and keeps the row out of future
    /// fetches; the plain variant paints white and clears the marker, leaving
    /// the row pending.
    pub async fn mark_skipped(&self, row_index: usize, dark: bool) -> Result<(), ClientError> {
        let background = if dark {
            json!({"red": 0.85, "green": 0.85, "blue": 0.85})
        } else {
            json!({"red": 1.0, "green": 1.0, "blue": 1.0})
        };
        let marker = if dark {
            json!({"stringValue": "HITAM"})
        } else {
            json!({})
        };

        let requests = json!([
            {
                "repeatCell": {
                    "range": {
                        "sheetId": self.grid_id,
                        "startRowIndex": row_index - 1,
                        "endRowIndex": row_index,
                        "startColumnIndex": 9,
                        "endColumnIndex": 24,
                    },
                    "cell": {"userEnteredFormat": {"backgroundColor": background}},
                    "fields": "userEnteredFormat.backgroundColor",
                }
            },
            {
                "updateCells": {
                    "range": {
                        "sheetId": self.grid_id,
                        "startRowIndex": row_index - 1,
                        "endRowIndex": row_index,
                        "startColumnIndex": 23,
                        "endColumnIndex": 24,
                    },
                    "rows": [{"values": [{"userEnteredValue": marker}]}],
                    "fields": "userEnteredValue",
                }
            }
        ]);

        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.base_url, self.spreadsheet_id
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({"requests": requests}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Transport(response.text().await.unwrap_or_default()));
        }
        Ok(())
    }
}

/// Render a raw cell the way the sheet shows it. Non-string cells keep their
/// JSON rendering.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BLOB: &str = r#"{"access_token": "token-1"}"#;

    fn client(server: &MockServer) -> SheetsClient {
        SheetsClient::from_credential_blob(
            BLOB,
            server.uri(),
            "sheet1".into(),
            "'Lembar Kerja'".into(),
            340924294,
        )
        .unwrap()
    }

    fn range_body() -> serde_json::Value {
        json!({
            "values": [
                ["BANNER"],
                [""],
                ["NO", "NPSN", "NAMA", "VERIFIKATOR", "STATUS (DITERIMA/DITOLAK)"],
                ["1", "10101010", "SDN 1", "Siti", ""],
                ["2", "20202020", "SDN 2", "Budi", ""],
                ["3", "30303030", "SDN 3", "Siti", "DITERIMA"],
                ["4", "40404040", "SDN 4", "Siti", "   "],
            ]
        })
    }

    #[test]
    fn invalid_blob_is_parse_failure() {
        let err = SheetsClient::from_credential_blob(
            "not json",
            "http://localhost".into(),
            "s".into(),
            "'Lembar Kerja'".into(),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn fetch_filters_by_verifier_and_blank_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v4/spreadsheets/sheet1/values/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(range_body()))
            .mount(&server)
            .await;

        let (header, rows) = client(&server).fetch_pending_rows("Siti").await.unwrap();
        assert_eq!(header[1], "NPSN");
        // Row 4 (Siti, blank) and row 7 (Siti, whitespace status) qualify;
        // Budi's row and the decided row do not.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_index, 4);
        assert_eq!(rows[0].cells[1], "10101010");
        assert_eq!(rows[1].row_index, 7);
    }

    #[tokio::test]
    async fn fetch_with_missing_status_column_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v4/spreadsheets/sheet1/values/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [[""], [""], ["NO", "NPSN", "VERIFIKATOR"], ["1", "x", "Siti"]]
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_pending_rows("Siti").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::NotFound("Kolom VERIFIKATOR atau STATUS tidak ditemukan di Sheet.".into())
        );
    }

    #[tokio::test]
    async fn fetch_short_range_yields_empty_queue() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v4/spreadsheets/sheet1/values/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": [["BANNER"]]})))
            .mount(&server)
            .await;

        let (header, rows) = client(&server).fetch_pending_rows("Siti").await.unwrap();
        assert!(header.is_empty());
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn commit_writes_each_column_and_cross_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet1/values:batchUpdate"))
            .and(body_partial_json(json!({
                "valueInputOption": "USER_ENTERED",
                "data": [
                    {"range": "'Lembar Kerja'!J5", "values": [["Sesuai"]]},
                    {"range": "'Lembar Kerja'!N5", "values": [["Sesuai"]]},
                    {"range": "'Lembar Kerja'!I5", "values": [["=H5"]]},
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let updates = BTreeMap::from([
            ("J".to_string(), "Sesuai".to_string()),
            ("N".to_string(), "Sesuai".to_string()),
        ]);
        client(&server).commit_decision(5, &updates, None).await.unwrap();
    }

    #[tokio::test]
    async fn commit_with_custom_reason_writes_rationale_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet1/values:batchUpdate"))
            .and(body_partial_json(json!({
                "data": [
                    {"range": "'Lembar Kerja'!N5", "values": [["Tidak Ada"]]},
                    {"range": "'Lembar Kerja'!Y5", "values": [["alasan khusus"]]},
                    {"range": "'Lembar Kerja'!X5", "values": [["DITOLAK"]]},
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let updates = BTreeMap::from([("N".to_string(), "Tidak Ada".to_string())]);
        client(&server)
            .commit_decision(5, &updates, Some("alasan khusus"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn commit_failure_carries_server_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet1/values:batchUpdate"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = client(&server)
            .commit_decision(5, &BTreeMap::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Transport("permission denied".into()));
    }

    #[tokio::test]
    async fn mark_skipped_dark_paints_gray_and_writes_marker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet1:batchUpdate"))
            .and(body_partial_json(json!({
                "requests": [
                    {"repeatCell": {
                        "range": {
                            "sheetId": 340924294,
                            "startRowIndex": 4,
                            "endRowIndex": 5,
                            "startColumnIndex": 9,
                            "endColumnIndex": 24,
                        },
                        "cell": {"userEnteredFormat": {"backgroundColor": {"red": 0.85, "green": 0.85, "blue": 0.85}}},
                    }},
                    {"updateCells": {
                        "rows": [{"values": [{"userEnteredValue": {"stringValue": "HITAM"}}]}],
                    }}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).mark_skipped(5, true).await.unwrap();
    }

    #[tokio::test]
    async fn mark_skipped_plain_paints_white_with_empty_marker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet1:batchUpdate"))
            .and(body_partial_json(json!({
                "requests": [
                    {"repeatCell": {
                        "cell": {"userEnteredFormat": {"backgroundColor": {"red": 1.0, "green": 1.0, "blue": 1.0}}},
                    }},
                    {"updateCells": {
                        "rows": [{"values": [{"userEnteredValue": {}}]}],
                    }}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).mark_skipped(9, false).await.unwrap();
    }
}
