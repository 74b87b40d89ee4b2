//! Scrape client for the school-monitoring portal.
//!
//! The portal has no API; everything is read off two HTML pages. The listing
//! page carries a per-school row whose cell color encodes review readiness
//! and whose `onclick` handler embeds the navigation target for the detail
//! page. The detail page is parsed for school info, review photos, process
//! history, and the opaque query parameters that must be echoed back when a
//! decision is submitted.

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, header};
use scraper::{ElementRef, Html, Selector};

use super::error::ClientError;
use super::types::{ContextParams, HistoryItem, MonitoringDetails, MonitoringRecord, SchoolInfo};

const LISTING_PATH: &str = "r_monitoring.php";
const DECISION_PATH: &str = "r_dkm_apr_p.php";

pub struct MonitoringClient {
    client: Client,
    base_url: String,
}

impl MonitoringClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self { client, base_url }
    }

    /// Load the listing row for `npsn` and, when it links to a detail page,
    /// scrape the full record.
    ///
    /// A listing row without a navigation target returns only the ready flag;
    /// the caller decides what to do with a not-ready row.
    pub async fn fetch_school_record(
        &self,
        npsn: &str,
        cookie: &str,
    ) -> Result<MonitoringRecord, ClientError> {
        if cookie.is_empty() {
            return Err(ClientError::Auth("Cookie PHPSESSID diperlukan".into()));
        }

        let listing = self
            .get_html(&format!("{LISTING_PATH}?inpsn={npsn}"), cookie)
            .await?;
        let (ready, next_path) = parse_listing(&listing);

        let Some(next_path) = next_path else {
            return Ok(MonitoringRecord { ready, details: None });
        };

        let detail = self.get_html(&next_path, cookie).await?;
        let details = parse_detail(&detail, &next_path)?;
        Ok(MonitoringRecord {
            ready,
            details: Some(details),
        })
    }

    /// Submit the accept/reject decision by echoing the round-tripped
    /// context parameters with the status flag and rationale applied.
    pub async fn submit_decision(
        &self,
        params: &[(String, String)],
        cookie: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .get(format!("{}{DECISION_PATH}", self.base_url))
            .query(params)
            .header(header::COOKIE, format!("PHPSESSID={cookie}"))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!(
                "Gagal update portal monitoring: {body}"
            )));
        }
        Ok(())
    }

    async fn get_html(&self, path: &str, cookie: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header(header::COOKIE, format!("PHPSESSID={cookie}"))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "Gagal mengakses portal monitoring. Response code: {}",
                status.as_u16()
            )));
        }
        Ok(response.text().await?)
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Pull the ready flag and the embedded navigation target off the first
/// listing row.
fn parse_listing(html: &str) -> (bool, Option<String>) {
    let doc = Html::parse_document(html);
    let row_sel = selector("#main-content div.table-container table tbody tr");
    let td_sel = selector("td");

    let Some(row) = doc.select(&row_sel).next() else {
        return (false, None);
    };

    let onclick = row.value().attr("onclick").unwrap_or_default();
    let open_re = Regex::new(r"window\.open\('([^']*)'").expect("valid regex");
    let next_path = open_re
        .captures(onclick)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|p| !p.is_empty());

    let first_td_style = row
        .select(&td_sel)
        .next()
        .and_then(|td| td.value().attr("style"))
        .unwrap_or_default();
    let ready = first_td_style.contains("color:green");

    (ready, next_path)
}

/// Parse the detail page plus the query string of the path that led to it.
fn parse_detail(html: &str, next_path: &str) -> Result<MonitoringDetails, ClientError> {
    let doc = Html::parse_document(html);

    let input_sel = selector(".filter-section input");
    let values: Vec<Option<String>> = doc
        .select(&input_sel)
        .map(|el| el.value().attr("value").map(str::to_string))
        .collect();
    let field = |i: usize| values.get(i).cloned().flatten();
    let school_info = SchoolInfo {
        npsn: field(0),
        nama: field(1),
        alamat: field(2),
        provinsi: field(3),
        kabupaten: field(4),
        kecamatan: field(5),
        kelurahan_desa: field(6),
        jenjang: field(7),
        bentuk: field(8),
        sekolah: field(9),
        formal: field(10),
        pic: field(11),
        telp_pic: field(12),
        resi_pengiriman: field(13),
        serial_number: field(14),
        status: field(15),
    };

    let card_sel = selector("#flush-collapseTwo .card");
    let label_sel = selector("label > b");
    let img_sel = selector("img");
    let mut images = BTreeMap::new();
    for card in doc.select(&card_sel) {
        let label = card
            .select(&label_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        for img in card.select(&img_sel) {
            if let Some(src) = img.value().attr("src") {
                images.insert(label.clone(), src.to_string());
            }
        }
    }

    let history_sel = selector("#flush-collapseOne tbody tr");
    let td_sel = selector("td");
    let process_history = doc
        .select(&history_sel)
        .map(|row| {
            let cells: Vec<String> = row.select(&td_sel).map(element_text).collect();
            HistoryItem {
                tanggal: cells.first().cloned(),
                status: cells.get(1).cloned(),
                keterangan: cells.get(2).cloned(),
            }
        })
        .collect();

    let query = next_path.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let mut params: BTreeMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let mut take = |key: &str| params.remove(key).unwrap_or_default();
    let context = ContextParams {
        q: take("q"),
        npsn: school_info.npsn.clone().unwrap_or_default(),
        iprop: take("iprop"),
        ikab: take("ikab"),
        ikec: take("ikec"),
        iins: take("iins"),
        ijenjang: take("ijenjang"),
        ibp: take("ibp"),
        iss: take("iss"),
        isf: take("isf"),
        istt: take("istt"),
        itgl: take("itgl"),
        itgla: take("itgla"),
        itgle: take("itgle"),
        ipet: take("ipet"),
        ihnd: take("ihnd"),
    };

    Ok(MonitoringDetails {
        school_info,
        images,
        process_history,
        context,
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> MonitoringClient {
        MonitoringClient::new(format!("{}/", server.uri()))
    }

    fn listing_html(style: &str, onclick: &str) -> String {
        format!(
            r#"<html><body><div id="main-content"><div class="table-container">
            <table><tbody><tr {onclick}><td style="{style}">10101010</td><td>SDN 1</td></tr>
            </tbody></table></div></div></body></html>"#
        )
    }

    const DETAIL_HTML: &str = r#"<html><body>
      <div class="filter-section">
        <input value="10101010"><input value="SDN 1 CONTOH"><input value="Jl. Merdeka 1">
        <input value="JAWA BARAT"><input value="KAB. BANDUNG"><input value="CIMAHI">
        <input value="SUKAJADI"><input value="SD"><input value="Negeri"><input value="SDN 1">
        <input value="Formal"><input value="Pak Asep"><input value="0812345">
        <input value="RESI-9"><input value="SN-777"><input value="Terpasang">
      </div>
      <div id="flush-collapseOne">
        <table><tbody>
          <tr><td> 2025-03-01 </td><td>Dikirim</td><td>ok</td></tr>
          <tr><td>2025-03-05</td><td>Terpasang</td><td></td></tr>
        </tbody></table>
      </div>
      <div id="flush-collapseTwo">
        <div class="card"><label><b>FOTO PAPAN NAMA</b></label><img src="uploads/papan.jpg"></div>
        <div class="card"><label><b>FOTO SERIAL NUMBER</b></label><img src="uploads/sn.jpg"></div>
      </div>
    </body></html>"#;

    #[tokio::test]
    async fn empty_cookie_fails_before_any_request() {
        let server = MockServer::start().await;
        let err = client(&server)
            .fetch_school_record("10101010", "")
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Auth("Cookie PHPSESSID diperlukan".into()));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_without_target_returns_flag_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r_monitoring.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing_html("color:red;font-weight:bold", "")),
            )
            .mount(&server)
            .await;

        let record = client(&server)
            .fetch_school_record("10101010", "abc")
            .await
            .unwrap();
        assert!(!record.ready);
        assert!(record.details.is_none());
    }

    #[tokio::test]
    async fn full_scrape_parses_detail_page() {
        let server = MockServer::start().await;
        let onclick = r#"onclick="window.open('dkm.php?q=tok-1&iprop=01&ikab=02&ikec=03&iins=04&ijenjang=SD&ibp=B&iss=1&isf=2&istt=3&itgl=2025-03-01&itgla=2025-03-02&itgle=2025-03-05&ipet=P&ihnd=H','_blank')""#;
        Mock::given(method("GET"))
            .and(path("/r_monitoring.php"))
            .and(query_param("inpsn", "10101010"))
            .and(header("cookie", "PHPSESSID=abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_html("color:green", onclick)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dkm.php"))
            .and(query_param("q", "tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_HTML))
            .mount(&server)
            .await;

        let record = client(&server)
            .fetch_school_record("10101010", "abc")
            .await
            .unwrap();
        assert!(record.ready);
        let details = record.details.unwrap();

        assert_eq!(details.school_info.npsn.as_deref(), Some("10101010"));
        assert_eq!(details.school_info.nama.as_deref(), Some("SDN 1 CONTOH"));
        assert_eq!(details.school_info.serial_number.as_deref(), Some("SN-777"));
        assert_eq!(details.school_info.status.as_deref(), Some("Terpasang"));

        assert_eq!(details.images.len(), 2);
        assert_eq!(
            details.images.get("FOTO SERIAL NUMBER").map(String::as_str),
            Some("uploads/sn.jpg")
        );

        assert_eq!(details.process_history.len(), 2);
        assert_eq!(details.process_history[0].tanggal.as_deref(), Some("2025-03-01"));
        assert_eq!(details.process_history[1].status.as_deref(), Some("Terpasang"));

        assert_eq!(details.context.q, "tok-1");
        assert_eq!(details.context.npsn, "10101010");
        assert_eq!(details.context.itgle, "2025-03-05");
        assert_eq!(details.context.ihnd, "H");
    }

    #[tokio::test]
    async fn listing_transport_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r_monitoring.php"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_school_record("10101010", "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn submit_decision_sends_all_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r_dkm_apr_p.php"))
            .and(query_param("q", "tok-1"))
            .and(query_param("s", "R"))
            .and(query_param("v", "(5A) Geo Tagging tidak sesuai"))
            .and(header("cookie", "PHPSESSID=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let params = vec![
            ("q".to_string(), "tok-1".to_string()),
            ("s".to_string(), "R".to_string()),
            ("v".to_string(), "(5A) Geo Tagging tidak sesuai".to_string()),
        ];
        client(&server).submit_decision(&params, "abc").await.unwrap();
    }

    #[tokio::test]
    async fn submit_decision_failure_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r_dkm_apr_p.php"))
            .respond_with(ResponseTemplate::new(500).set_body_string("sesi berakhir"))
            .mount(&server)
            .await;

        let err = client(&server).submit_decision(&[], "abc").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Transport("Gagal update portal monitoring: sesi berakhir".into())
        );
    }
}
