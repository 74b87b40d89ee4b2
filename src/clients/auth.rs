//! Session-auth client for the monitoring portal.
//!
//! Login is a form POST whose only useful output is the `PHPSESSID` cookie;
//! the portal responds with a redirect on success, so redirects are not
//! followed. Validation scrapes the account dropdown off an
//! authenticated-only page.

use std::time::Duration;

use reqwest::{Client, header, redirect};
use scraper::{Html, Selector};

use super::error::ClientError;

const LOGIN_PATH: &str = "login_p.php";
const CHECK_PATH: &str = "r_dkm.php";

pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a client against the given portal base URL (trailing slash
    /// included).
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .redirect(redirect::Policy::none())
            .build()
            .expect("failed to build HTTP client");
        Self { client, base_url }
    }

    /// Post credentials and extract the session cookie.
    ///
    /// Success requires a `Set-Cookie: PHPSESSID=…` header; its absence is an
    /// auth failure even on a 2xx/3xx response.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(cookie) = value.to_str() else { continue };
            if let Some(rest) = cookie.strip_prefix("PHPSESSID=") {
                let sessid = rest.split(';').next().unwrap_or(rest);
                if !sessid.is_empty() {
                    return Ok(sessid.to_string());
                }
            }
        }
        Err(ClientError::Auth("Login failed: No cookie received.".into()))
    }

    /// Verify a stored session cookie by loading an authenticated-only page
    /// and extracting the logged-in display name.
    pub async fn validate(&self, cookie: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(format!("{}{CHECK_PATH}", self.base_url))
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

        let html = response.text().await?;
        let doc = Html::parse_document(&html);
        let selector = Selector::parse(".dropdown-toggle").expect("valid selector");
        let name = doc
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        if name.is_empty() {
            Err(ClientError::Auth(
                "Cookie validation failed: User not logged in.".into(),
            ))
        } else {
            Ok(name)
        }
    }
}
