//! HTTP client for J-Platform with login token caching.

use super::response::{error_message, SlipReceipt};
use super::{
    SlipApi, APPLY_CAMPAIGN_PATH, ARP_SLIPS_PATH, CHEQUE_SLIPS_PATH, LOGIN_PATH, LOGOUT_PATH,
    SAFE_DEPOSIT_SLIPS_PATH, SALES_INVOICE_PATH, SALES_ORDER_PATH,
};
use crate::config::JplatformConfig;
use crate::error::{Result, SyncError};
use crate::slips::{
    ApplyCampaignRequest, ArpSlip, ChequeSlip, SafeDepositSlip, SalesInvoice, SalesOrderSlip,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Responses longer than this are truncated in debug logs.
const MAX_LOG_BODY_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    auth_token: Option<String>,
    error_message: Option<String>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// J-Platform REST client.
///
/// One instance is shared by every pipeline. The login token is cached
/// behind an async mutex and refreshed when it expires or when a request
/// comes back 401.
pub struct JplatformClient {
    http: reqwest::Client,
    config: JplatformConfig,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl JplatformClient {
    pub fn new(config: &JplatformConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base().to_string(),
            config: config.clone(),
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `Basic` credential: `user:password:period:firm:language`, with the
    /// period and firm numbers stripped of leading zeros.
    fn basic_credentials(&self) -> Result<String> {
        let period: u32 = self.config.period_no.trim().parse().map_err(|_| {
            SyncError::Config(format!("jplatform.period_no is not numeric: {}", self.config.period_no))
        })?;
        let firm: u32 = self.config.firm_no.trim().parse().map_err(|_| {
            SyncError::Config(format!("jplatform.firm_no is not numeric: {}", self.config.firm_no))
        })?;
        let raw = format!(
            "{}:{}:{}:{}:{}",
            self.config.username, self.config.password, period, firm, self.config.language
        );
        Ok(STANDARD.encode(raw))
    }

    /// Value of the `auth-token` header for a login token.
    fn auth_header(&self, token: &str) -> String {
        STANDARD.encode(format!("1:{}:{}", token, self.config.username))
    }

    async fn logout(&self) {
        match self.http.post(self.url(LOGOUT_PATH)).send().await {
            Ok(_) => debug!("Logout completed"),
            Err(e) => debug!("Logout failed (ignored): {}", e),
        }
    }

    async fn login(&self) -> Result<String> {
        self.logout().await;

        debug!("Login attempt to {}", LOGIN_PATH);
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .header(AUTHORIZATION, format!("Basic {}", self.basic_credentials()?))
            .header(CONTENT_TYPE, "application/json")
            .body("")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Login response ({}): {}", status.as_u16(), preview(&body));

        if !status.is_success() {
            return Err(SyncError::Auth(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| SyncError::Auth(format!("Unreadable login response: {}", e)))?;
        match parsed {
            LoginResponse {
                success: true,
                auth_token: Some(token),
                ..
            } => {
                info!("Login successful. Token acquired.");
                Ok(token)
            }
            LoginResponse { error_message, .. } => Err(SyncError::Auth(
                error_message.unwrap_or_else(|| "Unknown login error".to_string()),
            )),
        }
    }

    /// Header value for the current token, logging in first when the cached
    /// one is missing or expired. The lock is held across the login so
    /// concurrent callers wait for a single refresh.
    async fn current_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let fresh = matches!(&*cached, Some(t) if Instant::now() < t.expires_at);
        if !fresh {
            debug!("Token expired or missing, refreshing...");
            let token = self.login().await?;
            let ttl = Duration::from_secs(self.config.token_ttl_minutes.max(1) as u64 * 60);
            *cached = Some(CachedToken {
                token,
                expires_at: Instant::now() + ttl,
            });
        }
        let token = cached.as_ref().map(|t| t.token.as_str()).unwrap_or_default();
        Ok(self.auth_header(token))
    }

    async fn clear_token(&self) {
        *self.token.lock().await = None;
    }

    async fn send_once(&self, method: &Method, path: &str, json: &str) -> Result<SlipReceipt> {
        let token = self.current_token().await?;
        let response = self
            .http
            .request(method.clone(), self.url(path))
            .header("auth-token", token)
            .header(CONTENT_TYPE, "application/json")
            .body(json.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Response ({}): {}", status.as_u16(), preview(&body));

        if status.is_success() {
            return Ok(SlipReceipt::parse(&body));
        }
        let message = error_message(&body)
            .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), body));
        Err(SyncError::api(status.as_u16(), message, Some(body)))
    }

    /// Send `body` as JSON. A 401 clears the token and the request is
    /// repeated once with a fresh login.
    pub async fn send<T: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<SlipReceipt> {
        let json = serde_json::to_string(body)?;
        debug!("{} {} - Request: {}", method, path, preview(&json));

        match self.send_once(&method, path, &json).await {
            Err(e) if e.is_unauthorized() => {
                warn!("Unauthorized on {}, clearing token and retrying...", path);
                self.clear_token().await;
                self.send_once(&method, path, &json).await
            }
            other => other,
        }
    }
}

fn preview(body: &str) -> String {
    let mut out: String = body.chars().take(MAX_LOG_BODY_CHARS).collect();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        out.push_str("...");
    }
    out
}

#[async_trait]
impl SlipApi for JplatformClient {
    async fn post_safe_deposit_slip(&self, slip: &SafeDepositSlip) -> Result<SlipReceipt> {
        self.send(Method::POST, SAFE_DEPOSIT_SLIPS_PATH, slip).await
    }

    async fn post_cheque_slip(&self, slip: &ChequeSlip) -> Result<SlipReceipt> {
        self.send(Method::POST, CHEQUE_SLIPS_PATH, slip).await
    }

    async fn post_sales_order(&self, slip: &SalesOrderSlip) -> Result<SlipReceipt> {
        self.send(Method::POST, SALES_ORDER_PATH, slip).await
    }

    async fn post_arp_slip(&self, slip: &ArpSlip) -> Result<SlipReceipt> {
        self.send(Method::POST, ARP_SLIPS_PATH, slip).await
    }

    async fn post_sales_invoice(&self, invoice: &SalesInvoice) -> Result<SlipReceipt> {
        self.send(Method::POST, SALES_INVOICE_PATH, invoice).await
    }

    async fn apply_campaign(&self, request: &ApplyCampaignRequest) -> Result<SlipReceipt> {
        self.send(Method::PUT, APPLY_CAMPAIGN_PATH, request).await
    }

    async fn check_login(&self) -> Result<()> {
        self.clear_token().await;
        self.current_token().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        method: String,
        path: String,
        headers: HashMap<String, String>,
        body: String,
    }

    fn header_end_offset(buffer: &[u8]) -> Option<usize> {
        buffer.windows(4).position(|window| window == b"\r\n\r\n")
    }

    async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
        let mut buffer = Vec::new();
        loop {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if header_end_offset(&buffer).is_some() {
                break;
            }
        }

        let header_end = header_end_offset(&buffer)?;
        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next()?.split_whitespace();
        let method = request_line.next()?.to_string();
        let path = request_line.next()?.to_string();

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let content_length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let mut body = buffer[header_end + 4..].to_vec();
        while body.len() < content_length {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Some(CapturedRequest {
            method,
            path,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        })
    }

    async fn write_http_response(
        stream: &mut tokio::net::TcpStream,
        status: u16,
        body: &str,
    ) -> std::io::Result<()> {
        let text = match status {
            200 => "OK",
            400 => "Bad Request",
            401 => "Unauthorized",
            _ => "Error",
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            text,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.flush().await
    }

    /// Replays `responses` in order, one per request, and records what it
    /// received. Unscripted requests get a 500.
    async fn start_mock_server(
        responses: Vec<(u16, &str)>,
    ) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let scripted: VecDeque<(u16, String)> = responses
            .into_iter()
            .map(|(s, b)| (s, b.to_string()))
            .collect();
        let scripted = Arc::new(Mutex::new(scripted));
        let captured_clone = Arc::clone(&captured);

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(value) => value,
                    Err(_) => break,
                };
                let Some(request) = read_http_request(&mut stream).await else {
                    continue;
                };
                captured_clone.lock().await.push(request);
                let (status, body) = scripted
                    .lock()
                    .await
                    .pop_front()
                    .unwrap_or((500, r#"{"Message":"unexpected request"}"#.to_string()));
                let _ = write_http_response(&mut stream, status, &body).await;
            }
        });

        (format!("http://{}/", addr), captured)
    }

    /// Accepts connections and reads the request but never answers.
    async fn start_silent_server() -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured_clone = Arc::clone(&captured);

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((mut stream, _)) = listener.accept().await {
                if let Some(request) = read_http_request(&mut stream).await {
                    captured_clone.lock().await.push(request);
                }
                held.push(stream);
            }
        });

        (format!("http://{}/", addr), captured)
    }

    fn client(base_url: &str) -> JplatformClient {
        client_with_timeout(base_url, 5)
    }

    fn client_with_timeout(base_url: &str, timeout_seconds: u64) -> JplatformClient {
        JplatformClient::new(&JplatformConfig {
            base_url: base_url.to_string(),
            username: "api".to_string(),
            password: "pw".to_string(),
            firm_no: "005".to_string(),
            period_no: "01".to_string(),
            language: "TRTR".to_string(),
            timeout_seconds,
            token_ttl_minutes: 25,
            utc_offset: "+03:00".to_string(),
        })
        .unwrap()
    }

    const LOGIN_OK_T1: &str = r#"{"success":true,"authToken":"T1"}"#;
    const LOGIN_OK_T2: &str = r#"{"success":true,"authToken":"T2"}"#;

    #[tokio::test]
    async fn test_login_then_post_sends_expected_headers() {
        let (base, captured) = start_mock_server(vec![
            (200, "{}"),
            (200, LOGIN_OK_T1),
            (200, r#"{"transactionNo":"00042","logicalRef":7}"#),
        ])
        .await;

        let receipt = client(&base)
            .post_safe_deposit_slip(&SafeDepositSlip::default())
            .await
            .unwrap();
        assert_eq!(receipt.reference().as_deref(), Some("00042"));

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].path, LOGOUT_PATH);
        assert_eq!(requests[1].path, LOGIN_PATH);
        assert_eq!(
            requests[1].headers.get("authorization").map(String::as_str),
            Some(format!("Basic {}", STANDARD.encode("api:pw:1:5:TRTR")).as_str())
        );

        let post = &requests[2];
        assert_eq!(post.method, "POST");
        assert_eq!(post.path, SAFE_DEPOSIT_SLIPS_PATH);
        assert_eq!(
            post.headers.get("auth-token").map(String::as_str),
            Some(STANDARD.encode("1:T1:api").as_str())
        );
        let body: serde_json::Value = serde_json::from_str(&post.body).unwrap();
        assert_eq!(body["pCPointCode"], "");
    }

    #[tokio::test]
    async fn test_token_is_reused_between_requests() {
        let (base, captured) = start_mock_server(vec![
            (200, "{}"),
            (200, LOGIN_OK_T1),
            (200, r#"{"transactionNo":"1"}"#),
            (200, r#"{"transactionNo":"2"}"#),
        ])
        .await;

        let api = client(&base);
        api.post_arp_slip(&ArpSlip::default()).await.unwrap();
        let second = api.post_arp_slip(&ArpSlip::default()).await.unwrap();
        assert_eq!(second.transaction_no.as_deref(), Some("2"));

        let logins = captured
            .lock()
            .await
            .iter()
            .filter(|r| r.path == LOGIN_PATH)
            .count();
        assert_eq!(logins, 1);
    }

    #[tokio::test]
    async fn test_unauthorized_retries_once_with_fresh_login() {
        let (base, captured) = start_mock_server(vec![
            (200, "{}"),
            (200, LOGIN_OK_T1),
            (401, r#"{"Message":"token expired"}"#),
            (200, "{}"),
            (200, LOGIN_OK_T2),
            (200, r#"{"logicalRef":55}"#),
        ])
        .await;

        let receipt = client(&base)
            .post_sales_order(&SalesOrderSlip::default())
            .await
            .unwrap();
        assert_eq!(receipt.reference().as_deref(), Some("55"));

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 6);
        assert_eq!(
            requests[5].headers.get("auth-token").map(String::as_str),
            Some(STANDARD.encode("1:T2:api").as_str())
        );
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_returned() {
        let (base, captured) = start_mock_server(vec![
            (200, "{}"),
            (200, LOGIN_OK_T1),
            (401, "{}"),
            (200, "{}"),
            (200, LOGIN_OK_T2),
            (401, r#"{"Message":"still no"}"#),
        ])
        .await;

        let err = client(&base)
            .post_cheque_slip(&ChequeSlip::default())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "still no");
        assert_eq!(captured.lock().await.len(), 6);
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let (base, _captured) = start_mock_server(vec![
            (200, "{}"),
            (200, r#"{"success":false,"errorMessage":"Kullanıcı adı veya şifre hatalı"}"#),
        ])
        .await;

        let err = client(&base).check_login().await.unwrap_err();
        assert!(matches!(err, SyncError::Auth(ref m) if m == "Kullanıcı adı veya şifre hatalı"));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_vendor_error_is_parsed() {
        let body = r#"{"message":["Cari hesap bulunamadı","Satır 1 hatalı"]}"#;
        let (base, _captured) =
            start_mock_server(vec![(200, "{}"), (200, LOGIN_OK_T1), (400, body)]).await;

        let err = client(&base)
            .post_sales_invoice(&SalesInvoice::default())
            .await
            .unwrap_err();
        match &err {
            SyncError::Api { status, message, .. } => {
                assert_eq!(*status, 400);
                assert_eq!(message, "Cari hesap bulunamadı | Satır 1 hatalı");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.response_body(), Some(body));
    }

    #[tokio::test]
    async fn test_unparseable_error_falls_back_to_status_and_body() {
        let (base, _captured) = start_mock_server(vec![
            (200, "{}"),
            (200, LOGIN_OK_T1),
            (502, "gateway down"),
        ])
        .await;

        let err = client(&base)
            .apply_campaign(&ApplyCampaignRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: gateway down");
    }

    #[tokio::test]
    async fn test_apply_campaign_uses_put() {
        let (base, captured) =
            start_mock_server(vec![(200, "{}"), (200, LOGIN_OK_T1), (200, "{}")]).await;

        client(&base)
            .apply_campaign(&ApplyCampaignRequest {
                no: "SIL-1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let requests = captured.lock().await.clone();
        assert_eq!(requests[2].method, "PUT");
        assert_eq!(requests[2].path, APPLY_CAMPAIGN_PATH);
        assert!(requests[2].body.contains(r#""no":"SIL-1""#));
    }

    #[tokio::test]
    async fn test_unanswered_request_maps_to_timeout() {
        let (base, captured) = start_silent_server().await;

        let err = client_with_timeout(&base, 1)
            .post_arp_slip(&ArpSlip::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Timeout), "unexpected error: {err:?}");
        assert_eq!(err.to_string(), "Request timeout");
        assert_eq!(err.exit_code(), 3);
        let paths: Vec<_> = captured.lock().await.iter().map(|r| r.path.clone()).collect();
        assert!(!paths.iter().any(|p| p == ARP_SLIPS_PATH));
    }

    #[tokio::test]
    async fn test_rejected_relogin_after_unauthorized_stops() {
        let (base, captured) = start_mock_server(vec![
            (200, "{}"),
            (200, LOGIN_OK_T1),
            (401, r#"{"Message":"token expired"}"#),
            (200, "{}"),
            (200, r#"{"success":false,"errorMessage":"Lisans süresi doldu"}"#),
        ])
        .await;

        let err = client(&base)
            .post_sales_order(&SalesOrderSlip::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Auth(ref m) if m == "Lisans süresi doldu"));
        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 5);
        let posts = requests.iter().filter(|r| r.path == SALES_ORDER_PATH).count();
        assert_eq!(posts, 1);
    }
}
