//! Charset-aware page fetching.
//!
//! Every request is preceded by a politeness delay chosen by the caller. The
//! body is read as raw bytes and decoded using the charset announced in the
//! `Content-Type` header, then the one declared by a `<meta>` tag, then UTF-8.
//! The legacy Korean encodings (EUC-KR, KS_C_5601, CP949) all decode through
//! the EUC-KR decoder, which is a superset of the three.

use std::sync::LazyLock;
use std::time::Duration;

use encoding_rs::{EUC_KR, UTF_8};
use regex::Regex;
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use crate::{NongjeongError, Result};

/// Desktop browser identity sent to the news sites.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_KO: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";

/// Only the head of the payload is inspected for a `<meta>` charset.
const SNIFF_WINDOW: usize = 4096;

static HEADER_CHARSET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*"?([^;"\s]+)"#).unwrap());

/// Matches both `<meta charset="euc-kr">` and the `http-equiv` form whose
/// `content` carries `text/html; charset=euc-kr`.
static META_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([\w-]+)"#).unwrap());

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Network timeout in seconds, covering connect and body read.
    pub timeout: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 20,
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept_language: ACCEPT_LANGUAGE_KO.to_string(),
        }
    }
}

/// Reusable HTTP client carrying the browser headers.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: u64,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .unwrap_or_else(|_| HeaderValue::from_static(ACCEPT_LANGUAGE_KO)),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self { client, timeout: config.timeout })
    }

    /// Waits `delay`, fetches `url` and returns the decoded document text.
    ///
    /// # Errors
    ///
    /// [`NongjeongError::Status`] for any non-2xx answer,
    /// [`NongjeongError::Timeout`] when the network timeout elapses and
    /// [`NongjeongError::InvalidUrl`] when `url` does not parse. Decoding
    /// never fails.
    pub async fn fetch_html(&self, url: &str, delay: Duration) -> Result<String> {
        let (bytes, content_type) = self.get(url, delay).await?;
        Ok(decode_html(&bytes, content_type.as_deref()))
    }

    /// Same request path as [`Fetcher::fetch_html`] but returns the raw payload.
    pub async fn fetch_bytes(&self, url: &str, delay: Duration) -> Result<Vec<u8>> {
        let (bytes, _) = self.get(url, delay).await?;
        Ok(bytes)
    }

    async fn get(&self, url: &str, delay: Duration) -> Result<(Vec<u8>, Option<String>)> {
        let target = Url::parse(url).map_err(|e| NongjeongError::InvalidUrl(format!("{url}: {e}")))?;

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self.client.get(target).send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NongjeongError::Status { status: status.as_u16(), url: url.to_string() });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        Ok((bytes.to_vec(), content_type))
    }

    fn transport_error(&self, err: reqwest::Error) -> NongjeongError {
        if err.is_timeout() { NongjeongError::Timeout { timeout: self.timeout } } else { NongjeongError::Http(err) }
    }
}

/// Resolves the document charset label, lowercased.
///
/// Priority: `Content-Type` header parameter, `<meta>` declaration in the
/// first few kilobytes, `utf-8`.
pub fn resolve_charset(content_type: Option<&str>, bytes: &[u8]) -> String {
    if let Some(value) = content_type
        && let Some(caps) = HEADER_CHARSET.captures(value)
    {
        return caps[1].trim().to_lowercase();
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_WINDOW)]);
    if let Some(caps) = META_CHARSET.captures(&head) {
        return caps[1].to_lowercase();
    }

    "utf-8".to_string()
}

fn is_legacy_korean(charset: &str) -> bool {
    charset.contains("euc-kr") || charset.contains("ks_c_5601") || charset.contains("949")
}

/// Decodes a fetched payload to text.
///
/// A legacy Korean payload that does not decode cleanly is retried as strict
/// UTF-8 (sites sometimes mislabel their pages); failing that, the lossy
/// result with replacement characters is returned.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let charset = resolve_charset(content_type, bytes);

    if is_legacy_korean(&charset) {
        let (text, _, had_errors) = EUC_KR.decode(bytes);
        if !had_errors {
            return text.into_owned();
        }
        if let Some(utf8) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
            debug!(%charset, "payload labelled as legacy Korean decoded as UTF-8");
            return utf8.into_owned();
        }
        return text.into_owned();
    }

    let (text, _, had_errors) = UTF_8.decode(bytes);
    if had_errors {
        debug!(%charset, "payload decoded with replacement characters");
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "안녕하세요" in EUC-KR.
    const EUC_KR_GREETING: [u8; 10] = [0xbe, 0xc8, 0xb3, 0xe7, 0xc7, 0xcf, 0xbc, 0xbc, 0xbf, 0xe4];

    fn euc_kr_page() -> Vec<u8> {
        let mut page = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=euc-kr"></head><body><p>"#.to_vec();
        page.extend_from_slice(&EUC_KR_GREETING);
        page.extend_from_slice(b"</p></body></html>");
        page
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 20);
        assert!(config.user_agent.contains("Chrome/125"));
        assert!(config.accept_language.starts_with("ko-KR"));
    }

    #[test]
    fn test_header_charset_wins_over_meta() {
        let page = br#"<meta charset="utf-8">"#;
        assert_eq!(resolve_charset(Some("text/html; charset=EUC-KR"), page), "euc-kr");
    }

    #[test]
    fn test_meta_charset_sniffed() {
        assert_eq!(resolve_charset(Some("text/html"), br#"<head><meta charset='ks_c_5601-1987'>"#), "ks_c_5601-1987");
        assert_eq!(resolve_charset(None, &euc_kr_page()), "euc-kr");
    }

    #[test]
    fn test_charset_defaults_to_utf8() {
        assert_eq!(resolve_charset(None, b"<html><body>plain</body></html>"), "utf-8");
    }

    #[test]
    fn test_decode_euc_kr_from_header() {
        let text = decode_html(&EUC_KR_GREETING, Some("text/html; charset=euc-kr"));
        assert_eq!(text, "안녕하세요");
    }

    #[test]
    fn test_decode_euc_kr_from_meta() {
        let text = decode_html(&euc_kr_page(), None);
        assert!(text.contains("<p>안녕하세요</p>"));
    }

    #[test]
    fn test_decode_cp949_label() {
        let text = decode_html(&EUC_KR_GREETING, Some("text/html; charset=cp949"));
        assert_eq!(text, "안녕하세요");
    }

    #[test]
    fn test_invalid_utf8_is_lossy_not_fatal() {
        let text = decode_html(&[b'a', 0xff, b'b'], None);
        assert!(text.starts_with('a'));
        assert!(text.ends_with('b'));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let result = fetcher.fetch_html("not-a-url", Duration::ZERO).await;
        assert!(matches!(result, Err(NongjeongError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/missing").with_status(404).create_async().await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let url = format!("{}/missing", server.url());
        let err = fetcher.fetch_html(&url, Duration::ZERO).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, NongjeongError::Status { status: 404, .. }));
        assert!(err.to_string().contains(&url));
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers_and_decodes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/article")
            .match_header("user-agent", BROWSER_USER_AGENT)
            .match_header("accept-language", mockito::Matcher::Regex("^ko-KR".to_string()))
            .match_header("cache-control", "no-cache")
            .with_status(200)
            .with_header("content-type", "text/html; charset=euc-kr")
            .with_body(EUC_KR_GREETING)
            .create_async()
            .await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let text = fetcher
            .fetch_html(&format!("{}/article", server.url()), Duration::ZERO)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "안녕하세요");
    }

    #[tokio::test]
    async fn test_fetch_waits_for_politeness_delay() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/slow").with_body("<p>ok</p>").create_async().await;

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let started = std::time::Instant::now();
        fetcher
            .fetch_html(&format!("{}/slow", server.url()), Duration::from_millis(150))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(150));
    }
}
