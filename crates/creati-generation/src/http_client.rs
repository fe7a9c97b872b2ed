use std::time::Duration;

use reqwest::Client;

/// HTTP client shared by every provider adapter
///
/// Carries no request timeout of its own; each upstream call is bounded by
/// the proxy's configured deadline.
pub fn http_client() -> reqwest::Result<Client> {
    let mut headers = http::HeaderMap::new();
    headers.insert(http::header::CONNECTION, http::HeaderValue::from_static("keep-alive"));

    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Some(Duration::from_secs(30)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers)
        .build()
}
