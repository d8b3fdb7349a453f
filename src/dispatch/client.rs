use crate::config::DispatchConfig;
use crate::error::Result;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the long-lived webhook client.
///
/// Connect and read timeouts map directly onto reqwest; the write timeout is
/// folded into the per-request deadline returned by [`request_timeout`].
///
/// reqwest configures its own rustls provider, so no process-wide provider
/// is installed here. Binaries that need one install it in `main`.
pub fn build_http_client(config: &DispatchConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .default_headers(headers)
        .user_agent(USER_AGENT)
        .build()?;

    Ok(client)
}

/// Upper bound on one full request/response exchange.
pub fn request_timeout(config: &DispatchConfig) -> Duration {
    config
        .connect_timeout
        .saturating_add(config.write_timeout)
        .saturating_add(config.read_timeout)
}
