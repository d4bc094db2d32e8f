use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: usize = 10;

const USER_AGENT: &str = concat!("nftpager/", env!("CARGO_PKG_VERSION"));

/// One client is shared by the RPC calls and the metadata fetches.
pub fn build_http_client(timeout_seconds: usize) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );

    let timeout = Duration::from_secs(
        timeout_seconds
            .try_into()
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS as u64),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout)
        .build()
}

pub fn parse_positive(value: &str) -> Result<NonZeroUsize, String> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    NonZeroUsize::new(n).ok_or_else(|| "expected a positive integer".to_string())
}

/// Shortens a base58 address for display, e.g. `Geh5…or1b`.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
