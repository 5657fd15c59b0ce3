use reqwest::header::{HeaderMap, SET_COOKIE};
use std::collections::BTreeMap;

/// Harvest `name=value` pairs from every `Set-Cookie` header, dropping
/// attributes (`Path`, `Expires`, ...). Later headers win on name clashes.
pub(crate) fn parse_set_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for value in headers.get_all(SET_COOKIE) {
        if let Ok(raw) = value.to_str()
            && let Some(pair) = raw.split(';').next()
            && let Some((name, value)) = pair.split_once('=')
        {
            let name = name.trim();
            if !name.is_empty() {
                cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }
    cookies
}

/// Render the jar as a `Cookie` request header value. The map keeps names
/// sorted, so output is stable across calls.
pub(crate) fn build_cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
