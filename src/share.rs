//! Shareable links and download headers.

use axum::http::HeaderValue;
use uuid::Uuid;

/// The public link of an upload: the configured prefix with the id appended.
pub fn download_url(base_download_url: &str, id: Uuid) -> String {
    format!("{}{}", base_download_url, id)
}

/// ASCII-only stand-in for `filename=`.
///
/// Non-ASCII and control characters are dropped, quotes and backslashes are
/// escaped for the quoted-string.
pub fn ascii_fallback(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            continue;
        }
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    if out.trim().is_empty() {
        "download".to_string()
    } else {
        out
    }
}

/// `attachment; filename="<ascii>"; filename*=UTF-8''<percent-encoded>`
pub fn content_disposition(name: &str) -> HeaderValue {
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback(name),
        urlencoding::encode(name)
    );
    // Only printable ASCII is left at this point
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
