//! Street View Static API request URLs.

use url::Url;

use crate::error::ConfigError;
use crate::utils::sanitize_filename;

pub const STREET_VIEW_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview";

/// Parses `WIDTHxHEIGHT`, both positive.
pub fn parse_image_size(size: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidImageSize(size.to_string());
    let (w, h) = size.split_once('x').ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

/// Builds `<endpoint>?size=..&location=..&key=..`.
///
/// The address is form-encoded, so spaces become `+`.
pub fn image_url(
    endpoint: &str,
    address: &str,
    size: &str,
    api_key: &str,
) -> Result<Url, ConfigError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ConfigError::EmptyAddress);
    }
    if api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    let (w, h) = parse_image_size(size)?;

    let mut url = Url::parse(endpoint).map_err(|source| ConfigError::InvalidEndpoint {
        url: endpoint.to_string(),
        source,
    })?;
    url.query_pairs_mut()
        .append_pair("size", &format!("{}x{}", w, h))
        .append_pair("location", address)
        .append_pair("key", api_key.trim());
    Ok(url)
}

/// `"1704 Highland Ave"` -> `"1704_highland_ave.png"`.
pub fn image_filename(address: &str) -> String {
    let cleaned: String = address
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { ' ' })
        .collect();
    let joined = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    if joined.is_empty() {
        return format!("download_{}.png", uuid::Uuid::new_v4());
    }
    format!("{}.png", sanitize_filename(&joined))
}

/// Copy of `url` with the `key` query value masked, for logs.
pub fn redact_key(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    if pairs.is_empty() {
        return redacted;
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}
