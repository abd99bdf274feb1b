use reqwest::Url;

/// Query keys that only carry tracking state
const TRACKER_KEYS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "igshid", "mc_cid", "mc_eid", "_hsenc", "_hsmi",
    "yclid",
];

fn is_tracking_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKER_KEYS.contains(&key.as_str())
}

/// Parse user input as a web URL.
///
/// The input is tried as-is first, then with an assumed `https://` prefix so
/// bare domains such as `example.com/recipe` are accepted. Anything containing
/// whitespace is never a URL.
pub fn parse_web_url(input: &str) -> Option<Url> {
    let input = input.trim();
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        return None;
    }

    if let Ok(url) = Url::parse(input) {
        if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
            return Some(url);
        }
        // Something like "mailto:" or "ingredients:2" - not prefixable either
        if input.contains("://") {
            return None;
        }
    }

    let url = Url::parse(&format!("https://{input}")).ok()?;
    let host = url.host_str()?;
    let tld = host.rsplit('.').next()?;
    if host.contains('.') && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(url)
    } else {
        None
    }
}

/// Remove tracking parameters, keeping every other parameter in order along
/// with the path and fragment.
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    if url.query().is_none() {
        return normalized;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_key(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        normalized.set_query(None);
    } else {
        normalized.query_pairs_mut().clear().extend_pairs(kept);
    }
    normalized
}
