use crate::{UrlError, UrlResult};

/// Resolves a reference extracted from site markup to an absolute URL
///
/// # Rules
///
/// 1. Surrounding whitespace is trimmed; an empty reference is rejected
/// 2. A reference already starting with `http://` or `https://` is used as-is
/// 3. A protocol-relative reference (`//host/...`) takes the origin's scheme
/// 4. Anything else is prefixed with the site's fixed origin
///
/// No other rewriting happens: the result is used verbatim as the listing's
/// identity key, so two references that differ only in query or fragment
/// stay distinct.
///
/// # Examples
///
/// ```
/// use listing_harvester::url::absolutize;
///
/// let url = absolutize("https://www.olx.ua", "/d/uk/obyavlenie/item.html").unwrap();
/// assert_eq!(url, "https://www.olx.ua/d/uk/obyavlenie/item.html");
/// ```
pub fn absolutize(origin: &str, reference: &str) -> UrlResult<String> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(UrlError::Empty);
    }

    if has_http_scheme(reference) {
        return Ok(reference.to_string());
    }

    if let Some(rest) = reference.strip_prefix("//") {
        let scheme = origin
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| UrlError::InvalidScheme(origin.to_string()))?;
        return Ok(format!("{}://{}", scheme, rest));
    }

    if let Some((scheme, _)) = reference.split_once(':') {
        if is_scheme_like(scheme) {
            return Err(UrlError::InvalidScheme(scheme.to_string()));
        }
    }

    let origin = origin.trim_end_matches('/');
    if reference.starts_with('/') {
        Ok(format!("{}{}", origin, reference))
    } else {
        Ok(format!("{}/{}", origin, reference))
    }
}

fn has_http_scheme(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// `javascript:`, `mailto:`, `data:` and friends are not site paths
fn is_scheme_like(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
