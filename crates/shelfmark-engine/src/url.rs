//! Reader-mode URL handling.

/// Scheme of reader-mode (distilled) page URLs
pub const DISTILLER_SCHEME: &str = "chrome-distiller";

const URL_PARAM: &str = "url";

/// Rewrite a reader-mode URL to the page it was distilled from.
///
/// `chrome-distiller://<id>/?url=<percent-encoded original>` becomes the
/// decoded original; any other URL is returned unchanged.
pub fn original_url_from_distiller_url(url: &str) -> String {
    let Some(rest) = url
        .split_once("://")
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(DISTILLER_SCHEME))
        .map(|(_, rest)| rest)
    else {
        return url.to_string();
    };

    let query = rest.split_once('?').map(|(_, query)| query).unwrap_or("");
    let query = query.split('#').next().unwrap_or("");
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == URL_PARAM)
        .and_then(|(_, value)| {
            urlencoding::decode(&value.replace('+', " "))
                .ok()
                .map(|decoded| decoded.into_owned())
        })
        .filter(|decoded| !decoded.is_empty())
        .unwrap_or_else(|| url.to_string())
}
