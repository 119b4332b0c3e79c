//! Return URLs for Checkout and the Billing Portal.

use http::Uri;

/// Base used when the request carries no usable `Origin`.
pub const DEFAULT_RETURN_BASE: &str = "http://localhost:3000";

/// Path the Billing Portal returns to.
pub const DEFAULT_RETURN_PATH: &str = "/dashboard";

/// Builds an absolute return URL from the request origin and a path.
///
/// The origin is used only when it starts with `http://` or `https://` and
/// parses as an absolute URI with a host; otherwise `http://localhost:3000`
/// is the base.
pub fn build_return_url(origin_header: Option<&str>, path: &str) -> String {
    build_return_url_with_fallback(origin_header, path, DEFAULT_RETURN_BASE)
}

/// Like [`build_return_url`] with a caller-supplied fallback base.
pub fn build_return_url_with_fallback(
    origin_header: Option<&str>,
    path: &str,
    fallback_base: &str,
) -> String {
    let base = origin_header
        .filter(|origin| is_usable_origin(origin))
        .unwrap_or(fallback_base);
    let base = base.strip_suffix('/').unwrap_or(base);

    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

fn is_usable_origin(origin: &str) -> bool {
    if !(origin.starts_with("http://") || origin.starts_with("https://")) {
        return false;
    }
    origin
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.host().map(|host| !host.is_empty()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_http_origin_as_base() {
        assert_eq!(
            build_return_url(Some("https://example.com"), "/dashboard"),
            "https://example.com/dashboard"
        );
        assert_eq!(
            build_return_url(Some("http://localhost:5173"), "/pricing"),
            "http://localhost:5173/pricing"
        );
    }

    #[test]
    fn falls_back_without_origin() {
        assert_eq!(
            build_return_url(None, DEFAULT_RETURN_PATH),
            "http://localhost:3000/dashboard"
        );
    }

    #[test]
    fn falls_back_for_non_http_schemes() {
        for origin in ["chrome-extension://abcdef", "null", "", "ftp://example.com"] {
            assert_eq!(
                build_return_url(Some(origin), "/dashboard"),
                "http://localhost:3000/dashboard",
                "origin: {origin}"
            );
        }
    }

    #[test]
    fn scheme_check_is_case_sensitive() {
        assert_eq!(
            build_return_url(Some("HTTPS://example.com"), "/dashboard"),
            "http://localhost:3000/dashboard"
        );
    }

    #[test]
    fn falls_back_for_origins_without_host() {
        assert_eq!(
            build_return_url(Some("https://"), "/dashboard"),
            "http://localhost:3000/dashboard"
        );
        assert_eq!(
            build_return_url(Some("https://exa mple.com"), "/dashboard"),
            "http://localhost:3000/dashboard"
        );
    }

    #[test]
    fn no_double_slash() {
        assert_eq!(
            build_return_url(Some("https://example.com/"), "/dashboard"),
            "https://example.com/dashboard"
        );
    }

    #[test]
    fn adds_leading_slash_to_path() {
        assert_eq!(
            build_return_url(Some("https://example.com"), "dashboard"),
            "https://example.com/dashboard"
        );
        assert_eq!(build_return_url(None, ""), "http://localhost:3000/");
    }

    #[test]
    fn keeps_query_in_path() {
        assert_eq!(
            build_return_url(Some("https://app.example.com"), "/dashboard?checkout=success"),
            "https://app.example.com/dashboard?checkout=success"
        );
    }

    #[test]
    fn custom_fallback_is_used_and_trimmed() {
        assert_eq!(
            build_return_url_with_fallback(None, "/dashboard", "https://subjectai.app/"),
            "https://subjectai.app/dashboard"
        );
    }
}
