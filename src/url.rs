//! CDN URL construction.
//!
//! Two concerns live here:
//!
//! - **Where**: [`Urls`] maps a file under the WordPress uploads directory
//!   onto the CDN base. The path is kept verbatim, including upload-pipeline
//!   markers such as `-scaled`.
//! - **What**: [`build`] appends the query parameters for a
//!   [`ResizeDirective`]:
//!
//! | Directive | Query |
//! |---|---|
//! | `Passthrough` | *(unchanged)* |
//! | `Resize` | `resize=W,H` (then `gravity=G` for anchored crops) |
//! | `Fit` | `fit=W,H` |
//! | `ScaleWidth` | `w=W` |
//! | `ScaleHeight` | `h=H` |
//! | `ScaleBoth` | `w=W&h=H` |
//!
//! Parameter order is fixed per directive. The CDN does not care, but
//! generated markup is compared byte for byte in tests and caches.

use crate::sizing::ResizeDirective;

/// Query parameters for a directive, in wire order.
pub fn query_params(directive: &ResizeDirective) -> Vec<(&'static str, String)> {
    match *directive {
        ResizeDirective::Passthrough => Vec::new(),
        ResizeDirective::Resize {
            width,
            height,
            gravity,
        } => {
            let mut params = vec![("resize", format!("{width},{height}"))];
            if let Some(gravity) = gravity {
                params.push(("gravity", gravity.as_str().to_string()));
            }
            params
        }
        ResizeDirective::Fit { width, height } => vec![("fit", format!("{width},{height}"))],
        ResizeDirective::ScaleWidth(width) => vec![("w", width.to_string())],
        ResizeDirective::ScaleHeight(height) => vec![("h", height.to_string())],
        ResizeDirective::ScaleBoth { width, height } => {
            vec![("w", width.to_string()), ("h", height.to_string())]
        }
    }
}

/// Append a directive's parameters to `base_url`.
///
/// Existing query parameters (cache busters, signatures) are kept in place
/// and a `#fragment` stays at the end.
///
/// ```
/// # use tachyon::sizing::ResizeDirective;
/// # use tachyon::url::build;
/// let url = build("http://tachy.on/u/tachyon.jpg?v=3", &ResizeDirective::Fit { width: 300, height: 169 });
/// assert_eq!(url, "http://tachy.on/u/tachyon.jpg?v=3&fit=300,169");
/// ```
pub fn build(base_url: &str, directive: &ResizeDirective) -> String {
    let params = query_params(directive);
    if params.is_empty() {
        return base_url.to_string();
    }

    let (without_fragment, fragment) = match base_url.find('#') {
        Some(pos) => base_url.split_at(pos),
        None => (base_url, ""),
    };

    let separator = match without_fragment.find('?') {
        None => "?",
        Some(_) if without_fragment.ends_with('?') || without_fragment.ends_with('&') => "",
        Some(_) => "&",
    };

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{without_fragment}{separator}{query}{fragment}")
}

/// Strip `http://`, `https://` or a protocol-relative `//`.
fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("//"))
        .unwrap_or(url)
}

/// The uploads base URL and the CDN base URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Urls {
    upload_url: String,
    cdn_url: String,
}

impl Urls {
    /// Trailing slashes on either base are ignored.
    pub fn new(upload_url: &str, cdn_url: &str) -> Self {
        Self {
            upload_url: upload_url.trim_end_matches('/').to_string(),
            cdn_url: cdn_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn cdn_url(&self) -> &str {
        &self.cdn_url
    }

    /// CDN URL of a file, given relative to the uploads directory or as an
    /// absolute upload URL.
    pub fn cdn_url_for(&self, file: &str) -> String {
        let file = self.relative_upload_path(file).unwrap_or(file);
        format!("{}/{}", self.cdn_url, file.trim_start_matches('/'))
    }

    /// Path of `url` relative to the uploads directory, if it points there.
    ///
    /// The scheme is ignored so `http`, `https` and protocol-relative
    /// references all match. Any query string or fragment is dropped.
    ///
    /// ```
    /// # use tachyon::url::Urls;
    /// let urls = Urls::new("http://example.org/wp-content/uploads", "http://tachy.on/u");
    /// assert_eq!(
    ///     urls.relative_upload_path("https://example.org/wp-content/uploads/2020/01/a.jpg?x=1"),
    ///     Some("2020/01/a.jpg")
    /// );
    /// assert_eq!(urls.relative_upload_path("http://tachy.on/u/a.jpg"), None);
    /// ```
    pub fn relative_upload_path<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = strip_scheme(url).strip_prefix(strip_scheme(&self.upload_url))?;
        let rest = rest.strip_prefix('/')?;
        let end = rest.find(['?', '#']).unwrap_or(rest.len());
        let path = &rest[..end];
        (!path.is_empty()).then_some(path)
    }

    /// Final CDN URL for a master file and directive.
    pub fn build(&self, file: &str, directive: &ResizeDirective) -> String {
        build(&self.cdn_url_for(file), directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::Gravity;

    const BASE: &str = "http://tachy.on/u/tachyon.jpg";

    #[test]
    fn passthrough_leaves_url_unchanged() {
        assert_eq!(build(BASE, &ResizeDirective::Passthrough), BASE);
        let with_query = "http://tachy.on/u/tachyon.jpg?ver=2";
        assert_eq!(build(with_query, &ResizeDirective::Passthrough), with_query);
    }

    #[test]
    fn resize_query() {
        let directive = ResizeDirective::Resize {
            width: 150,
            height: 150,
            gravity: None,
        };
        assert_eq!(build(BASE, &directive), "http://tachy.on/u/tachyon.jpg?resize=150,150");
    }

    #[test]
    fn anchored_resize_appends_gravity() {
        let directive = ResizeDirective::Resize {
            width: 1200,
            height: 400,
            gravity: Some(Gravity::North),
        };
        assert_eq!(
            build(BASE, &directive),
            "http://tachy.on/u/tachyon.jpg?resize=1200,400&gravity=north"
        );
    }

    #[test]
    fn fit_query() {
        let directive = ResizeDirective::Fit {
            width: 300,
            height: 169,
        };
        assert_eq!(build(BASE, &directive), "http://tachy.on/u/tachyon.jpg?fit=300,169");
    }

    #[test]
    fn scale_queries() {
        assert_eq!(
            build(BASE, &ResizeDirective::ScaleWidth(768)),
            "http://tachy.on/u/tachyon.jpg?w=768"
        );
        assert_eq!(
            build(BASE, &ResizeDirective::ScaleHeight(432)),
            "http://tachy.on/u/tachyon.jpg?h=432"
        );
        assert_eq!(
            build(
                BASE,
                &ResizeDirective::ScaleBoth {
                    width: 1024,
                    height: 575
                }
            ),
            "http://tachy.on/u/tachyon.jpg?w=1024&h=575"
        );
    }

    #[test]
    fn keeps_existing_query_and_fragment() {
        let directive = ResizeDirective::ScaleWidth(768);
        assert_eq!(
            build("http://tachy.on/u/a.jpg?ver=5.3#hero", &directive),
            "http://tachy.on/u/a.jpg?ver=5.3&w=768#hero"
        );
        assert_eq!(
            build("http://tachy.on/u/a.jpg?", &directive),
            "http://tachy.on/u/a.jpg?w=768"
        );
    }

    #[test]
    fn urls_trim_trailing_slashes() {
        let urls = Urls::new("http://example.org/wp-content/uploads/", "http://tachy.on/u/");
        assert_eq!(urls.upload_url(), "http://example.org/wp-content/uploads");
        assert_eq!(urls.cdn_url_for("tachyon-large-scaled.jpg"), "http://tachy.on/u/tachyon-large-scaled.jpg");
        assert_eq!(urls.cdn_url_for("/2020/01/a.jpg"), "http://tachy.on/u/2020/01/a.jpg");
    }

    #[test]
    fn cdn_url_for_accepts_absolute_upload_url() {
        let urls = Urls::new("http://example.org/wp-content/uploads", "http://tachy.on/u");
        assert_eq!(
            urls.cdn_url_for("https://example.org/wp-content/uploads/2020/01/a-scaled.jpg"),
            "http://tachy.on/u/2020/01/a-scaled.jpg"
        );
    }

    #[test]
    fn relative_upload_path_requires_uploads_prefix() {
        let urls = Urls::new("http://example.org/wp-content/uploads", "http://tachy.on/u");
        assert_eq!(
            urls.relative_upload_path("//example.org/wp-content/uploads/tachyon-150x150.jpg"),
            Some("tachyon-150x150.jpg")
        );
        assert_eq!(urls.relative_upload_path("http://example.org/wp-content/uploads"), None);
        assert_eq!(urls.relative_upload_path("http://example.org/wp-content/uploadsx/a.jpg"), None);
        assert_eq!(urls.relative_upload_path("http://other.org/wp-content/uploads/a.jpg"), None);
    }

    #[test]
    fn build_uses_master_file() {
        let urls = Urls::new("http://example.org/wp-content/uploads", "http://tachy.on/u");
        let directive = ResizeDirective::Fit {
            width: 1778,
            height: 1000,
        };
        assert_eq!(
            urls.build("tachyon-large-scaled.jpg", &directive),
            "http://tachy.on/u/tachyon-large-scaled.jpg?fit=1778,1000"
        );
    }
}
