//! Media URL resolution.
//!
//! Image columns store paths relative to the media root (`products/x.jpg`).
//! Files are served by a CDN or reverse proxy; this only builds the URLs.

/// Resolves stored media paths against the public media base URL.
#[derive(Debug, Clone)]
pub struct MediaUrls {
    base: String,
}

impl MediaUrls {
    /// Create a resolver for the given base URL.
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Absolute URL for a stored path; `None` for missing or blank paths.
    ///
    /// Paths that are already absolute URLs pass through unchanged.
    #[must_use]
    pub fn resolve(&self, path: Option<&str>) -> Option<String> {
        let path = path.map(str::trim).filter(|p| !p.is_empty())?;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_owned());
        }
        Some(format!("{}/{}", self.base, path.trim_start_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let media = MediaUrls::new("https://cdn.gadzilla.test/media/");
        assert_eq!(
            media.resolve(Some("products/phone.jpg")).as_deref(),
            Some("https://cdn.gadzilla.test/media/products/phone.jpg")
        );
        assert_eq!(
            media.resolve(Some("/products/phone.jpg")).as_deref(),
            Some("https://cdn.gadzilla.test/media/products/phone.jpg")
        );
    }

    #[test]
    fn test_resolve_absolute_and_empty() {
        let media = MediaUrls::new("https://cdn.gadzilla.test/media");
        assert_eq!(
            media.resolve(Some("https://img.test/a.png")).as_deref(),
            Some("https://img.test/a.png")
        );
        assert_eq!(media.resolve(Some("  ")), None);
        assert_eq!(media.resolve(None), None);
    }
}
