//! PDF asset URL resolution

use tracing::debug;
use url::Url;

/// Resolve a bank's `pdfUrl` against the API base URL
///
/// - `http…` URLs are used as they are
/// - `/uploads/x.pdf` is appended to the base URL
/// - `uploads/x.pdf` is appended after a `/`
///
/// Absent, blank or unparsable values yield `None`, in which case the
/// overlay is rendered without background.
pub fn resolve_pdf_url(base: &Url, pdf_url: Option<&str>) -> Option<Url> {
    let pdf_url = pdf_url.map(str::trim).filter(|u| !u.is_empty())?;
    let base = base.as_str().trim_end_matches('/');

    let candidate = if pdf_url.starts_with("http") {
        pdf_url.to_string()
    } else if pdf_url.starts_with('/') {
        format!("{base}{pdf_url}")
    } else {
        format!("{base}/{pdf_url}")
    };

    match Url::parse(&candidate) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(pdf_url, error = %e, "unusable PDF URL");
            None
        }
    }
}
