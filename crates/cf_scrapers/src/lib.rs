pub mod browser;
pub mod text;

pub use browser::BrowserSource;
pub use text::extract_body_text;

pub mod prelude {
    pub use super::browser::BrowserSource;
    pub use cf_core::{ContentSource, PageCapture, Result, Error};
}

/// Common utilities for content sources
pub(crate) mod utils {
    use cf_core::{Error, Result};
    use url::Url;

    pub fn parse_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" | "file" => Ok(parsed),
            other => Err(Error::InvalidUrl(format!("unsupported scheme '{}' in {}", other, url))),
        }
    }
}
