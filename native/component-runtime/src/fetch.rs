//! Fetch-by-URL contract used to retrieve template text.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use url::Url;
use walkdir::WalkDir;

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok_with(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: String::new(),
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait TemplateFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError>;
}

/// Serves `file://` URLs from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl TemplateFetcher for FsFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError> {
        let path = url.to_file_path().map_err(|_| TransportError {
            url: url.to_string(),
            message: "only file:// URLs are supported".to_string(),
        })?;

        match fs::read_to_string(&path) {
            Ok(body) => Ok(FetchResponse::ok_with(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FetchResponse::not_found()),
            Err(e) => Err(TransportError {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-memory URL table. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, FetchResponse>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &Url, body: impl Into<String>) {
        self.insert_response(url, FetchResponse::ok_with(body));
    }

    pub fn insert_response(&mut self, url: &Url, response: FetchResponse) {
        self.responses.insert(url.to_string(), response);
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.responses.keys().map(String::as_str)
    }

    /// Preload every `*.html` file below `dir` under its `file://` URL.
    /// Unreadable entries are skipped.
    pub fn discover(dir: impl AsRef<Path>) -> Self {
        let mut fetcher = Self::new();
        let dir = dir.as_ref();

        let root = match dir.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Template directory is not accessible");
                return fetcher;
            }
        };

        for entry in WalkDir::new(&root).follow_links(true).into_iter().flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "html") {
                continue;
            }
            let Ok(url) = Url::from_file_path(path) else {
                continue;
            };
            match fs::read_to_string(path) {
                Ok(body) => fetcher.insert(&url, body),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read template");
                }
            }
        }

        tracing::debug!(root = %root.display(), templates = fetcher.len(), "Discovered templates");
        fetcher
    }
}

impl TemplateFetcher for MemoryFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError> {
        Ok(self
            .responses
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(FetchResponse::not_found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_fetcher_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Card.html");
        fs::write(&path, "<p>card</p>").unwrap();

        let found = FsFetcher.fetch(&Url::from_file_path(&path).unwrap()).unwrap();
        assert!(found.ok());
        assert_eq!(found.body, "<p>card</p>");

        let missing_url = Url::from_file_path(dir.path().join("Nope.html")).unwrap();
        assert_eq!(FsFetcher.fetch(&missing_url).unwrap().status, 404);
    }

    #[test]
    fn test_fs_fetcher_rejects_remote_urls() {
        let url = Url::parse("https://example.com/Card.html").unwrap();
        assert!(FsFetcher.fetch(&url).is_err());
    }

    #[test]
    fn test_discover_collects_html_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Card")).unwrap();
        fs::write(dir.path().join("Card/Card.html"), "<p>card</p>").unwrap();
        fs::write(dir.path().join("Card/Card.js"), "export {}").unwrap();

        let fetcher = MemoryFetcher::discover(dir.path());
        assert_eq!(fetcher.len(), 1);

        let url = Url::from_file_path(dir.path().canonicalize().unwrap().join("Card/Card.html"))
            .unwrap();
        assert_eq!(fetcher.fetch(&url).unwrap().body, "<p>card</p>");
    }

    #[test]
    fn test_discover_missing_directory_is_empty() {
        let fetcher = MemoryFetcher::discover("/definitely/not/here");
        assert!(fetcher.is_empty());
    }
}
