//! Remote fetch into the content root.
//!
//! Downloads run without the registry lock held. Bytes are streamed into a
//! hidden temporary file next to the destination and renamed into place only
//! once the transfer has finished, so a failed, timed out or cancelled fetch
//! leaves neither a partial file nor a record behind.

use super::SharedRegistry;
use crate::config::FetchConfig;
use localfiles_common::paths::is_bare_file_name;
use localfiles_common::{AssetKey, Error, Result};
use percent_encoding::percent_decode_str;
use reqwest::{Client, Url};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Prefix of in-flight download files; scans ignore them.
const PARTIAL_PREFIX: &str = ".localfiles-partial-";

/// True for temporary files belonging to an unfinished download.
pub fn is_partial_download(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PARTIAL_PREFIX))
}

/// File name a URL will be stored under: its last non-empty path segment,
/// percent-decoded.
pub fn file_name_from_url(url: &Url) -> Result<String> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::invalid_input(format!("URL has no file name: {}", url)))?;

    let name = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| Error::invalid_input(format!("file name in URL is not UTF-8: {}", url)))?;

    // Checked after decoding so an encoded separator cannot slip through
    if !is_bare_file_name(&name) {
        return Err(Error::invalid_input(format!("bad file name in URL: {}", url)));
    }
    Ok(name.into_owned())
}

/// HTTP downloader for `fetch` commands.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("localfiles/{}", env!("CARGO_PKG_VERSION")));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self { client }
    }

    /// Download `url` into `target_dir`, returning the final path.
    pub async fn download(
        &self,
        url: &str,
        target_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let parsed =
            Url::parse(url).map_err(|e| Error::invalid_input(format!("{}: {}", url, e)))?;
        let file_name = file_name_from_url(&parsed)?;

        std::fs::create_dir_all(target_dir).map_err(|e| Error::storage(target_dir, e))?;
        let dest = target_dir.join(&file_name);
        tracing::info!("Downloading {} to {:?}", url, dest);

        let mut partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(target_dir)
            .map_err(|e| Error::storage(target_dir, e))?;

        {
            let transfer = async {
                let mut response = self
                    .client
                    .get(parsed.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| Error::transfer(format!("{}: {}", url, e)))?;

                let mut written: u64 = 0;
                while let Some(chunk) = response
                    .chunk()
                    .await
                    .map_err(|e| Error::transfer(format!("{}: {}", url, e)))?
                {
                    partial
                        .write_all(&chunk)
                        .map_err(|e| Error::storage(target_dir, e))?;
                    written += chunk.len() as u64;
                }
                Ok::<u64, Error>(written)
            };

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return Err(Error::transfer(format!("{}: cancelled", url)));
                }
                result = transfer => {
                    let written = result?;
                    tracing::debug!("Received {} bytes from {}", written, url);
                }
            }
        }

        partial
            .as_file()
            .sync_all()
            .map_err(|e| Error::storage(partial.path(), e))?;
        partial
            .persist(&dest)
            .map_err(|e| Error::storage(&dest, e.error))?;

        Ok(dest)
    }

    /// Download `url` and index the result, returning its key.
    ///
    /// `target_dir` defaults to the registry's content root.
    pub async fn fetch_into(
        &self,
        registry: &SharedRegistry,
        url: &str,
        target_dir: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<AssetKey> {
        let dir = match target_dir {
            Some(dir) => dir.to_path_buf(),
            None => registry.lock().root().to_path_buf(),
        };

        let path = self.download(url, &dir, cancel).await?;

        let mut registry = registry.lock();
        let key = registry.ingest_fetched(&path, url)?;
        tracing::info!("Fetched {} as key {}", url, key);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_segment() {
        let url = Url::parse("https://example.com/img/sign.png?size=large").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "sign.png");
    }

    #[test]
    fn file_name_is_percent_decoded() {
        let url = Url::parse("https://example.com/img/my%20sign.png").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "my sign.png");

        let url = Url::parse("https://example.com/caf%C3%A9.png").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "café.png");
    }

    #[test]
    fn encoded_separators_are_rejected() {
        for raw in [
            "https://example.com/img/..%2Fescape.png",
            "https://example.com/img/%2E%2E",
            "https://example.com/bad%FF.png",
        ] {
            let url = Url::parse(raw).unwrap();
            assert!(matches!(
                file_name_from_url(&url).unwrap_err(),
                Error::InvalidInput(_)
            ));
        }
    }

    #[test]
    fn url_without_file_name_is_rejected() {
        for raw in ["https://example.com/", "https://example.com/img/"] {
            let url = Url::parse(raw).unwrap();
            assert!(matches!(
                file_name_from_url(&url).unwrap_err(),
                Error::InvalidInput(_)
            ));
        }
    }

    #[test]
    fn partial_downloads_are_recognized() {
        assert!(is_partial_download(Path::new("/c/.localfiles-partial-abc")));
        assert!(!is_partial_download(Path::new("/c/a.png")));
    }
}
