use std::path::Path;

use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{ServerError, ServerResult};

/// SHA-1 validated single-file downloader for server jars.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download a single file to `dest`, optionally validating SHA-1.
    ///
    /// Creates parent directories as needed. The hash is computed on the
    /// in-memory buffer before anything touches the disk.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> ServerResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ServerError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        info!("Downloading {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServerError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        if let Some(expected) = sha1_expected {
            let mut hasher = Sha1::new();
            hasher.update(&bytes);
            let actual = hex::encode(hasher.finalize());
            if actual != expected {
                return Err(ServerError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| ServerError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
        file.write_all(&bytes)
            .await
            .map_err(|source| ServerError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
        file.flush().await.map_err(|source| ServerError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, bytes.len());
        Ok(())
    }

    /// Validate an existing file's SHA-1.
    pub async fn validate_sha1(path: &Path, expected: &str) -> ServerResult<bool> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ServerError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let mut hasher = Sha1::new();
        hasher.update(&bytes);
        let actual = hex::encode(hasher.finalize());
        Ok(actual == expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn validate_sha1_matches_known_digest() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        // sha1("hello")
        let expected = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
        assert!(Downloader::validate_sha1(&path, expected).await.unwrap());
        assert!(!Downloader::validate_sha1(&path, "0000000000000000000000000000000000000000")
            .await
            .unwrap());
    }
}
