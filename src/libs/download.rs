//! Streaming artifact download into a fresh temporary file.
//!
//! The body is written through a bounded buffer as it arrives, so memory use
//! does not grow with the artifact size. The returned [`NamedTempFile`]
//! deletes itself when dropped; a caller that wants to keep the file has to
//! persist it explicitly.

use super::error::{UpdateError, UpdateResult};
use futures_util::StreamExt;
use reqwest::Client;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Write buffer size for streamed downloads.
pub const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    /// From `Content-Length`, when the server sent one.
    pub total: Option<u64>,
}

impl DownloadProgress {
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        Some((self.downloaded.saturating_mul(100) / total).min(100) as u8)
    }
}

pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` into a new temp file in `dir` (OS temp dir when `None`).
    ///
    /// `on_progress` is called after every chunk. Any error drops the temp
    /// file, which removes it from disk.
    pub async fn download<F>(&self, url: &str, dir: Option<&Path>, mut on_progress: F) -> UpdateResult<NamedTempFile>
    where
        F: FnMut(DownloadProgress),
    {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Api {
                status: status.as_u16(),
                message: format!("GET {} returned {}", url, status),
            });
        }

        let total = response.content_length();
        let mut temp = create_temp(dir)?;
        let temp_path = temp.path().to_path_buf();
        tracing::debug!(url, path = %temp_path.display(), total = ?total, "streaming download");

        let mut downloaded: u64 = 0;
        {
            let mut writer = BufWriter::with_capacity(CHUNK_SIZE, temp.as_file_mut());
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| UpdateError::Network(format!("download of {} interrupted: {}", url, e)))?;
                writer.write_all(&chunk).map_err(|e| UpdateError::fs(&temp_path, e))?;
                downloaded += chunk.len() as u64;
                on_progress(DownloadProgress { downloaded, total });
            }
            writer.flush().map_err(|e| UpdateError::fs(&temp_path, e))?;
        }
        temp.as_file().sync_all().map_err(|e| UpdateError::fs(&temp_path, e))?;

        if let Some(expected) = total {
            if downloaded != expected {
                return Err(UpdateError::Network(format!(
                    "download of {} ended after {} of {} bytes",
                    url, downloaded, expected
                )));
            }
        }

        Ok(temp)
    }
}

fn create_temp(dir: Option<&Path>) -> UpdateResult<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix("upkeep-").suffix(".download");
    match dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| UpdateError::fs(dir, e))?;
            builder.tempfile_in(dir).map_err(|e| UpdateError::fs(dir, e))
        }
        None => builder.tempfile().map_err(|e| UpdateError::fs(std::env::temp_dir(), e)),
    }
}
