use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use onos_exporter_api::pprof::Profile;
use prost::Message;
use tracing::debug;

use crate::error::{ExporterError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Retrieves raw profile payloads.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the payload at `url` into a new file under `scratch` and
    /// return its path.
    async fn fetch(&self, url: &str, scratch: &Path) -> Result<PathBuf>;
}

/// Fetches profiles from pprof HTTP endpoints.
///
/// No request timeout is set: cpu profiles block for the sampling duration.
/// Debug endpoints are reached directly, ignoring proxy environment variables.
#[derive(Debug, Clone)]
pub struct HttpProfileSource {
    client: reqwest::Client,
}

impl HttpProfileSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| ExporterError::backend(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch(&self, url: &str, scratch: &Path) -> Result<PathBuf> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::backend(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let mut file = tempfile::Builder::new()
            .prefix("profile-")
            .suffix(".pb.gz")
            .tempfile_in(scratch)?;

        let mut size = 0;
        while let Some(chunk) = response.chunk().await? {
            size += chunk.len();
            file.write_all(&chunk)?;
        }
        file.flush()?;

        debug!(url = %url, bytes = size, "Fetched profile");

        let (_, path) = file.keep().map_err(|e| e.error)?;
        Ok(path)
    }
}

/// Read and decode a spooled profile.
pub async fn read_profile(path: &Path) -> Result<Profile> {
    let raw = tokio::fs::read(path).await?;
    decode_profile(&raw)
}

/// Decode a profile, gunzipping it first if compressed.
pub fn decode_profile(raw: &[u8]) -> Result<Profile> {
    if raw.starts_with(&GZIP_MAGIC) {
        let mut bytes = Vec::new();
        GzDecoder::new(raw)
            .read_to_end(&mut bytes)
            .map_err(|e| ExporterError::profile(format!("invalid gzip stream: {}", e)))?;
        Ok(Profile::decode(bytes.as_slice())?)
    } else {
        Ok(Profile::decode(raw)?)
    }
}
