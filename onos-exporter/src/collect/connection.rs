//! gRPC channel construction for collector targets.

use tonic::transport::{Channel, ClientTlsConfig, Endpoint, Identity};
use tracing::debug;

use crate::error::{ExporterError, Result};

/// Dial a backend.
///
/// With `insecure` the channel is plaintext. Otherwise TLS is used with the
/// platform trust roots, presenting a client identity when both PEM paths
/// are given. The returned channel is owned by the caller and closed on drop.
pub async fn connect(address: &str, cert_path: &str, key_path: &str, insecure: bool) -> Result<Channel> {
    let endpoint = endpoint(address, cert_path, key_path, insecure).await?;

    debug!(address = %address, insecure, "Connecting");
    let channel = endpoint.connect().await.map_err(|e| {
        ExporterError::connection(format!("failed to connect to {}: {}", address, e))
    })?;

    Ok(channel)
}

/// Build the endpoint without dialing it.
async fn endpoint(address: &str, cert_path: &str, key_path: &str, insecure: bool) -> Result<Endpoint> {
    if address.is_empty() {
        return Err(ExporterError::connection("empty address"));
    }

    let scheme = if insecure { "http" } else { "https" };
    let uri = format!("{}://{}", scheme, address);

    let mut endpoint = Endpoint::from_shared(uri)
        .map_err(|e| ExporterError::connection(format!("invalid address {}: {}", address, e)))?;

    if !insecure {
        let mut tls_config = ClientTlsConfig::new().with_native_roots();

        if !cert_path.is_empty() && !key_path.is_empty() {
            let cert = read_pem(cert_path).await?;
            let key = read_pem(key_path).await?;
            tls_config = tls_config.identity(Identity::from_pem(cert, key));
        }

        endpoint = endpoint.tls_config(tls_config)?;
    }

    Ok(endpoint)
}

async fn read_pem(path: &str) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ExporterError::connection(format!("failed to read {}: {}", path, e)))
}
