//! TCP connection to the instrument
//!
//! The control software accepts a single remote client at a time. Connection
//! failures carry operator guidance since the usual causes are on the
//! instrument side (software not running, remote connections blocked, wrong
//! port).

use super::ConnectionParams;
use imctl_core::{ConnectionError, Result};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Open a TCP connection to the instrument
pub async fn connect(params: &ConnectionParams) -> Result<TcpStream> {
    if params.host.trim().is_empty() || params.port == 0 {
        return Err(ConnectionError::InvalidAddress {
            address: format!("{}:{}", params.host, params.port),
        }
        .into());
    }

    let address = params.address();
    tracing::debug!(
        "Connecting to {} ({} dialect, timeout {}ms)",
        address,
        params.dialect,
        params.connect_timeout_ms
    );

    let stream = match timeout(params.connect_timeout(), TcpStream::connect(&address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::error!("Failed to connect to {}: {}", address, e);
            return Err(ConnectionError::ConnectFailed {
                address,
                reason: e.to_string(),
            }
            .into());
        }
        Err(_) => {
            tracing::error!("Connection to {} timed out", address);
            return Err(ConnectionError::ConnectionTimeout {
                address,
                timeout_ms: params.connect_timeout_ms,
            }
            .into());
        }
    };

    stream
        .set_nodelay(true)
        .map_err(|e| ConnectionError::Io {
            reason: e.to_string(),
        })?;

    tracing::info!("Connected to instrument at {}", address);
    Ok(stream)
}
