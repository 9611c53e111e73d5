//! Length-prefixed framing
//!
//! Every message in either direction is a 4-byte big-endian unsigned length
//! followed by exactly that many payload bytes. The header is always derived
//! from the payload that is actually written.

use imctl_core::{ConnectionError, ProtocolError, Result};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the length header in bytes
pub const HEADER_LEN: usize = 4;

/// Largest payload accepted in either direction
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// Prefix a payload with its big-endian length header
pub fn encode_frame(payload: &[u8]) -> std::result::Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::FrameTooLarge {
            length: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read the declared header value of an encoded frame
pub fn frame_length(frame: &[u8]) -> Option<u32> {
    let header: [u8; HEADER_LEN] = frame.get(..HEADER_LEN)?.try_into().ok()?;
    Some(u32::from_be_bytes(header))
}

/// Write one frame and flush it
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await.map_err(io_error)?;
    writer.flush().await.map_err(io_error)?;
    tracing::trace!("Wrote frame of {} payload bytes", payload.len());
    Ok(())
}

/// Read exactly one frame and return its payload
///
/// Fails with [`ProtocolError::ShortHeader`] or [`ProtocolError::ShortPayload`]
/// when the stream ends before the frame is complete.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let received = read_full(reader, &mut header).await?;
    if received < HEADER_LEN {
        return Err(ProtocolError::ShortHeader { received }.into());
    }

    let length = u32::from_be_bytes(header) as usize;
    if length > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::FrameTooLarge {
            length,
            max: MAX_PAYLOAD_LEN,
        }
        .into());
    }

    let mut payload = vec![0u8; length];
    let received = read_full(reader, &mut payload).await?;
    if received < length {
        return Err(ProtocolError::ShortPayload {
            expected: length,
            received,
        }
        .into());
    }

    tracing::trace!("Read frame of {} payload bytes", length);
    Ok(payload)
}

/// Fill `buf` from the reader, stopping early only at end of stream
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_error(e).into()),
        }
    }
    Ok(filled)
}

fn io_error(e: io::Error) -> ConnectionError {
    match e.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => ConnectionError::ConnectionLost {
            reason: e.to_string(),
        },
        _ => ConnectionError::Io {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imctl_core::Error;

    #[test]
    fn test_encode_frame_header() {
        let frame = encode_frame(b"GotoZ(20.1)").unwrap();
        assert_eq!(&frame[..4], &[0, 0, 0, 11]);
        assert_eq!(&frame[4..], b"GotoZ(20.1)");
        assert_eq!(frame_length(&frame), Some(11));
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode_frame(b"").unwrap(), vec![0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_read_frame_across_partial_reads() {
        let (mut client, mut server) = tokio::io::duplex(2);
        let writer = tokio::spawn(async move {
            write_frame(&mut server, b"LiveModeActive()").await.unwrap();
        });

        let payload = read_frame(&mut client).await.unwrap();
        assert_eq!(payload, b"LiveModeActive()");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_short_header() {
        let mut data: &[u8] = &[0, 0];
        let err = read_frame(&mut data).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ShortHeader { received: 2 })
        ));
    }

    #[tokio::test]
    async fn test_short_payload() {
        let mut data: &[u8] = &[0, 0, 0, 10, b'a', b'b', b'c'];
        let err = read_frame(&mut data).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ShortPayload {
                expected: 10,
                received: 3
            })
        ));
    }

    #[tokio::test]
    async fn test_oversized_header_rejected() {
        let mut data: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let err = read_frame(&mut data).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::FrameTooLarge { .. })
        ));
    }
}
