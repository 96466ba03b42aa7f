//! Length-prefixed framing.
//!
//! Wire format: `[4-byte length as u32 big-endian] + [JSON payload]`.
//! The same helpers serve both sides of a connection, plaintext or TLS.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted from a peer (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A bidirectional byte stream a connection can run over.
pub trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// Writes one frame and flushes.
pub async fn write_frame<W>(stream: &mut W, data: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if data.len() > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Frame too large: {} bytes (max {} bytes)",
                data.len(),
                MAX_FRAME_SIZE
            ),
        ));
    }
    let len = data.len() as u32;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(data).await?;
    stream.flush().await
}

/// Reads one frame.
///
/// Returns `Ok(None)` when the peer closed the stream cleanly before a new
/// frame began.
pub async fn read_frame<R>(stream: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Frame too large: {len} bytes (max {MAX_FRAME_SIZE} bytes)"),
        ));
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(Some(buf))
}
