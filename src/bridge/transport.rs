//! Frames exchanged with the debugger bridge over its stdio pipes
//!
//! A frame is the JSON body preceded by its byte count as a little-endian
//! `u32`. Nothing else travels on the pipes.

use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Largest accepted frame body; `image dump` style output can be big
const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Write one frame to the bridge
pub async fn send_message<W: AsyncWriteExt + Unpin>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    if data.len() > MAX_FRAME_LEN as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "bridge request of {} bytes exceeds the {} byte frame limit",
                data.len(),
                MAX_FRAME_LEN
            ),
        ));
    }

    let len = data.len() as u32;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame from the bridge
pub async fn recv_message<R: AsyncReadExt + Unpin>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf);

    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "bridge announced a {} byte frame, limit is {} bytes",
                len, MAX_FRAME_LEN
            ),
        ));
    }

    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data).await?;
    Ok(data)
}
