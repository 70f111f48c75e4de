//! Async message read/write helpers for TLS streams.
//!
//! Messages are varint length-delimited protobuf frames (see
//! [`greeter_proto::codec`]). Reads accumulate into a caller-owned buffer so
//! bytes past the end of one frame are kept for the next.

use bytes::BytesMut;
use greeter_proto::codec;
use greeter_proto::ProtoError;
use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ClientError, Result};

const READ_CHUNK: usize = 4 * 1024;

/// Write one framed protobuf message and flush it to the peer.
pub async fn write_message<W, M>(send: &mut W, msg: &M) -> Result<()>
where
    W: AsyncWrite + Unpin,
    M: Message,
{
    let buf = codec::encode_length_delimited(msg)?;
    send.write_all(&buf)
        .await
        .map_err(|e| ClientError::StreamIo(format!("write: {e}")))?;
    send.flush()
        .await
        .map_err(|e| ClientError::StreamIo(format!("flush: {e}")))?;
    Ok(())
}

/// Read one framed protobuf message.
///
/// Fails with [`ClientError::ConnectionClosed`] if the peer closes the
/// stream before a whole frame has arrived.
pub async fn read_message<R, M>(recv: &mut R, buf: &mut BytesMut) -> Result<M>
where
    R: AsyncRead + Unpin,
    M: Message + Default,
{
    loop {
        if let Some(msg) = codec::decode_from(buf)? {
            return Ok(msg);
        }

        if buf.len() >= codec::MAX_FRAME_LEN {
            return Err(ProtoError::FrameTooLarge {
                len: buf.len(),
                max: codec::MAX_FRAME_LEN,
            }
            .into());
        }

        buf.reserve(READ_CHUNK);
        let n = recv
            .read_buf(buf)
            .await
            .map_err(|e| ClientError::StreamIo(format!("read: {e}")))?;
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
    }
}
