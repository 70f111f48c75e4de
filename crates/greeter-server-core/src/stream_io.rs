//! Async message read/write helpers for TLS streams.
//!
//! A connection carries a sequence of calls: the server reads one
//! `CallRequest` frame, writes one `CallResponse` frame, and repeats until
//! the client closes its side.

use bytes::BytesMut;
use greeter_proto::codec;
use greeter_proto::ProtoError;
use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, ServerError};

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
        .map_err(|e| ServerError::StreamIo(format!("write: {e}")))?;
    send.flush()
        .await
        .map_err(|e| ServerError::StreamIo(format!("flush: {e}")))?;
    Ok(())
}

/// Read the next framed protobuf message.
///
/// Returns `Ok(None)` when the peer closes cleanly between frames, and an
/// error if it closes in the middle of one.
pub async fn read_message<R, M>(recv: &mut R, buf: &mut BytesMut) -> Result<Option<M>>
where
    R: AsyncRead + Unpin,
    M: Message + Default,
{
    loop {
        if let Some(msg) = codec::decode_from(buf)? {
            return Ok(Some(msg));
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
            .map_err(|e| ServerError::StreamIo(format!("read: {e}")))?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(ServerError::StreamIo(format!(
                "peer closed mid-frame with {} bytes buffered",
                buf.len()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeter_proto::wire::{CallRequest, HelloRequest};

    fn call(name: &str) -> CallRequest {
        CallRequest::new(
            "/helloworld.Greeter/SayHello",
            &HelloRequest {
                name: name.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn reads_consecutive_frames_then_clean_eof() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        write_message(&mut a, &call("first")).await.unwrap();
        write_message(&mut a, &call("second")).await.unwrap();
        drop(a);

        let mut buf = BytesMut::new();
        let first: CallRequest = read_message(&mut b, &mut buf).await.unwrap().unwrap();
        let second: CallRequest = read_message(&mut b, &mut buf).await.unwrap().unwrap();
        let end = read_message::<_, CallRequest>(&mut b, &mut buf).await.unwrap();

        assert_eq!(first.decode_payload::<HelloRequest>().unwrap().name, "first");
        assert_eq!(second.decode_payload::<HelloRequest>().unwrap().name, "second");
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn truncated_frame_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        let encoded = codec::encode_length_delimited(&call("world")).unwrap();
        a.write_all(&encoded[..encoded.len() - 1]).await.unwrap();
        drop(a);

        let mut buf = BytesMut::new();
        let result = read_message::<_, CallRequest>(&mut b, &mut buf).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn endless_length_prefix_is_rejected_before_eof() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        let writer = tokio::spawn(async move {
            // Fails once the reader gives up and drops its end.
            let _ = a.write_all(&vec![0xff; 256 * 1024]).await;
        });

        let mut buf = BytesMut::new();
        let err = read_message::<_, CallRequest>(&mut b, &mut buf).await.unwrap_err();
        assert!(matches!(err, ServerError::Protocol(_)), "got {err:?}");
        assert!(buf.len() < codec::MAX_FRAME_LEN);

        drop(b);
        writer.await.unwrap();
    }
}
