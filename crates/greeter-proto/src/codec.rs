//! Length-delimited protobuf framing for TLS streams.
//!
//! Each protobuf message is preceded by a varint-encoded length prefix.
//! This is the standard prost framing format.
//!
//! These functions are synchronous and work on byte slices. Async wrappers
//! that read/write TLS streams live in the transport crates.

use bytes::BytesMut;
use prost::Message;

use crate::error::{ProtoError, Result};

/// Maximum allowed message size (64 KiB). Greeter messages are small; this
/// bounds the allocation a hostile length prefix can cause.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Longest valid varint length prefix.
pub const MAX_VARINT_LEN: usize = 10;

/// Largest number of bytes one frame can occupy, prefix included. A read
/// buffer holding this much without yielding a frame is malformed.
pub const MAX_FRAME_LEN: usize = MAX_VARINT_LEN + MAX_MESSAGE_SIZE;

/// Encode a protobuf message with a varint length prefix.
///
/// Returns the encoded bytes: `[varint length][protobuf payload]`.
pub fn encode_length_delimited<M: Message>(msg: &M) -> Result<Vec<u8>> {
    let payload_len = msg.encoded_len();
    if payload_len > MAX_MESSAGE_SIZE {
        return Err(ProtoError::FrameTooLarge {
            len: payload_len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let varint_len = prost::length_delimiter_len(payload_len);
    let mut buf = Vec::with_capacity(varint_len + payload_len);
    prost::encode_length_delimiter(payload_len, &mut buf)?;
    msg.encode(&mut buf)?;
    Ok(buf)
}

/// Try to decode a length-delimited protobuf message from a buffer.
///
/// Returns `Ok(Some((message, bytes_consumed)))` if a complete message is
/// available, `Ok(None)` if the buffer doesn't contain a complete message
/// yet (need more data), or `Err` on malformed or oversize data.
pub fn decode_length_delimited<M: Message + Default>(buf: &[u8]) -> Result<Option<(M, usize)>> {
    let mut cursor = buf;

    let payload_len = match prost::decode_length_delimiter(&mut cursor) {
        Ok(len) => len,
        // A shorter prefix may still be completed by the next read.
        Err(_) if buf.len() < MAX_VARINT_LEN => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if payload_len > MAX_MESSAGE_SIZE {
        return Err(ProtoError::FrameTooLarge {
            len: payload_len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let varint_len = buf.len() - cursor.len();
    let total_needed = varint_len + payload_len;

    if buf.len() < total_needed {
        return Ok(None);
    }

    let msg = M::decode(&buf[varint_len..total_needed])?;
    Ok(Some((msg, total_needed)))
}

/// Decode one message from the front of `buf`, advancing past it.
///
/// Leaves `buf` untouched and returns `Ok(None)` if the frame is incomplete.
pub fn decode_from<M: Message + Default>(buf: &mut BytesMut) -> Result<Option<M>> {
    match decode_length_delimited(buf)? {
        Some((msg, consumed)) => {
            let _ = buf.split_to(consumed);
            Ok(Some(msg))
        }
        None => Ok(None),
    }
}
