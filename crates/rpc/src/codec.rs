//! Length-prefixed, versioned framing for [`Message`] over any
//! `AsyncRead + AsyncWrite` transport.
//!
//! Each frame is `[4-byte big-endian length][1-byte protocol version][bincode
//! payload]`. The length prefix is handled by `tokio_util`'s
//! `LengthDelimitedCodec`; this codec only adds the version byte and the
//! bincode (de)serialization of [`Message`] (`spec.md` §4.4: "binary,
//! versioned" RPC schema).

use crate::error::{Error, Result};
use crate::protocol::{Message, PROTOCOL_VERSION};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Maximum encoded frame size: bounds a value's transport-level size
/// (`spec.md` §3: "upper bound set by transport limits").
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub struct MessageCodec {
    inner: LengthDelimitedCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .max_frame_length(MAX_FRAME_LEN)
                .new_codec(),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        let Some(mut frame) = self.inner.decode(src)? else {
            return Ok(None);
        };
        if frame.is_empty() {
            return Err(Error::Decode(Box::new(bincode::ErrorKind::Custom(
                "empty frame".into(),
            ))));
        }
        let version = frame.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(Error::VersionMismatch {
                got: version,
                expected: PROTOCOL_VERSION,
            });
        }
        let message = bincode::deserialize(&frame)?;
        Ok(Some(message))
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<()> {
        let payload = bincode::serialize(&message)?;
        let mut framed = BytesMut::with_capacity(payload.len() + 1);
        framed.put_u8(PROTOCOL_VERSION);
        framed.extend_from_slice(&payload);
        self.inner.encode(Bytes::from(framed), dst)?;
        Ok(())
    }
}
