//! Codec - payload serialization for frame bodies.
//!
//! Frame payloads are protobuf messages; [`ProtoCodec`] adapts prost's
//! encode/decode for the call executor. It is a marker struct with static
//! methods, so the codec is selected at compile time per call site.

use prost::Message;

/// Protobuf codec for frame payloads.
pub struct ProtoCodec;

impl ProtoCodec {
    /// Encode a message to its wire bytes.
    #[inline]
    pub fn encode<M: Message>(message: &M) -> Vec<u8> {
        message.encode_to_vec()
    }

    /// Decode a message from wire bytes.
    ///
    /// # Errors
    ///
    /// Returns the prost error if the bytes are not a valid encoding of `M`.
    #[inline]
    pub fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M, prost::DecodeError> {
        M::decode(bytes)
    }
}
