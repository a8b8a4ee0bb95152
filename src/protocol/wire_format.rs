//! Wire format encoding and decoding.
//!
//! Implements the 8-byte message header:
//! ```text
//! ┌──────────┬──────────┬──────────┐
//! │ ID       │ Reserved │ Size     │
//! │ 2 bytes  │ 2 bytes  │ 4 bytes  │
//! │ int16 LE │ (zero)   │ int32 LE │
//! └──────────┴──────────┴──────────┘
//! ```
//!
//! All multi-byte integers are Little Endian. The `id` field carries either
//! a non-negative method ID (for requests) or a negative [`ReplyCode`]
//! (for replies). `size` is the payload length that follows the header,
//! except for FAIL replies, where the server reuses the field to carry the
//! error code and no payload follows.

use bytes::{Buf, BufMut};

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Maximum payload size accepted in either direction (64 MiB).
pub const MAX_MESSAGE_SIZE: i32 = 64 * 1024 * 1024;

/// Reserved method ID for the bootstrap BindMethod call.
pub const BIND_METHOD_ID: i16 = 0;

/// Reserved method ID for RunCommand.
pub const RUN_COMMAND_ID: i16 = 1;

/// Reply codes sent by the server, disjoint from non-negative method IDs.
///
/// `Quit` is the one code that travels client to server: a zero-size QUIT
/// frame announces the client is about to close the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum ReplyCode {
    /// Terminal success frame; payload is the call's output message.
    Result = -1,
    /// Terminal failure frame; the size field holds the error code.
    Fail = -2,
    /// Interleaved text notification; payload is a CoreTextNotification.
    Text = -3,
    /// Client-to-server disconnect announcement.
    Quit = -4,
}

impl ReplyCode {
    /// Map a wire ID to a reply code, if it is one.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            -1 => Some(ReplyCode::Result),
            -2 => Some(ReplyCode::Fail),
            -3 => Some(ReplyCode::Text),
            -4 => Some(ReplyCode::Quit),
            _ => None,
        }
    }

    /// The wire representation of this code.
    #[inline]
    pub fn id(self) -> i16 {
        self as i16
    }
}

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Method ID (requests) or reply code (replies).
    pub id: i16,
    /// Payload length in bytes; error code for FAIL replies.
    pub size: i32,
}

impl Header {
    /// Create a new header.
    pub fn new(id: i16, size: i32) -> Self {
        Self { id, size }
    }

    /// Encode the header to bytes (Little Endian, reserved bytes zeroed).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode the header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is smaller than [`HEADER_SIZE`].
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        let mut dst = &mut buf[..HEADER_SIZE];
        dst.put_i16_le(self.id);
        dst.put_u16(0); // reserved
        dst.put_i32_le(self.size);
    }

    /// Decode a header from bytes.
    ///
    /// Returns `None` if the buffer is too short. The two reserved bytes
    /// are skipped without inspection.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        let mut src = &buf[..HEADER_SIZE];
        let id = src.get_i16_le();
        src.advance(2);
        let size = src.get_i32_le();
        Some(Self { id, size })
    }

    /// Check that the size field is a valid payload length.
    ///
    /// Not applicable to FAIL replies, where the field is an error code.
    #[inline]
    pub fn size_in_bounds(&self) -> bool {
        (0..=MAX_MESSAGE_SIZE).contains(&self.size)
    }

    /// The reply code carried by this header, if the ID is one.
    #[inline]
    pub fn reply_code(&self) -> Option<ReplyCode> {
        ReplyCode::from_id(self.id)
    }
}

/// Build a complete frame as a single byte vector.
///
/// Encodes the header and appends the payload into a contiguous buffer,
/// ready for a single send.
pub fn build_frame(header: &Header, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}
