//! Protocol layer: wire framing and connection handshake.

pub mod handshake;
pub mod wire_format;

pub use wire_format::{
    build_frame, Header, ReplyCode, BIND_METHOD_ID, HEADER_SIZE, MAX_MESSAGE_SIZE, RUN_COMMAND_ID,
};
