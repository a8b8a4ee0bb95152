//! Connection handshake.
//!
//! Before any RPC traffic, the client sends an 8-byte ASCII magic followed
//! by a 4-byte little-endian protocol version, and the server answers with
//! its own magic and version. Both versions must equal 1; any mismatch or
//! I/O failure aborts the connection (the caller closes the transport).
//!
//! This exchange happens exactly once per session activation, synchronously.

use crate::error::RpcError;
use crate::transport::Transport;

/// Magic sent by the client to open a session.
pub const REQUEST_MAGIC: &[u8; 8] = b"DFHack?\n";

/// Magic the server must answer with.
pub const RESPONSE_MAGIC: &[u8; 8] = b"DFHack!\n";

/// Protocol version, fixed at 1 on both sides.
pub const PROTOCOL_VERSION: i32 = 1;

/// Total handshake message size: magic + version.
pub const HANDSHAKE_SIZE: usize = 12;

/// Encode the client's handshake request.
pub fn request() -> [u8; HANDSHAKE_SIZE] {
    let mut buf = [0u8; HANDSHAKE_SIZE];
    buf[..8].copy_from_slice(REQUEST_MAGIC);
    buf[8..].copy_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    buf
}

/// Verify the server's handshake response.
pub fn verify_response(buf: &[u8; HANDSHAKE_SIZE]) -> Result<(), RpcError> {
    if &buf[..8] != RESPONSE_MAGIC {
        return Err(RpcError::Handshake(format!(
            "unexpected magic {:?}",
            String::from_utf8_lossy(&buf[..8])
        )));
    }
    let version = i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    if version != PROTOCOL_VERSION {
        return Err(RpcError::Handshake(format!(
            "unsupported protocol version {version}"
        )));
    }
    Ok(())
}

/// Run the handshake over a freshly connected transport.
///
/// On error the transport is left as-is; the caller is responsible for
/// closing it and keeping the session inactive.
pub fn perform(transport: &mut Transport) -> Result<(), RpcError> {
    transport.send(&request())?;

    let mut response = [0u8; HANDSHAKE_SIZE];
    transport.read_exact(&mut response)?;

    verify_response(&response)
}
