//! Error types for dfremote.

use thiserror::Error;

/// Errors raised while establishing or tearing down a connection.
#[derive(Debug, Error)]
pub enum RpcError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Handshake response did not match the expected magic or version.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// `connect` called while a session is already active.
    #[error("session already connected")]
    AlreadyConnected,
}

/// Result type alias for connection-level operations.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Per-call failure, mirroring the server's `command_result` codes.
///
/// Every call returns either a decoded output message or one of these.
/// Wire-level and decode-level problems all collapse to [`LinkFailure`]
/// at the call boundary; the session object itself survives and can be
/// reconnected explicitly.
///
/// [`LinkFailure`]: CommandError::LinkFailure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// I/O, framing, or protocol violation during the call.
    #[error("RPC link failure")]
    LinkFailure,

    /// Interactive-only command attempted without a console.
    #[error("command needs an interactive console")]
    NeedsConsole,

    /// Unbound endpoint, inactive session, or unknown server method.
    #[error("command not implemented")]
    NotImplemented,

    /// Generic server-side failure.
    #[error("command failed")]
    Failure,

    /// Bad arguments or state on the server.
    #[error("wrong command usage")]
    WrongUsage,

    /// Target object absent on the server.
    #[error("target not found")]
    NotFound,

    /// A FAIL code this client does not recognize, preserved verbatim.
    #[error("unknown result code {0}")]
    Unknown(i32),
}

impl CommandError {
    /// Map a wire result code to an error.
    ///
    /// Code 0 is nominally OK, but a FAIL frame carrying it still means the
    /// call failed; it normalizes to [`CommandError::Failure`]. Codes the
    /// client does not know are preserved verbatim as [`CommandError::Unknown`].
    pub fn from_code(code: i32) -> Self {
        match code {
            -3 => CommandError::LinkFailure,
            -2 => CommandError::NeedsConsole,
            -1 => CommandError::NotImplemented,
            0 | 1 => CommandError::Failure,
            2 => CommandError::WrongUsage,
            3 => CommandError::NotFound,
            other => CommandError::Unknown(other),
        }
    }

    /// The wire representation of this error.
    pub fn code(&self) -> i32 {
        match self {
            CommandError::LinkFailure => -3,
            CommandError::NeedsConsole => -2,
            CommandError::NotImplemented => -1,
            CommandError::Failure => 1,
            CommandError::WrongUsage => 2,
            CommandError::NotFound => 3,
            CommandError::Unknown(code) => *code,
        }
    }
}
