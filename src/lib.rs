//! # dfremote
//!
//! Blocking Rust client for the DFHack remote RPC protocol.
//!
//! The server exposes callable functions over a length-prefixed binary
//! protocol on a local TCP port. After a magic-string handshake, every
//! frame is an 8-byte header (method or reply ID plus payload size)
//! followed by a protobuf payload. Method names are resolved to integer
//! IDs through the reserved BindMethod call; the server may interleave
//! text notifications with a call's terminal result or failure.
//!
//! ## Architecture
//!
//! - **Wire codec** ([`protocol`]): header framing, reply codes, handshake.
//! - **Transport** ([`transport`]): blocking TCP with exact-size reads.
//! - **Payload codec** ([`codec`], [`messages`]): protobuf via `prost`.
//! - **Session** ([`RemoteClient`]): connection lifecycle, binding,
//!   call execution, suspend/resume.
//!
//! The client is deliberately synchronous: one session, one socket, one
//! call in flight at a time.
//!
//! ## Example
//!
//! ```ignore
//! use dfremote::{RemoteClient, RemoteFunction};
//! use dfremote::messages::{EmptyMessage, StringMessage};
//!
//! let mut client = RemoteClient::new();
//! client.connect(None)?;
//!
//! let mut get_version: RemoteFunction<EmptyMessage, StringMessage> = RemoteFunction::new();
//! client.bind(&mut get_version, "GetVersion", "")?;
//! let version = client.call(&get_version, &EmptyMessage::default())?;
//!
//! client.run_command("reveal", &["hell"])?;
//! client.disconnect();
//! ```

pub mod codec;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod sink;
pub mod transport;

mod client;
mod endpoint;

pub use client::{default_port, RemoteClient, Suspender, DEFAULT_PORT};
pub use endpoint::{RemoteFunction, UNBOUND_ID};
pub use error::{CommandError, RpcError};
pub use sink::{LogSink, MemorySink, TextSink};
