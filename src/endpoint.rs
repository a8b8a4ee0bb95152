//! Remote function endpoints.
//!
//! A [`RemoteFunction`] pairs a method name (plus optional plugin
//! namespace) with its input and output message types and, once bound, the
//! integer ID the server assigned to it. Endpoints hold no I/O resources,
//! only the ID and the generation token of the session that bound them, so
//! they are cheap to keep around for the lifetime of a session.
//!
//! An endpoint bound under one session must never be reused against a
//! later one; [`RemoteClient`](crate::RemoteClient) checks the generation
//! token on every call and rejects stale endpoints instead of silently
//! rebinding them.

use std::marker::PhantomData;

use prost::Message;

use crate::messages::MessageName;

/// ID value of an endpoint that has not been bound yet.
pub const UNBOUND_ID: i16 = -1;

/// A typed remote procedure endpoint.
///
/// `I` and `O` fix the input and output message types at compile time; the
/// bind request quotes their fully-qualified protobuf names so the server
/// can verify the pairing.
#[derive(Debug, Clone)]
pub struct RemoteFunction<I, O> {
    /// Method name, set when bound.
    pub(crate) name: String,
    /// Plugin namespace; empty for core methods.
    pub(crate) plugin: String,
    /// Server-assigned method ID; [`UNBOUND_ID`] until bound.
    pub(crate) id: i16,
    /// Generation token of the session that bound this endpoint.
    pub(crate) session: u64,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> RemoteFunction<I, O>
where
    I: Message + MessageName + Default,
    O: Message + MessageName + Default,
{
    /// Create a new unbound endpoint.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            plugin: String::new(),
            id: UNBOUND_ID,
            session: 0,
            _marker: PhantomData,
        }
    }

    /// Create an endpoint pre-bound to a reserved ID.
    ///
    /// Only the two bootstrap methods (BindMethod, RunCommand) use this;
    /// everything else goes through the dynamic bind path.
    pub(crate) fn with_id(name: &str, id: i16, session: u64) -> Self {
        Self {
            name: name.to_string(),
            plugin: String::new(),
            id,
            session,
            _marker: PhantomData,
        }
    }

    /// Whether this endpoint has a server-assigned ID.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.id >= 0
    }

    /// The method name this endpoint was bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin namespace this endpoint was bound under.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// The server-assigned ID, or [`UNBOUND_ID`].
    #[inline]
    pub fn id(&self) -> i16 {
        self.id
    }

    /// Whether the existing binding matches the given identity.
    pub(crate) fn matches(&self, session: u64, name: &str, plugin: &str) -> bool {
        self.session == session && self.name == name && self.plugin == plugin
    }
}

impl<I, O> Default for RemoteFunction<I, O>
where
    I: Message + MessageName + Default,
    O: Message + MessageName + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
