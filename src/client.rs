//! Client session facade and call executor.
//!
//! [`RemoteClient`] owns the connection and drives the whole protocol:
//! activation (connect + handshake), name-to-ID binding through the
//! reserved BindMethod call, the framed request/response exchange for every
//! call, the RunCommand and suspend/resume conveniences, and teardown.
//!
//! The client is strictly synchronous: every call blocks until its terminal
//! frame (RESULT or FAIL) or an I/O error, and exactly one call is in
//! flight at a time. Callers needing concurrency serialize externally or
//! use one client per thread; the client itself holds no locks.
//!
//! # Example
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
//! println!("server version: {}", version.value);
//!
//! client.disconnect();
//! ```

use prost::Message;

use crate::codec::ProtoCodec;
use crate::endpoint::RemoteFunction;
use crate::error::{CommandError, RpcError};
use crate::messages::{
    CoreBindReply, CoreBindRequest, CoreRunCommandRequest, CoreTextNotification, EmptyMessage,
    IntMessage, MessageName,
};
use crate::protocol::{
    build_frame, handshake, Header, ReplyCode, BIND_METHOD_ID, HEADER_SIZE, MAX_MESSAGE_SIZE,
    RUN_COMMAND_ID,
};
use crate::sink::{LogSink, TextSink};
use crate::transport::Transport;

/// Port used when neither an argument nor the environment provides one.
pub const DEFAULT_PORT: u16 = 5000;

/// Resolve the server port from the `DFHACK_PORT` environment variable,
/// falling back to [`DEFAULT_PORT`] when unset, unparsable, or out of range.
pub fn default_port() -> u16 {
    match std::env::var("DFHACK_PORT")
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
    {
        Some(port) if (1..=i32::from(u16::MAX)).contains(&port) => port as u16,
        _ => DEFAULT_PORT,
    }
}

/// A client session against the remote RPC server.
///
/// Lifecycle: *disconnected → active → disconnected*. All operations other
/// than [`connect`](Self::connect) / [`disconnect`](Self::disconnect) fail
/// immediately while disconnected, without touching any socket.
pub struct RemoteClient {
    transport: Option<Transport>,
    /// Generation counter; bumped on every activation so endpoints bound by
    /// an earlier session are rejected instead of silently rebound.
    session: u64,
    sink: Box<dyn TextSink>,
    bind_call: RemoteFunction<CoreBindRequest, CoreBindReply>,
    runcmd_call: RemoteFunction<CoreRunCommandRequest, EmptyMessage>,
    suspend_ready: bool,
    suspend_call: RemoteFunction<EmptyMessage, IntMessage>,
    resume_call: RemoteFunction<EmptyMessage, IntMessage>,
}

impl RemoteClient {
    /// Create a disconnected client that logs server text via [`LogSink`].
    pub fn new() -> Self {
        Self::with_sink(Box::new(LogSink))
    }

    /// Create a disconnected client with a custom text-notification sink.
    pub fn with_sink(sink: Box<dyn TextSink>) -> Self {
        Self {
            transport: None,
            session: 0,
            sink,
            bind_call: RemoteFunction::new(),
            runcmd_call: RemoteFunction::new(),
            suspend_ready: false,
            suspend_call: RemoteFunction::new(),
            resume_call: RemoteFunction::new(),
        }
    }

    /// Whether the session currently has an active connection.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.transport.is_some()
    }

    /// Connect to the server on localhost and activate the session.
    ///
    /// The port is resolved as: explicit argument, then the `DFHACK_PORT`
    /// environment variable, then [`DEFAULT_PORT`]. Calling this on an
    /// already-active session is a precondition violation.
    ///
    /// On any failure the socket is closed and the session stays inactive.
    pub fn connect(&mut self, port: Option<u16>) -> Result<(), RpcError> {
        debug_assert!(!self.is_active(), "connect called on an active session");
        if self.is_active() {
            return Err(RpcError::AlreadyConnected);
        }

        let port = port.unwrap_or_else(default_port);
        let transport = Transport::connect("localhost", port).map_err(|e| {
            tracing::error!("could not connect to localhost:{port}: {e}");
            e
        })?;
        self.attach(transport)
    }

    /// Activate the session over an already-connected transport.
    ///
    /// Performs the handshake, then pre-registers the two bootstrap
    /// methods: BindMethod (ID 0) and RunCommand (ID 1). Those never go
    /// through the dynamic bind path.
    pub fn attach(&mut self, mut transport: Transport) -> Result<(), RpcError> {
        debug_assert!(!self.is_active(), "attach called on an active session");
        if self.is_active() {
            return Err(RpcError::AlreadyConnected);
        }

        if let Err(e) = handshake::perform(&mut transport) {
            tracing::error!("handshake failed: {e}");
            transport.close();
            return Err(e);
        }

        self.session += 1;
        self.bind_call = RemoteFunction::with_id("BindMethod", BIND_METHOD_ID, self.session);
        self.runcmd_call = RemoteFunction::with_id("RunCommand", RUN_COMMAND_ID, self.session);
        self.suspend_ready = false;
        self.suspend_call = RemoteFunction::new();
        self.resume_call = RemoteFunction::new();
        self.transport = Some(transport);
        Ok(())
    }

    /// Tear down the connection.
    ///
    /// Best-effort sends a zero-size QUIT frame (a send failure is logged,
    /// not raised), then closes the socket unconditionally. The session is
    /// always inactive afterwards; a disconnected client is a no-op.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            let quit = Header::new(ReplyCode::Quit.id(), 0);
            if let Err(e) = transport.send(&quit.encode()) {
                tracing::warn!("could not send the disconnect message: {e}");
            }
            transport.close();
        }
    }

    /// Bind an endpoint to a named server method.
    ///
    /// An endpoint that is already bound succeeds as a no-op iff the
    /// (session, name, plugin) identity matches its existing binding;
    /// any other rebind fails without mutating the endpoint. An unbound
    /// endpoint goes through the reserved BindMethod call, quoting the
    /// fully-qualified input and output message type names; on success the
    /// server-assigned ID is stored, on failure the endpoint stays unbound.
    pub fn bind<I, O>(
        &mut self,
        func: &mut RemoteFunction<I, O>,
        name: &str,
        plugin: &str,
    ) -> Result<(), CommandError>
    where
        I: Message + MessageName + Default,
        O: Message + MessageName + Default,
    {
        if func.is_bound() {
            if func.matches(self.session, name, plugin) {
                return Ok(());
            }
            tracing::error!(
                "function already bound to {}::{}",
                func.plugin(),
                func.name()
            );
            return Err(CommandError::Failure);
        }

        let request = CoreBindRequest {
            method: name.to_string(),
            plugin: (!plugin.is_empty()).then(|| plugin.to_string()),
            input_msg: I::FULL_NAME.to_string(),
            output_msg: O::FULL_NAME.to_string(),
        };

        let reply = Self::dispatch(
            &mut self.transport,
            self.sink.as_mut(),
            self.session,
            &self.bind_call,
            &request,
        )?;

        let id = i16::try_from(reply.assigned_id).map_err(|_| {
            tracing::error!(
                "bind of {name}: assigned id {} out of range",
                reply.assigned_id
            );
            CommandError::LinkFailure
        })?;

        func.name = name.to_string();
        func.plugin = plugin.to_string();
        func.id = id;
        func.session = self.session;
        Ok(())
    }

    /// Execute a bound endpoint with the given input.
    ///
    /// Blocks until the terminal frame arrives, forwarding any interleaved
    /// text notifications to the sink in arrival order. Returns the decoded
    /// output on success, or the typed failure; no partial results.
    pub fn call<I, O>(&mut self, func: &RemoteFunction<I, O>, input: &I) -> Result<O, CommandError>
    where
        I: Message + MessageName + Default,
        O: Message + MessageName + Default,
    {
        Self::dispatch(
            &mut self.transport,
            self.sink.as_mut(),
            self.session,
            func,
            input,
        )
    }

    /// Run a console command remotely via the reserved RunCommand method.
    pub fn run_command<S: AsRef<str>>(
        &mut self,
        command: &str,
        args: &[S],
    ) -> Result<(), CommandError> {
        if !self.is_active() {
            tracing::error!("RunCommand: client connection not valid");
            return Err(CommandError::LinkFailure);
        }

        let request = CoreRunCommandRequest {
            command: command.to_string(),
            arguments: args.iter().map(|a| a.as_ref().to_string()).collect(),
        };

        Self::dispatch(
            &mut self.transport,
            self.sink.as_mut(),
            self.session,
            &self.runcmd_call,
            &request,
        )
        .map(|_: EmptyMessage| ())
    }

    /// Suspend the simulation for a burst of rapid calls.
    ///
    /// Lazily binds `CoreSuspend`/`CoreResume` on first use. Returns the
    /// server's suspension counter on success, or −1 on any failure
    /// (inactive session, bind failure, I/O error). Best used through
    /// [`suspend_scope`](Self::suspend_scope).
    pub fn suspend_game(&mut self) -> i32 {
        if !self.is_active() {
            return -1;
        }

        if !self.suspend_ready {
            self.suspend_ready = true;

            let mut suspend_call = std::mem::take(&mut self.suspend_call);
            if let Err(e) = self.bind(&mut suspend_call, "CoreSuspend", "") {
                tracing::warn!("could not bind CoreSuspend: {e}");
            }
            self.suspend_call = suspend_call;

            let mut resume_call = std::mem::take(&mut self.resume_call);
            if let Err(e) = self.bind(&mut resume_call, "CoreResume", "") {
                tracing::warn!("could not bind CoreResume: {e}");
            }
            self.resume_call = resume_call;
        }

        match Self::dispatch(
            &mut self.transport,
            self.sink.as_mut(),
            self.session,
            &self.suspend_call,
            &EmptyMessage::default(),
        ) {
            Ok(reply) => reply.value,
            Err(_) => -1,
        }
    }

    /// Resume a previously suspended simulation.
    ///
    /// Fails fast with −1 if [`suspend_game`](Self::suspend_game) was never
    /// attempted on this session.
    pub fn resume_game(&mut self) -> i32 {
        if !self.suspend_ready {
            return -1;
        }

        match Self::dispatch(
            &mut self.transport,
            self.sink.as_mut(),
            self.session,
            &self.resume_call,
            &EmptyMessage::default(),
        ) {
            Ok(reply) => reply.value,
            Err(_) => -1,
        }
    }

    /// Suspend the simulation for the lifetime of the returned guard.
    ///
    /// If the suspend call reports a value ≤ 0 the guard is empty and will
    /// never resume; otherwise dropping it resumes exactly once, on every
    /// control-flow path out of the scope.
    pub fn suspend_scope(&mut self) -> Suspender<'_> {
        if self.suspend_game() > 0 {
            Suspender {
                client: Some(self),
            }
        } else {
            Suspender { client: None }
        }
    }

    /// The frame multiplexer: one request out, replies drained until a
    /// terminal frame.
    ///
    /// Takes the client's fields separately so callers can borrow an
    /// endpoint stored on the client itself alongside the transport.
    fn dispatch<I, O>(
        transport: &mut Option<Transport>,
        sink: &mut dyn TextSink,
        session: u64,
        func: &RemoteFunction<I, O>,
        input: &I,
    ) -> Result<O, CommandError>
    where
        I: Message + MessageName + Default,
        O: Message + MessageName + Default,
    {
        if !func.is_bound() {
            tracing::error!(
                "calling an unbound RPC function {}::{}",
                func.plugin(),
                func.name()
            );
            return Err(CommandError::NotImplemented);
        }
        if func.session != session {
            tracing::error!(
                "endpoint {}::{} was bound by an earlier session",
                func.plugin(),
                func.name()
            );
            return Err(CommandError::NotImplemented);
        }
        let Some(transport) = transport.as_mut() else {
            tracing::error!(
                "in call to {}::{}: no active connection",
                func.plugin(),
                func.name()
            );
            return Err(CommandError::LinkFailure);
        };

        let payload = ProtoCodec::encode(input);
        if payload.len() > MAX_MESSAGE_SIZE as usize {
            tracing::error!(
                "in call to {}::{}: message too large: {} bytes",
                func.plugin(),
                func.name(),
                payload.len()
            );
            return Err(CommandError::LinkFailure);
        }

        let frame = build_frame(&Header::new(func.id(), payload.len() as i32), &payload);
        if let Err(e) = transport.send(&frame) {
            tracing::error!(
                "in call to {}::{}: I/O error in send: {e}",
                func.plugin(),
                func.name()
            );
            return Err(CommandError::LinkFailure);
        }

        loop {
            let mut header_buf = [0u8; HEADER_SIZE];
            if let Err(e) = transport.read_exact(&mut header_buf) {
                tracing::error!(
                    "in call to {}::{}: I/O error in receive header: {e}",
                    func.plugin(),
                    func.name()
                );
                return Err(CommandError::LinkFailure);
            }
            let Some(header) = Header::decode(&header_buf) else {
                return Err(CommandError::LinkFailure);
            };

            // Protocol special case: FAIL reuses the size field as the
            // signed error code, and carries no payload at all.
            if header.reply_code() == Some(ReplyCode::Fail) {
                return Err(CommandError::from_code(header.size));
            }

            if !header.size_in_bounds() {
                tracing::error!(
                    "in call to {}::{}: invalid received size {}",
                    func.plugin(),
                    func.name(),
                    header.size
                );
                return Err(CommandError::LinkFailure);
            }

            let mut payload = vec![0u8; header.size as usize];
            if let Err(e) = transport.read_exact(&mut payload) {
                tracing::error!(
                    "in call to {}::{}: I/O error in receive of {} bytes: {e}",
                    func.plugin(),
                    func.name(),
                    header.size
                );
                return Err(CommandError::LinkFailure);
            }

            match header.reply_code() {
                Some(ReplyCode::Result) => {
                    return match ProtoCodec::decode::<O>(&payload) {
                        Ok(output) => Ok(output),
                        Err(e) => {
                            tracing::error!(
                                "in call to {}::{}: error parsing received result: {e}",
                                func.plugin(),
                                func.name()
                            );
                            Err(CommandError::LinkFailure)
                        }
                    };
                }
                Some(ReplyCode::Text) => {
                    match ProtoCodec::decode::<CoreTextNotification>(&payload) {
                        Ok(notification) => sink.notify(&notification),
                        Err(e) => tracing::warn!(
                            "in call to {}::{}: received invalid text data: {e}",
                            func.plugin(),
                            func.name()
                        ),
                    }
                }
                // Unknown reply codes are skipped for forward compatibility.
                _ => {}
            }
        }
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RemoteClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("active", &self.is_active())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Scoped suspension guard.
///
/// Acquired via [`RemoteClient::suspend_scope`]; an acquired guard resumes
/// the simulation exactly once when dropped. An empty guard (suspend
/// reported ≤ 0) holds no client reference and never resumes.
pub struct Suspender<'a> {
    client: Option<&'a mut RemoteClient>,
}

impl Suspender<'_> {
    /// Whether the suspension was actually acquired.
    pub fn is_acquired(&self) -> bool {
        self.client.is_some()
    }
}

impl Drop for Suspender<'_> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            client.resume_game();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{CoreTextFragment, StringMessage};
    use crate::protocol::handshake::{HANDSHAKE_SIZE, RESPONSE_MAGIC};
    use crate::sink::MemorySink;
    use crate::transport::testing::ScriptedWire;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    fn handshake_ok() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(RESPONSE_MAGIC);
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf
    }

    fn result_frame<M: Message>(message: &M) -> Vec<u8> {
        let payload = message.encode_to_vec();
        build_frame(
            &Header::new(ReplyCode::Result.id(), payload.len() as i32),
            &payload,
        )
    }

    fn text_frame(text: &str) -> Vec<u8> {
        let payload = CoreTextNotification {
            fragments: vec![CoreTextFragment {
                text: text.to_string(),
                color: None,
            }],
        }
        .encode_to_vec();
        build_frame(
            &Header::new(ReplyCode::Text.id(), payload.len() as i32),
            &payload,
        )
    }

    fn fail_frame(code: i32) -> Vec<u8> {
        Header::new(ReplyCode::Fail.id(), code).encode().to_vec()
    }

    fn bind_reply_frame(assigned_id: i32) -> Vec<u8> {
        result_frame(&CoreBindReply { assigned_id })
    }

    /// Client attached to a scripted wire. The first scripted read must be
    /// the handshake response; returns the write-capture handle and the
    /// recording sink.
    fn scripted_client(
        reads: Vec<Vec<u8>>,
    ) -> (RemoteClient, Arc<Mutex<Vec<u8>>>, Rc<RefCell<MemorySink>>) {
        let wire = ScriptedWire::new(reads);
        let written = wire.written();
        let sink = Rc::new(RefCell::new(MemorySink::new()));
        let mut client = RemoteClient::with_sink(Box::new(sink.clone()));
        client
            .attach(Transport::from_stream(wire))
            .expect("attach failed");
        (client, written, sink)
    }

    /// Split the captured wire bytes (after the handshake request) into
    /// (header, payload) frames.
    fn sent_frames(written: &[u8]) -> Vec<(Header, Vec<u8>)> {
        let mut rest = &written[HANDSHAKE_SIZE..];
        let mut frames = Vec::new();
        while !rest.is_empty() {
            let header = Header::decode(rest).unwrap();
            rest = &rest[HEADER_SIZE..];
            let size = header.size.max(0) as usize;
            frames.push((header, rest[..size].to_vec()));
            rest = &rest[size..];
        }
        frames
    }

    #[test]
    fn test_attach_performs_handshake() {
        let (client, written, _) = scripted_client(vec![handshake_ok()]);
        assert!(client.is_active());

        let written = written.lock().unwrap();
        assert_eq!(&written[..HANDSHAKE_SIZE], &handshake::request());
    }

    #[test]
    fn test_handshake_rejection_leaves_disconnected() {
        let mut response = handshake_ok();
        response[..8].copy_from_slice(b"BogusMg\n");

        let wire = ScriptedWire::new(vec![response]);
        let shutdown = wire.shutdown_flag();
        let mut client = RemoteClient::new();

        let err = client.attach(Transport::from_stream(wire)).unwrap_err();
        assert!(matches!(err, RpcError::Handshake(_)));
        assert!(!client.is_active());
        assert!(*shutdown.lock().unwrap(), "socket must be closed");
    }

    #[test]
    fn test_handshake_version_mismatch_rejected() {
        let mut response = handshake_ok();
        response[8..].copy_from_slice(&2i32.to_le_bytes());

        let wire = ScriptedWire::new(vec![response]);
        let mut client = RemoteClient::new();
        assert!(client.attach(Transport::from_stream(wire)).is_err());
        assert!(!client.is_active());
    }

    #[test]
    fn test_run_command_before_connect_fails() {
        let mut client = RemoteClient::new();
        let err = client.run_command("ls", &[] as &[&str]).unwrap_err();
        assert_eq!(err, CommandError::LinkFailure);
    }

    #[test]
    fn test_call_unbound_endpoint_fails() {
        let (mut client, written, _) = scripted_client(vec![handshake_ok()]);
        let func: RemoteFunction<EmptyMessage, IntMessage> = RemoteFunction::new();

        let err = client.call(&func, &EmptyMessage::default()).unwrap_err();
        assert_eq!(err, CommandError::NotImplemented);
        // Nothing beyond the handshake touched the wire.
        assert_eq!(written.lock().unwrap().len(), HANDSHAKE_SIZE);
    }

    #[test]
    fn test_stale_endpoint_rejected() {
        let (mut client, _, _) = scripted_client(vec![handshake_ok()]);
        // Bound under a session generation that is not the current one.
        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("CoreSuspend", 7, client.session + 1);

        let err = client.call(&func, &EmptyMessage::default()).unwrap_err();
        assert_eq!(err, CommandError::NotImplemented);
    }

    #[test]
    fn test_bind_assigns_server_id() {
        let (mut client, written, _) =
            scripted_client(vec![handshake_ok(), bind_reply_frame(42)]);

        let mut func: RemoteFunction<EmptyMessage, StringMessage> = RemoteFunction::new();
        client.bind(&mut func, "GetVersion", "").unwrap();

        assert!(func.is_bound());
        assert_eq!(func.id(), 42);
        assert_eq!(func.name(), "GetVersion");

        let frames = sent_frames(&written.lock().unwrap());
        assert_eq!(frames.len(), 1);
        let (header, payload) = &frames[0];
        assert_eq!(header.id, BIND_METHOD_ID);

        let request = CoreBindRequest::decode(payload.as_slice()).unwrap();
        assert_eq!(request.method, "GetVersion");
        assert_eq!(request.plugin, None);
        assert_eq!(request.input_msg, "dfproto.EmptyMessage");
        assert_eq!(request.output_msg, "dfproto.StringMessage");
    }

    #[test]
    fn test_bind_failure_leaves_endpoint_unbound() {
        let (mut client, _, _) = scripted_client(vec![handshake_ok(), fail_frame(-1)]);

        let mut func: RemoteFunction<EmptyMessage, StringMessage> = RemoteFunction::new();
        let err = client.bind(&mut func, "NoSuchMethod", "").unwrap_err();
        assert_eq!(err, CommandError::NotImplemented);
        assert!(!func.is_bound());
        assert_eq!(func.name(), "");
    }

    #[test]
    fn test_rebind_same_identity_is_noop() {
        let (mut client, written, _) =
            scripted_client(vec![handshake_ok(), bind_reply_frame(9)]);

        let mut func: RemoteFunction<EmptyMessage, IntMessage> = RemoteFunction::new();
        client.bind(&mut func, "CoreSuspend", "").unwrap();
        let wire_len = written.lock().unwrap().len();

        client.bind(&mut func, "CoreSuspend", "").unwrap();
        assert_eq!(func.id(), 9);
        // No further wire traffic for the no-op rebind.
        assert_eq!(written.lock().unwrap().len(), wire_len);
    }

    #[test]
    fn test_rebind_identity_conflict_rejected() {
        let (mut client, written, _) =
            scripted_client(vec![handshake_ok(), bind_reply_frame(9)]);

        let mut func: RemoteFunction<EmptyMessage, IntMessage> = RemoteFunction::new();
        client.bind(&mut func, "CoreSuspend", "").unwrap();
        let wire_len = written.lock().unwrap().len();

        let err = client.bind(&mut func, "CoreResume", "").unwrap_err();
        assert_eq!(err, CommandError::Failure);
        // Original binding intact, nothing sent.
        assert_eq!(func.id(), 9);
        assert_eq!(func.name(), "CoreSuspend");
        assert_eq!(written.lock().unwrap().len(), wire_len);
    }

    #[test]
    fn test_fail_short_circuit_reads_no_payload() {
        // The script ends right after the 8-byte FAIL header: if the
        // executor tried to read a payload it would hit EOF and report
        // LinkFailure instead of the carried code.
        let (mut client, _, _) = scripted_client(vec![handshake_ok(), fail_frame(3)]);

        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("Probe", 5, client.session);
        let err = client.call(&func, &EmptyMessage::default()).unwrap_err();
        assert_eq!(err, CommandError::NotFound);
    }

    #[test]
    fn test_fail_code_zero_normalizes_to_failure() {
        let (mut client, _, _) = scripted_client(vec![handshake_ok(), fail_frame(0)]);

        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("Probe", 5, client.session);
        let err = client.call(&func, &EmptyMessage::default()).unwrap_err();
        assert_eq!(err, CommandError::Failure);
    }

    #[test]
    fn test_fail_unknown_code_preserved() {
        let (mut client, _, _) = scripted_client(vec![handshake_ok(), fail_frame(77)]);

        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("Probe", 5, client.session);
        let err = client.call(&func, &EmptyMessage::default()).unwrap_err();
        assert_eq!(err, CommandError::Unknown(77));
    }

    #[test]
    fn test_text_notifications_delivered_in_order_before_result() {
        let mut replies = text_frame("first ");
        replies.extend(text_frame("second"));
        replies.extend(result_frame(&IntMessage { value: 11 }));
        let (mut client, _, sink) = scripted_client(vec![handshake_ok(), replies]);

        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("Chatty", 5, client.session);
        let output = client.call(&func, &EmptyMessage::default()).unwrap();

        assert_eq!(output.value, 11);
        let sink = sink.borrow();
        assert_eq!(sink.notifications().len(), 2);
        assert_eq!(sink.text(), "first second");
    }

    #[test]
    fn test_unknown_reply_id_skipped() {
        // A reply id the client does not understand: payload is consumed
        // and the loop keeps draining until the terminal frame.
        let mut replies = build_frame(&Header::new(-9, 4), b"\x01\x02\x03\x04");
        replies.extend(result_frame(&IntMessage { value: 5 }));
        let (mut client, _, sink) = scripted_client(vec![handshake_ok(), replies]);

        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("Future", 5, client.session);
        let output = client.call(&func, &EmptyMessage::default()).unwrap();

        assert_eq!(output.value, 5);
        assert!(sink.borrow().notifications().is_empty());
    }

    #[test]
    fn test_reply_size_out_of_bounds_is_link_failure() {
        let replies = Header::new(ReplyCode::Result.id(), MAX_MESSAGE_SIZE + 1)
            .encode()
            .to_vec();
        let (mut client, _, _) = scripted_client(vec![handshake_ok(), replies]);

        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("Probe", 5, client.session);
        let err = client.call(&func, &EmptyMessage::default()).unwrap_err();
        assert_eq!(err, CommandError::LinkFailure);
    }

    #[test]
    fn test_result_decode_failure_is_link_failure() {
        // A RESULT payload that is not a valid IntMessage encoding.
        let replies = build_frame(&Header::new(ReplyCode::Result.id(), 3), &[0xFF, 0xFF, 0xFF]);
        let (mut client, _, _) = scripted_client(vec![handshake_ok(), replies]);

        let func: RemoteFunction<EmptyMessage, IntMessage> =
            RemoteFunction::with_id("Probe", 5, client.session);
        let err = client.call(&func, &EmptyMessage::default()).unwrap_err();
        assert_eq!(err, CommandError::LinkFailure);
    }

    #[test]
    fn test_oversize_request_rejected_before_send() {
        let (mut client, written, _) = scripted_client(vec![handshake_ok()]);

        let func: RemoteFunction<StringMessage, EmptyMessage> =
            RemoteFunction::with_id("Bulk", 5, client.session);
        let input = StringMessage {
            value: "x".repeat(MAX_MESSAGE_SIZE as usize + 1),
        };

        let err = client.call(&func, &input).unwrap_err();
        assert_eq!(err, CommandError::LinkFailure);
        // The transport observed zero writes beyond the handshake.
        assert_eq!(written.lock().unwrap().len(), HANDSHAKE_SIZE);
    }

    #[test]
    fn test_run_command_sends_request() {
        let (mut client, written, _) =
            scripted_client(vec![handshake_ok(), result_frame(&EmptyMessage::default())]);

        client.run_command("reveal", &["hell"]).unwrap();

        let frames = sent_frames(&written.lock().unwrap());
        assert_eq!(frames.len(), 1);
        let (header, payload) = &frames[0];
        assert_eq!(header.id, RUN_COMMAND_ID);

        let request = CoreRunCommandRequest::decode(payload.as_slice()).unwrap();
        assert_eq!(request.command, "reveal");
        assert_eq!(request.arguments, vec!["hell".to_string()]);
    }

    #[test]
    fn test_disconnect_sends_quit_and_deactivates() {
        let (mut client, written, _) = scripted_client(vec![handshake_ok()]);

        client.disconnect();
        assert!(!client.is_active());

        let frames = sent_frames(&written.lock().unwrap());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, Header::new(ReplyCode::Quit.id(), 0));

        // Second disconnect is a no-op.
        client.disconnect();
        assert_eq!(sent_frames(&written.lock().unwrap()).len(), 1);
    }

    #[test]
    fn test_suspend_and_resume_flow() {
        let (mut client, written, _) = scripted_client(vec![
            handshake_ok(),
            bind_reply_frame(20), // CoreSuspend
            bind_reply_frame(21), // CoreResume
            result_frame(&IntMessage { value: 1 }),
            result_frame(&IntMessage { value: 0 }),
        ]);

        assert_eq!(client.suspend_game(), 1);
        assert_eq!(client.resume_game(), 0);

        let frames = sent_frames(&written.lock().unwrap());
        // Two binds, then the suspend and resume calls themselves.
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[2].0.id, 20);
        assert_eq!(frames[3].0.id, 21);
    }

    #[test]
    fn test_resume_without_suspend_fails_fast() {
        let (mut client, written, _) = scripted_client(vec![handshake_ok()]);
        assert_eq!(client.resume_game(), -1);
        assert_eq!(written.lock().unwrap().len(), HANDSHAKE_SIZE);
    }

    #[test]
    fn test_suspend_game_inactive_returns_minus_one() {
        let mut client = RemoteClient::new();
        assert_eq!(client.suspend_game(), -1);
    }

    #[test]
    fn test_suspend_scope_resumes_exactly_once() {
        let (mut client, written, _) = scripted_client(vec![
            handshake_ok(),
            bind_reply_frame(20),
            bind_reply_frame(21),
            result_frame(&IntMessage { value: 1 }),
            result_frame(&IntMessage { value: 0 }),
        ]);

        {
            let guard = client.suspend_scope();
            assert!(guard.is_acquired());
        } // drop resumes

        let frames = sent_frames(&written.lock().unwrap());
        let resume_calls = frames.iter().filter(|(h, _)| h.id == 21).count();
        assert_eq!(resume_calls, 1);
    }

    #[test]
    fn test_suspend_scope_resumes_on_early_exit() {
        let (mut client, written, _) = scripted_client(vec![
            handshake_ok(),
            bind_reply_frame(20),
            bind_reply_frame(21),
            result_frame(&IntMessage { value: 1 }),
            result_frame(&IntMessage { value: 0 }),
        ]);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = client.suspend_scope();
            panic!("guarded work failed");
        }));
        assert!(result.is_err());

        let frames = sent_frames(&written.lock().unwrap());
        let resume_calls = frames.iter().filter(|(h, _)| h.id == 21).count();
        assert_eq!(resume_calls, 1);
    }

    #[test]
    fn test_suspend_scope_not_acquired_never_resumes() {
        let (mut client, written, _) = scripted_client(vec![
            handshake_ok(),
            bind_reply_frame(20),
            bind_reply_frame(21),
            result_frame(&IntMessage { value: 0 }), // suspend reports 0
        ]);

        {
            let guard = client.suspend_scope();
            assert!(!guard.is_acquired());
        }

        let frames = sent_frames(&written.lock().unwrap());
        // Two binds plus the suspend call; no resume frame (id 21).
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|(h, _)| h.id != 21));
    }

    #[test]
    fn test_default_port_fallback() {
        // Only checks the fallback path: the variable is not set in tests.
        if std::env::var("DFHACK_PORT").is_err() {
            assert_eq!(default_port(), DEFAULT_PORT);
        }
    }
}
