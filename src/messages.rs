//! The `dfproto` core message set.
//!
//! Hand-written prost structs mirroring the server's `CoreProtocol.proto`.
//! The originals are proto2, so required fields are plain values and
//! optional fields are `Option`s, with matching field tags.
//!
//! Every message also carries its fully-qualified protobuf name via
//! [`MessageName`]; BindMethod requests quote those names so the server can
//! check that both sides agree on a method's input and output types.

/// Fully-qualified protobuf type name of a message.
pub trait MessageName: prost::Message {
    /// The `dfproto.<Name>` identifier quoted in bind requests.
    const FULL_NAME: &'static str;
}

macro_rules! message_name {
    ($type:ty, $name:literal) => {
        impl MessageName for $type {
            const FULL_NAME: &'static str = $name;
        }
    };
}

/// Empty input or output.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmptyMessage {}

/// A single integer value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IntMessage {
    #[prost(int32, required, tag = "1")]
    pub value: i32,
}

/// A list of integer values.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IntListMessage {
    #[prost(int32, repeated, packed = "false", tag = "1")]
    pub value: Vec<i32>,
}

/// A single string value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringMessage {
    #[prost(string, required, tag = "1")]
    pub value: String,
}

/// A list of string values.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringListMessage {
    #[prost(string, repeated, tag = "1")]
    pub value: Vec<String>,
}

/// Console color of a text fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    Grey = 7,
    DarkGrey = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    LightMagenta = 13,
    Yellow = 14,
    White = 15,
}

/// One colored run of console text.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoreTextFragment {
    #[prost(string, required, tag = "1")]
    pub text: String,
    #[prost(enumeration = "Color", optional, tag = "2")]
    pub color: Option<i32>,
}

/// A batch of text fragments streamed alongside a call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoreTextNotification {
    #[prost(message, repeated, tag = "1")]
    pub fragments: Vec<CoreTextFragment>,
}

/// Request to resolve a method name to its server-assigned ID.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoreBindRequest {
    #[prost(string, required, tag = "1")]
    pub method: String,
    #[prost(string, optional, tag = "2")]
    pub plugin: Option<String>,
    #[prost(string, required, tag = "3")]
    pub input_msg: String,
    #[prost(string, required, tag = "4")]
    pub output_msg: String,
}

/// The server's answer to a bind request.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoreBindReply {
    #[prost(int32, required, tag = "1")]
    pub assigned_id: i32,
}

/// Request to run a console command remotely.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoreRunCommandRequest {
    #[prost(string, required, tag = "1")]
    pub command: String,
    #[prost(string, repeated, tag = "2")]
    pub arguments: Vec<String>,
}

message_name!(EmptyMessage, "dfproto.EmptyMessage");
message_name!(IntMessage, "dfproto.IntMessage");
message_name!(IntListMessage, "dfproto.IntListMessage");
message_name!(StringMessage, "dfproto.StringMessage");
message_name!(StringListMessage, "dfproto.StringListMessage");
message_name!(CoreTextFragment, "dfproto.CoreTextFragment");
message_name!(CoreTextNotification, "dfproto.CoreTextNotification");
message_name!(CoreBindRequest, "dfproto.CoreBindRequest");
message_name!(CoreBindReply, "dfproto.CoreBindReply");
message_name!(CoreRunCommandRequest, "dfproto.CoreRunCommandRequest");
