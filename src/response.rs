//! Response payloads and their per-version decoders.
//!
//! Decoders consume exactly their kind's portion of the body; the tracing
//! id prefix, when present, has already been taken by the protocol decoder
//! before dispatch reaches this module. Row cells and prepared-statement
//! metadata stay opaque `Bytes`: interpreting them needs the CQL type
//! system, which lives outside this crate.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;

use crate::error::{BodyError, CodecError};
use crate::frame::ProtocolVersion;
use crate::message::ResponseKind;
use crate::wire;

/// Response payload, tagged by kind.
#[derive(Clone, Debug)]
pub enum ResponseBody {
    /// ERROR: server-reported failure.
    Error(ErrorBody),
    /// READY: startup complete, empty body.
    Ready,
    /// AUTHENTICATE: server demands authentication.
    Authenticate(Authenticate),
    /// SUPPORTED: startup options the server accepts.
    Supported(Supported),
    /// RESULT: outcome of a QUERY, PREPARE, EXECUTE, or BATCH.
    Result(QueryResult),
    /// EVENT: pushed cluster notification.
    Event(Event),
    /// `AUTH_CHALLENGE`: SASL challenge token.
    AuthChallenge(AuthChallenge),
    /// `AUTH_SUCCESS`: SASL completion token.
    AuthSuccess(AuthSuccess),
}

/// ERROR payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    /// Protocol error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

/// AUTHENTICATE payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authenticate {
    /// Fully qualified authenticator class name.
    pub authenticator: String,
}

/// SUPPORTED payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Supported {
    /// Option name to accepted values.
    pub options: HashMap<String, Vec<String>>,
}

/// `AUTH_CHALLENGE` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthChallenge {
    /// SASL token; null `[bytes]` decodes as `None`.
    pub token: Option<Bytes>,
}

/// `AUTH_SUCCESS` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSuccess {
    /// Final SASL token; null `[bytes]` decodes as `None`.
    pub token: Option<Bytes>,
}

/// RESULT payload variants.
#[derive(Clone, Debug)]
pub enum QueryResult {
    /// Statement produced no result set.
    Void,
    /// A page of rows.
    Rows(Rows),
    /// USE statement completed.
    SetKeyspace {
        /// The keyspace now in use.
        keyspace: String,
    },
    /// PREPARE completed.
    Prepared(Prepared),
    /// Schema-altering statement completed.
    SchemaChange(SchemaChange),
}

/// A ROWS result: paging metadata plus the opaque remainder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rows {
    /// Raw metadata flag bits.
    pub flags: i32,
    /// Number of columns per row.
    pub column_count: i32,
    /// Token to resume the result set; v2 only, present when the server
    /// has more pages.
    pub paging_state: Option<Bytes>,
    /// Column specs and row content, undecoded.
    pub payload: Bytes,
}

impl Rows {
    /// Metadata flag: column specs carry one global table spec.
    pub const FLAG_GLOBAL_TABLES_SPEC: i32 = 0x0001;
    /// Metadata flag: a paging state follows (v2).
    pub const FLAG_HAS_MORE_PAGES: i32 = 0x0002;
    /// Metadata flag: column specs omitted (v2).
    pub const FLAG_NO_METADATA: i32 = 0x0004;
}

/// A PREPARED result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prepared {
    /// Statement id to pass back in EXECUTE.
    pub id: Bytes,
    /// Bind-variable and result metadata, undecoded.
    pub metadata: Bytes,
}

/// A schema change description, shared by RESULT and EVENT bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaChange {
    /// CREATED, UPDATED, or DROPPED.
    pub change: String,
    /// Affected keyspace.
    pub keyspace: String,
    /// Affected table; empty for keyspace-level changes.
    pub table: String,
}

/// EVENT payload variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A node joined or left the cluster.
    TopologyChange {
        /// `NEW_NODE` or `REMOVED_NODE`.
        change: String,
        /// The node's address.
        node: SocketAddr,
    },
    /// A node went up or down.
    StatusChange {
        /// UP or DOWN.
        status: String,
        /// The node's address.
        node: SocketAddr,
    },
    /// The schema changed.
    SchemaChange(SchemaChange),
}

/// Event categories a connection can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Nodes joining or leaving.
    TopologyChange,
    /// Nodes going up or down.
    StatusChange,
    /// Schema alterations.
    SchemaChange,
}

impl EventType {
    /// Wire name of this event category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopologyChange => "TOPOLOGY_CHANGE",
            Self::StatusChange => "STATUS_CHANGE",
            Self::SchemaChange => "SCHEMA_CHANGE",
        }
    }

    /// Resolve a wire name back to a category.
    ///
    /// # Errors
    /// Returns [`BodyError::UnknownEventType`] for unrecognised names.
    pub fn from_name(name: &str) -> Result<Self, BodyError> {
        match name {
            "TOPOLOGY_CHANGE" => Ok(Self::TopologyChange),
            "STATUS_CHANGE" => Ok(Self::StatusChange),
            "SCHEMA_CHANGE" => Ok(Self::SchemaChange),
            other => Err(BodyError::UnknownEventType {
                name: other.to_owned(),
            }),
        }
    }
}

const RESULT_KIND_VOID: i32 = 0x0001;
const RESULT_KIND_ROWS: i32 = 0x0002;
const RESULT_KIND_SET_KEYSPACE: i32 = 0x0003;
const RESULT_KIND_PREPARED: i32 = 0x0004;
const RESULT_KIND_SCHEMA_CHANGE: i32 = 0x0005;

impl ResponseBody {
    /// The kind tag of this payload.
    #[must_use]
    pub const fn kind(&self) -> ResponseKind {
        match self {
            Self::Error(_) => ResponseKind::Error,
            Self::Ready => ResponseKind::Ready,
            Self::Authenticate(_) => ResponseKind::Authenticate,
            Self::Supported(_) => ResponseKind::Supported,
            Self::Result(_) => ResponseKind::Result,
            Self::Event(_) => ResponseKind::Event,
            Self::AuthChallenge(_) => ResponseKind::AuthChallenge,
            Self::AuthSuccess(_) => ResponseKind::AuthSuccess,
        }
    }
}

impl ResponseKind {
    /// Decode this kind's body under `version`.
    ///
    /// The tracing id prefix, when the exchange was traced, must already
    /// have been consumed from the front of `body`.
    ///
    /// # Errors
    /// Returns [`CodecError::Body`] when the body is truncated or carries
    /// unrecognised protocol constants.
    pub fn decode_body(
        self,
        version: ProtocolVersion,
        body: &mut Bytes,
    ) -> Result<ResponseBody, CodecError> {
        let decoded = match self {
            Self::Error => ResponseBody::Error(ErrorBody {
                code: wire::read_int(body)?,
                message: wire::read_string(body)?,
            }),
            Self::Ready => ResponseBody::Ready,
            Self::Authenticate => ResponseBody::Authenticate(Authenticate {
                authenticator: wire::read_string(body)?,
            }),
            Self::Supported => ResponseBody::Supported(Supported {
                options: wire::read_string_multimap(body)?,
            }),
            Self::Result => ResponseBody::Result(decode_result(version, body)?),
            Self::Event => ResponseBody::Event(decode_event(body)?),
            Self::AuthChallenge => ResponseBody::AuthChallenge(AuthChallenge {
                token: wire::read_bytes(body)?,
            }),
            Self::AuthSuccess => ResponseBody::AuthSuccess(AuthSuccess {
                token: wire::read_bytes(body)?,
            }),
        };
        Ok(decoded)
    }
}

fn decode_result(version: ProtocolVersion, body: &mut Bytes) -> Result<QueryResult, BodyError> {
    let kind = wire::read_int(body)?;
    match kind {
        RESULT_KIND_VOID => Ok(QueryResult::Void),
        RESULT_KIND_ROWS => decode_rows(version, body).map(QueryResult::Rows),
        RESULT_KIND_SET_KEYSPACE => Ok(QueryResult::SetKeyspace {
            keyspace: wire::read_string(body)?,
        }),
        RESULT_KIND_PREPARED => Ok(QueryResult::Prepared(Prepared {
            id: wire::read_short_bytes(body)?,
            metadata: take_remaining(body),
        })),
        RESULT_KIND_SCHEMA_CHANGE => Ok(QueryResult::SchemaChange(decode_schema_change(body)?)),
        other => Err(BodyError::UnknownResultKind { kind: other }),
    }
}

fn decode_rows(version: ProtocolVersion, body: &mut Bytes) -> Result<Rows, BodyError> {
    let flags = wire::read_int(body)?;
    let column_count = wire::read_int(body)?;
    // The paging state is a v2 addition; a v1 ROWS body never carries one,
    // so the v1 decoder must not consume those bytes.
    let paging_state = match version {
        ProtocolVersion::V1 => None,
        ProtocolVersion::V2 if flags & Rows::FLAG_HAS_MORE_PAGES != 0 => wire::read_bytes(body)?,
        ProtocolVersion::V2 => None,
    };
    Ok(Rows {
        flags,
        column_count,
        paging_state,
        payload: take_remaining(body),
    })
}

fn decode_schema_change(body: &mut Bytes) -> Result<SchemaChange, BodyError> {
    Ok(SchemaChange {
        change: wire::read_string(body)?,
        keyspace: wire::read_string(body)?,
        table: wire::read_string(body)?,
    })
}

fn decode_event(body: &mut Bytes) -> Result<Event, BodyError> {
    let name = wire::read_string(body)?;
    match EventType::from_name(&name)? {
        EventType::TopologyChange => Ok(Event::TopologyChange {
            change: wire::read_string(body)?,
            node: wire::read_inet(body)?,
        }),
        EventType::StatusChange => Ok(Event::StatusChange {
            status: wire::read_string(body)?,
            node: wire::read_inet(body)?,
        }),
        EventType::SchemaChange => Ok(Event::SchemaChange(decode_schema_change(body)?)),
    }
}

fn take_remaining(body: &mut Bytes) -> Bytes { body.split_to(body.len()) }
