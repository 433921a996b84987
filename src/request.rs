//! Request payloads and their per-version coders.
//!
//! Each coder implements the size-then-write contract: `encoded_size`
//! returns the exact number of bytes `encode` will produce for the same
//! payload and version, letting the protocol encoder allocate the body
//! buffer up front. The dispatch over (kind, version) lives entirely in
//! this module; an unsupported combination (BATCH under v1, CREDENTIALS
//! under v2) is a protocol-negotiation bug and panics.

use bytes::{Bytes, BytesMut};

use crate::frame::ProtocolVersion;
use crate::message::RequestKind;
use crate::response::EventType;
use crate::wire::{self, Consistency};

/// Request payload, tagged by kind.
#[derive(Clone, Debug)]
pub enum RequestBody {
    /// STARTUP: connection initialisation options.
    Startup(Startup),
    /// CREDENTIALS: plain credential map (v1 only).
    Credentials(Credentials),
    /// OPTIONS: empty body.
    Options,
    /// QUERY: unprepared query string plus execution parameters.
    Query(Query),
    /// PREPARE: query string to prepare.
    Prepare(Prepare),
    /// EXECUTE: prepared statement id plus execution parameters.
    Execute(Execute),
    /// REGISTER: event types to subscribe to.
    Register(Register),
    /// BATCH: grouped statements (v2 only).
    Batch(Batch),
    /// `AUTH_RESPONSE`: SASL token.
    AuthResponse(AuthResponse),
}

/// STARTUP options.
#[derive(Clone, Debug)]
pub struct Startup {
    /// CQL version announced to the server.
    pub cql_version: String,
    /// Negotiated compression algorithm name, if any. The flag and codec
    /// live outside this crate; only the option string is carried here.
    pub compression: Option<String>,
}

impl Startup {
    /// CQL version announced by default.
    pub const DEFAULT_CQL_VERSION: &'static str = "3.0.0";

    fn options(&self) -> Vec<(String, String)> {
        let mut options = vec![("CQL_VERSION".to_owned(), self.cql_version.clone())];
        if let Some(compression) = &self.compression {
            options.push(("COMPRESSION".to_owned(), compression.clone()));
        }
        options
    }
}

impl Default for Startup {
    fn default() -> Self {
        Self {
            cql_version: Self::DEFAULT_CQL_VERSION.to_owned(),
            compression: None,
        }
    }
}

/// CREDENTIALS payload: ordered credential pairs (v1 only).
#[derive(Clone, Debug)]
pub struct Credentials {
    /// Credential key/value pairs, encoded in order.
    pub credentials: Vec<(String, String)>,
}

/// QUERY payload.
#[derive(Clone, Debug)]
pub struct Query {
    /// The query string.
    pub query: String,
    /// Execution parameters; under v1 only the consistency is encoded.
    pub params: QueryParameters,
}

/// PREPARE payload.
#[derive(Clone, Debug)]
pub struct Prepare {
    /// The query string to prepare.
    pub query: String,
}

/// EXECUTE payload.
#[derive(Clone, Debug)]
pub struct Execute {
    /// Prepared statement id, as returned in a PREPARED result.
    pub id: Bytes,
    /// Execution parameters.
    pub params: QueryParameters,
}

/// REGISTER payload.
#[derive(Clone, Debug)]
pub struct Register {
    /// Event types to subscribe this connection to.
    pub events: Vec<EventType>,
}

/// BATCH payload (v2 only).
#[derive(Clone, Debug)]
pub struct Batch {
    /// Batch atomicity mode.
    pub batch_type: BatchType,
    /// Statements executed as one unit.
    pub statements: Vec<BatchStatement>,
    /// Consistency level for the whole batch.
    pub consistency: Consistency,
}

/// Batch atomicity mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchType {
    /// Atomic through the batch log.
    Logged,
    /// No batch log; partial application possible.
    Unlogged,
    /// Counter mutations only.
    Counter,
}

impl BatchType {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Logged => 0,
            Self::Unlogged => 1,
            Self::Counter => 2,
        }
    }
}

/// One statement inside a BATCH.
#[derive(Clone, Debug)]
pub enum BatchStatement {
    /// An unprepared query string with bound values.
    Query {
        /// The query string.
        query: String,
        /// Bound values; opaque pre-serialised blobs.
        values: Vec<Option<Bytes>>,
    },
    /// A prepared statement id with bound values.
    Prepared {
        /// Prepared statement id.
        id: Bytes,
        /// Bound values; opaque pre-serialised blobs.
        values: Vec<Option<Bytes>>,
    },
}

/// `AUTH_RESPONSE` payload.
#[derive(Clone, Debug)]
pub struct AuthResponse {
    /// SASL token; absence encodes as a null `[bytes]`.
    pub token: Option<Bytes>,
}

/// Execution parameters carried by QUERY and EXECUTE.
///
/// Values are opaque pre-serialised blobs: the CQL type system is outside
/// this crate. Under v1 only the consistency level reaches the wire; the
/// remaining fields are a v2 extension.
#[derive(Clone, Debug)]
pub struct QueryParameters {
    /// Consistency level.
    pub consistency: Consistency,
    /// Bound values.
    pub values: Vec<Option<Bytes>>,
    /// Ask the server to omit result metadata (v2).
    pub skip_metadata: bool,
    /// Result page size (v2).
    pub page_size: Option<i32>,
    /// Paging state from a previous ROWS result (v2).
    pub paging_state: Option<Bytes>,
    /// Serial consistency for conditional updates (v2).
    pub serial_consistency: Option<Consistency>,
}

impl QueryParameters {
    const FLAG_VALUES: u8 = 0x01;
    const FLAG_SKIP_METADATA: u8 = 0x02;
    const FLAG_PAGE_SIZE: u8 = 0x04;
    const FLAG_PAGING_STATE: u8 = 0x08;
    const FLAG_SERIAL_CONSISTENCY: u8 = 0x10;

    /// Parameters at the given consistency with every extension unset.
    #[must_use]
    pub const fn with_consistency(consistency: Consistency) -> Self {
        Self {
            consistency,
            values: Vec::new(),
            skip_metadata: false,
            page_size: None,
            paging_state: None,
            serial_consistency: None,
        }
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if !self.values.is_empty() {
            flags |= Self::FLAG_VALUES;
        }
        if self.skip_metadata {
            flags |= Self::FLAG_SKIP_METADATA;
        }
        if self.page_size.is_some() {
            flags |= Self::FLAG_PAGE_SIZE;
        }
        if self.paging_state.is_some() {
            flags |= Self::FLAG_PAGING_STATE;
        }
        if self.serial_consistency.is_some() {
            flags |= Self::FLAG_SERIAL_CONSISTENCY;
        }
        flags
    }

    fn v2_size(&self) -> usize {
        let mut size = 2 + 1;
        if !self.values.is_empty() {
            size += wire::value_list_size(&self.values);
        }
        if self.page_size.is_some() {
            size += 4;
        }
        if let Some(paging_state) = &self.paging_state {
            size += wire::bytes_size(Some(paging_state));
        }
        if self.serial_consistency.is_some() {
            size += 2;
        }
        size
    }

    fn encode_v2(&self, dst: &mut BytesMut) {
        wire::write_consistency(self.consistency, dst);
        wire::write_u8(self.flags(), dst);
        if !self.values.is_empty() {
            wire::write_value_list(&self.values, dst);
        }
        if let Some(page_size) = self.page_size {
            wire::write_int(page_size, dst);
        }
        if let Some(paging_state) = &self.paging_state {
            wire::write_bytes(Some(paging_state), dst);
        }
        if let Some(serial) = self.serial_consistency {
            wire::write_consistency(serial, dst);
        }
    }
}

impl Default for QueryParameters {
    fn default() -> Self { Self::with_consistency(Consistency::One) }
}

impl BatchStatement {
    fn size(&self) -> usize {
        match self {
            Self::Query { query, values } => {
                1 + wire::long_string_size(query) + wire::value_list_size(values)
            }
            Self::Prepared { id, values } => {
                1 + wire::short_bytes_size(id) + wire::value_list_size(values)
            }
        }
    }

    fn encode(&self, dst: &mut BytesMut) {
        match self {
            Self::Query { query, values } => {
                wire::write_u8(0, dst);
                wire::write_long_string(query, dst);
                wire::write_value_list(values, dst);
            }
            Self::Prepared { id, values } => {
                wire::write_u8(1, dst);
                wire::write_short_bytes(id, dst);
                wire::write_value_list(values, dst);
            }
        }
    }
}

impl RequestBody {
    /// The kind tag of this payload.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Startup(_) => RequestKind::Startup,
            Self::Credentials(_) => RequestKind::Credentials,
            Self::Options => RequestKind::Options,
            Self::Query(_) => RequestKind::Query,
            Self::Prepare(_) => RequestKind::Prepare,
            Self::Execute(_) => RequestKind::Execute,
            Self::Register(_) => RequestKind::Register,
            Self::Batch(_) => RequestKind::Batch,
            Self::AuthResponse(_) => RequestKind::AuthResponse,
        }
    }

    /// Exact size `encode` will produce for this payload under `version`.
    ///
    /// # Panics
    /// Panics when no coder is registered for the combination; see
    /// [`RequestKind::supported`].
    #[must_use]
    pub fn encoded_size(&self, version: ProtocolVersion) -> usize {
        match (self, version) {
            (Self::Startup(startup), _) => wire::string_map_size(&startup.options()),
            (Self::Credentials(credentials), ProtocolVersion::V1) => {
                wire::string_map_size(&credentials.credentials)
            }
            (Self::Options, _) => 0,
            (Self::Query(query), ProtocolVersion::V1) => wire::long_string_size(&query.query) + 2,
            (Self::Query(query), ProtocolVersion::V2) => {
                wire::long_string_size(&query.query) + query.params.v2_size()
            }
            (Self::Prepare(prepare), _) => wire::long_string_size(&prepare.query),
            (Self::Execute(execute), ProtocolVersion::V1) => {
                wire::short_bytes_size(&execute.id)
                    + wire::value_list_size(&execute.params.values)
                    + 2
            }
            (Self::Execute(execute), ProtocolVersion::V2) => {
                wire::short_bytes_size(&execute.id) + execute.params.v2_size()
            }
            (Self::Register(register), _) => {
                2 + register
                    .events
                    .iter()
                    .map(|event| wire::string_size(event.as_str()))
                    .sum::<usize>()
            }
            (Self::Batch(batch), ProtocolVersion::V2) => {
                1 + 2
                    + batch
                        .statements
                        .iter()
                        .map(BatchStatement::size)
                        .sum::<usize>()
                    + 2
            }
            (Self::AuthResponse(auth), _) => wire::bytes_size(auth.token.as_ref()),
            (Self::Credentials(_) | Self::Batch(_), _) => unsupported(self.kind(), version),
        }
    }

    /// Serialise this payload into `dst` under `version`.
    ///
    /// Writes exactly [`Self::encoded_size`] bytes.
    ///
    /// # Panics
    /// Panics when no coder is registered for the combination; see
    /// [`RequestKind::supported`].
    pub fn encode(&self, version: ProtocolVersion, dst: &mut BytesMut) {
        match (self, version) {
            (Self::Startup(startup), _) => wire::write_string_map(&startup.options(), dst),
            (Self::Credentials(credentials), ProtocolVersion::V1) => {
                wire::write_string_map(&credentials.credentials, dst);
            }
            (Self::Options, _) => {}
            (Self::Query(query), ProtocolVersion::V1) => {
                wire::write_long_string(&query.query, dst);
                wire::write_consistency(query.params.consistency, dst);
            }
            (Self::Query(query), ProtocolVersion::V2) => {
                wire::write_long_string(&query.query, dst);
                query.params.encode_v2(dst);
            }
            (Self::Prepare(prepare), _) => wire::write_long_string(&prepare.query, dst),
            (Self::Execute(execute), ProtocolVersion::V1) => {
                wire::write_short_bytes(&execute.id, dst);
                wire::write_value_list(&execute.params.values, dst);
                wire::write_consistency(execute.params.consistency, dst);
            }
            (Self::Execute(execute), ProtocolVersion::V2) => {
                wire::write_short_bytes(&execute.id, dst);
                execute.params.encode_v2(dst);
            }
            (Self::Register(register), _) => {
                wire::write_short(register.events.len() as u16, dst);
                for event in &register.events {
                    wire::write_string(event.as_str(), dst);
                }
            }
            (Self::Batch(batch), ProtocolVersion::V2) => {
                wire::write_u8(batch.batch_type.as_u8(), dst);
                wire::write_short(batch.statements.len() as u16, dst);
                for statement in &batch.statements {
                    statement.encode(dst);
                }
                wire::write_consistency(batch.consistency, dst);
            }
            (Self::AuthResponse(auth), _) => wire::write_bytes(auth.token.as_ref(), dst),
            (Self::Credentials(_) | Self::Batch(_), _) => unsupported(self.kind(), version),
        }
    }
}

fn unsupported(kind: RequestKind, version: ProtocolVersion) -> ! {
    panic!(
        "no coder registered for {kind:?} under protocol v{}; \
         version negotiation should have prevented this",
        version.as_u8()
    )
}

#[cfg(test)]
mod tests;
