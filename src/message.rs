//! Message kinds, the opcode registry, and the request/response value
//! types.
//!
//! Requests and responses are closed sets: each kind carries a fixed
//! opcode, stable across protocol versions, and a per-version coder or
//! decoder resolved in [`crate::request`] / [`crate::response`]. The
//! reverse lookup from a raw response opcode is a dense table built once
//! and validated for duplicate opcodes, so a misregistered kind fails fast
//! at startup rather than corrupting dispatch at runtime.

use std::sync::LazyLock;

use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CodecError;
use crate::frame::ProtocolVersion;
use crate::request::RequestBody;
use crate::response::ResponseBody;
use crate::wire::Consistency;

/// The closed set of request kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Connection initialisation options.
    Startup,
    /// Plain credentials (protocol v1 only; v2 replaced it with the SASL
    /// exchange).
    Credentials,
    /// Query for supported startup options.
    Options,
    /// Unprepared query execution.
    Query,
    /// Statement preparation.
    Prepare,
    /// Prepared statement execution.
    Execute,
    /// Event subscription.
    Register,
    /// Grouped statement execution (protocol v2 only).
    Batch,
    /// SASL token exchange.
    AuthResponse,
}

impl RequestKind {
    /// Operation code, stable across protocol versions.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Startup => 0x01,
            Self::Credentials => 0x04,
            Self::Options => 0x05,
            Self::Query => 0x07,
            Self::Prepare => 0x09,
            Self::Execute => 0x0A,
            Self::Register => 0x0B,
            Self::Batch => 0x0D,
            Self::AuthResponse => 0x0F,
        }
    }

    /// Whether a coder is registered for this kind under `version`.
    ///
    /// Encoding an unsupported combination is a protocol-negotiation bug
    /// and panics at the dispatch site; callers gate on this when the
    /// negotiated version is dynamic.
    #[must_use]
    pub const fn supported(self, version: ProtocolVersion) -> bool {
        !matches!(
            (self, version),
            (Self::Credentials, ProtocolVersion::V2) | (Self::Batch, ProtocolVersion::V1)
        )
    }
}

/// The closed set of response kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Server-reported error.
    Error,
    /// Startup complete.
    Ready,
    /// Authentication required.
    Authenticate,
    /// Supported startup options.
    Supported,
    /// Query result.
    Result,
    /// Pushed cluster event.
    Event,
    /// SASL challenge.
    AuthChallenge,
    /// SASL success.
    AuthSuccess,
}

/// Highest assigned response opcode; sizes the reverse-lookup table.
const MAX_RESPONSE_OPCODE: usize = 0x10;

/// Dense reverse-lookup table, built once on first use.
static OPCODE_TABLE: LazyLock<[Option<ResponseKind>; MAX_RESPONSE_OPCODE + 1]> =
    LazyLock::new(|| {
        let entries = ResponseKind::ALL.map(|kind| (kind.opcode(), kind));
        match build_opcode_table(&entries) {
            Ok(table) => table,
            Err(err) => panic!("response opcode registry is inconsistent: {err}"),
        }
    });

/// Two response kinds were registered under the same opcode.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("duplicate response opcode {opcode:#04x}")]
pub(crate) struct DuplicateOpcode {
    pub(crate) opcode: u8,
}

/// Build the dense opcode table, rejecting duplicate registrations.
pub(crate) fn build_opcode_table(
    entries: &[(u8, ResponseKind)],
) -> Result<[Option<ResponseKind>; MAX_RESPONSE_OPCODE + 1], DuplicateOpcode> {
    let mut table = [None; MAX_RESPONSE_OPCODE + 1];
    for &(opcode, kind) in entries {
        let slot = &mut table[opcode as usize];
        if slot.is_some() {
            return Err(DuplicateOpcode { opcode });
        }
        *slot = Some(kind);
    }
    Ok(table)
}

impl ResponseKind {
    /// Every response kind, in opcode order.
    pub const ALL: [Self; 8] = [
        Self::Error,
        Self::Ready,
        Self::Authenticate,
        Self::Supported,
        Self::Result,
        Self::Event,
        Self::AuthChallenge,
        Self::AuthSuccess,
    ];

    /// Operation code, stable across protocol versions.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Error => 0x00,
            Self::Ready => 0x02,
            Self::Authenticate => 0x03,
            Self::Supported => 0x06,
            Self::Result => 0x08,
            Self::Event => 0x0C,
            Self::AuthChallenge => 0x0E,
            Self::AuthSuccess => 0x10,
        }
    }

    /// Resolve a raw opcode read off the wire.
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownOpcode`] for opcodes outside the
    /// registered set; a malformed or version-mismatched peer can trigger
    /// this, so it is reportable rather than fatal.
    pub fn from_opcode(opcode: u8) -> Result<Self, CodecError> {
        OPCODE_TABLE
            .get(opcode as usize)
            .copied()
            .flatten()
            .ok_or(CodecError::UnknownOpcode { opcode })
    }
}

/// A typed request, ready for stream assignment and encoding.
///
/// Immutable apart from the stream id, which the connection orchestrator
/// assigns after construction and before transmission.
#[derive(Clone, Debug)]
pub struct Request {
    stream_id: i8,
    tracing_requested: bool,
    body: RequestBody,
}

impl Request {
    /// Wrap a request body; stream id starts at 0 and tracing off.
    #[must_use]
    pub fn new(body: RequestBody) -> Self {
        Self {
            stream_id: 0,
            tracing_requested: false,
            body,
        }
    }

    /// Request tracing for this exchange.
    #[must_use]
    pub fn with_tracing(mut self) -> Self {
        self.tracing_requested = true;
        self
    }

    /// Whether tracing was requested.
    #[must_use]
    pub const fn is_tracing_requested(&self) -> bool { self.tracing_requested }

    /// The kind tag of this request.
    #[must_use]
    pub const fn kind(&self) -> RequestKind { self.body.kind() }

    /// The request payload.
    #[must_use]
    pub const fn body(&self) -> &RequestBody { &self.body }

    /// Stream correlation id.
    #[must_use]
    pub const fn stream_id(&self) -> i8 { self.stream_id }

    /// Assign the stream correlation id.
    ///
    /// The sole mutable slot on a request; everything else is fixed at
    /// construction.
    pub fn set_stream_id(&mut self, stream_id: i8) { self.stream_id = stream_id; }

    /// Consistency level, for kinds that carry execution parameters.
    #[must_use]
    pub fn consistency(&self) -> Option<Consistency> {
        match &self.body {
            RequestBody::Query(query) => Some(query.params.consistency),
            RequestBody::Execute(execute) => Some(execute.params.consistency),
            RequestBody::Batch(batch) => Some(batch.consistency),
            _ => None,
        }
    }

    /// Serial consistency level, for kinds that carry one.
    #[must_use]
    pub fn serial_consistency(&self) -> Option<Consistency> {
        match &self.body {
            RequestBody::Query(query) => query.params.serial_consistency,
            RequestBody::Execute(execute) => execute.params.serial_consistency,
            _ => None,
        }
    }

    /// Paging state token, for kinds that carry one.
    #[must_use]
    pub fn paging_state(&self) -> Option<&Bytes> {
        match &self.body {
            RequestBody::Query(query) => query.params.paging_state.as_ref(),
            RequestBody::Execute(execute) => execute.params.paging_state.as_ref(),
            _ => None,
        }
    }
}

/// A typed response, as produced by the protocol decoder.
#[derive(Clone, Debug)]
pub struct Response {
    stream_id: i8,
    tracing_id: Option<Uuid>,
    body: ResponseBody,
}

impl Response {
    /// Assemble a decoded response; ids are stamped by the decoder from
    /// the originating frame.
    pub(crate) fn new(stream_id: i8, tracing_id: Option<Uuid>, body: ResponseBody) -> Self {
        Self {
            stream_id,
            tracing_id,
            body,
        }
    }

    /// The kind tag of this response.
    #[must_use]
    pub const fn kind(&self) -> ResponseKind { self.body.kind() }

    /// Stream correlation id, copied from the originating frame header.
    #[must_use]
    pub const fn stream_id(&self) -> i8 { self.stream_id }

    /// Tracing session id, present when the exchange was traced.
    #[must_use]
    pub const fn tracing_id(&self) -> Option<Uuid> { self.tracing_id }

    /// The response payload.
    #[must_use]
    pub const fn body(&self) -> &ResponseBody { &self.body }

    /// Consume the response, yielding its payload.
    #[must_use]
    pub fn into_body(self) -> ResponseBody { self.body }
}

#[cfg(test)]
mod tests;
