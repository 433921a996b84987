//! Protocol codec: typed requests to frames, frames to typed responses.
//!
//! Both halves are stateless beyond the negotiated protocol version and the
//! registry built at startup; calls may run fully in parallel across
//! connections and streams.
//!
//! Encoding follows a size-then-write two-step: the coder declares the
//! exact body size, the buffer is allocated at that size, and the coder
//! writes into it. A coder declaring the wrong size either truncates the
//! message or wastes buffer, so the equality is asserted here and
//! unit-tested per kind.
//!
//! Decoding consumes the frame by value: the body buffer, transport-owned
//! until this point, is dropped on every exit path — success, unknown
//! opcode, or a decoder failure partway through the body.

use bytes::BytesMut;

use crate::error::CodecError;
use crate::frame::{Flags, Frame, FrameHeader, ProtocolVersion};
use crate::message::{Request, Response, ResponseKind};
use crate::wire;

/// Encodes typed requests into frames under a fixed, negotiated protocol
/// version.
#[derive(Clone, Copy, Debug)]
pub struct ProtocolEncoder {
    version: ProtocolVersion,
}

impl ProtocolEncoder {
    /// Construct an encoder for the negotiated version.
    #[must_use]
    pub const fn new(version: ProtocolVersion) -> Self { Self { version } }

    /// The protocol version this encoder produces.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion { self.version }

    /// Encode a request into a complete frame.
    ///
    /// The frame header carries the request's opcode and stream id, and
    /// the TRACING flag exactly when tracing was requested.
    ///
    /// # Panics
    /// Panics when the request kind has no coder under the negotiated
    /// version (a protocol-negotiation bug; see
    /// [`crate::message::RequestKind::supported`]).
    #[must_use]
    pub fn encode(&self, request: &Request) -> Frame {
        let mut flags = Flags::empty();
        if request.is_tracing_requested() {
            flags.insert(Flags::TRACING);
        }

        let size = request.body().encoded_size(self.version);
        let mut body = BytesMut::with_capacity(size);
        request.body().encode(self.version, &mut body);
        debug_assert_eq!(
            body.len(),
            size,
            "coder for {:?} wrote a different size than it declared",
            request.kind()
        );

        tracing::trace!(
            kind = ?request.kind(),
            stream_id = request.stream_id(),
            size,
            "encoded request"
        );

        Frame::new(
            FrameHeader {
                version: self.version,
                flags,
                stream_id: request.stream_id(),
                opcode: request.kind().opcode(),
            },
            body.freeze(),
        )
    }
}

/// Decodes inbound frames into typed responses.
///
/// The version is read from each frame header rather than held here, so
/// one decoder instance serves mixed-version traffic during renegotiation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtocolDecoder;

impl ProtocolDecoder {
    /// Decode a frame into a typed response.
    ///
    /// When the frame's TRACING flag is set, a 16-byte tracing id is taken
    /// from the front of the body before kind dispatch; its placement is
    /// uniform across all response kinds. The response carries the frame's
    /// stream id and the tracing id (if any).
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownOpcode`] for opcodes outside the
    /// registered set and [`CodecError::Body`] for malformed bodies. The
    /// body buffer is released in every case.
    pub fn decode(&self, frame: Frame) -> Result<Response, CodecError> {
        let Frame { header, mut body } = frame;

        let tracing_id = if header.flags.contains(Flags::TRACING) {
            Some(wire::read_uuid(&mut body)?)
        } else {
            None
        };

        let kind = ResponseKind::from_opcode(header.opcode).inspect_err(|_| {
            tracing::debug!(
                opcode = header.opcode,
                stream_id = header.stream_id,
                "unknown response opcode"
            );
        })?;
        let response_body = kind.decode_body(header.version, &mut body)?;

        Ok(Response::new(header.stream_id, tracing_id, response_body))
    }
}
