//! Message framing core for a CQL binary-protocol client.
//!
//! This crate is the chokepoint between typed client messages and the
//! bytes on the wire: it turns requests into frames and response frames
//! back into typed objects across protocol versions 1 and 2, whose
//! on-wire layouts differ. Opcode dispatch, version-indexed coders, and
//! exact-size body encoding all live here; the transport, retry policy,
//! and CQL type system live in the embedding client.
//!
//! It also provides [`gauge::DecayingGauge`], a lock-free exponentially
//! time-decayed percentage with a hysteresis-debounced classification,
//! used by pool and health-signal logic to make operational decisions
//! without flapping.

pub mod codec;
pub mod error;
pub mod frame;
pub mod gauge;
pub mod message;
pub mod request;
pub mod response;
pub mod wire;

pub use codec::{ProtocolDecoder, ProtocolEncoder};
pub use error::{BodyError, CodecError, FrameError};
pub use frame::{Flags, Frame, FrameCodec, FrameHeader, ProtocolVersion};
pub use gauge::DecayingGauge;
pub use message::{Request, RequestKind, Response, ResponseKind};
pub use wire::Consistency;
