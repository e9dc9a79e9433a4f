//! Matter TLV wire codec
//!
//! This module implements the tagged, nested, self-describing binary
//! serialization format used by every message, attribute, command and
//! certificate in the system. All multi-byte integers, lengths and tag
//! numbers are little-endian as specified by the Matter TLV encoding.
//!
//! ## Element layout
//!
//! ```text
//! ┌──────────────┬───────────────┬──────────────────────────┐
//! │ Control (1B) │ Tag (0-8B)    │ Length + Value (varies)  │
//! └──────────────┴───────────────┴──────────────────────────┘
//! ```
//!
//! The control byte combines a 3-bit tag form (upper bits) with a 5-bit
//! element type (lower bits). Containers carry no length; they run until
//! a matching end-of-container control byte.

use thiserror::Error;

pub mod element;
pub mod reader;
pub mod tag;
pub mod writer;

pub use element::{ContainerType, ElementType, LengthWidth};
pub use reader::TlvReader;
pub use tag::Tag;
pub use writer::TlvWriter;

/// Mask selecting the tag-form bits of a control byte
pub const TAG_CONTROL_MASK: u8 = 0xE0;

/// Mask selecting the element-type bits of a control byte
pub const ELEMENT_TYPE_MASK: u8 = 0x1F;

/// Errors produced while decoding TLV from untrusted bytes
///
/// Every malformed or truncated input path maps to one of these variants;
/// the codec never panics on wire data. After any error the reader is
/// poisoned and further calls return [`TlvError::ReaderPoisoned`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TlvError {
    #[error("unexpected end of buffer")]
    UnexpectedEndOfBuffer,

    #[error("invalid control byte: 0x{0:02X}")]
    InvalidControlByte(u8),

    #[error("end-of-container with no open container")]
    UnexpectedEndOfContainer,

    #[error("buffer ended inside an open container")]
    UnterminatedContainer,

    #[error("expected {expected}, found {actual:?}")]
    TypeMismatch {
        expected: &'static str,
        actual: ElementType,
    },

    #[error("no current element; call next() first")]
    NoCurrentElement,

    #[error("exit_container() with no container entered")]
    NoContainerToExit,

    #[error("string element is not valid UTF-8")]
    InvalidUtf8,

    #[error("declared length {0} exceeds addressable memory")]
    LengthOverflow(u64),

    #[error("reader poisoned by a previous decode error")]
    ReaderPoisoned,
}
