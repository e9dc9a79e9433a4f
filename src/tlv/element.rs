//! TLV element types
//!
//! The lower 5 bits of every control byte select one of these element
//! types. Integer, string and byte-string types exist in four widths;
//! the width is part of the wire type, not of the logical value.

use super::TlvError;

/// Width of an integer value or of a string/byte-string length field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthWidth {
    One,
    Two,
    Four,
    Eight,
}

impl LengthWidth {
    /// Number of value (or length-field) bytes on the wire
    pub fn byte_len(self) -> usize {
        match self {
            LengthWidth::One => 1,
            LengthWidth::Two => 2,
            LengthWidth::Four => 4,
            LengthWidth::Eight => 8,
        }
    }

    /// Offset of this width within a 4-variant type group (0..=3)
    fn to_bits(self) -> u8 {
        match self {
            LengthWidth::One => 0,
            LengthWidth::Two => 1,
            LengthWidth::Four => 2,
            LengthWidth::Eight => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => LengthWidth::One,
            1 => LengthWidth::Two,
            2 => LengthWidth::Four,
            _ => LengthWidth::Eight,
        }
    }

    /// Narrowest width able to hold an unsigned value
    pub fn for_unsigned(value: u64) -> Self {
        if value <= u8::MAX as u64 {
            LengthWidth::One
        } else if value <= u16::MAX as u64 {
            LengthWidth::Two
        } else if value <= u32::MAX as u64 {
            LengthWidth::Four
        } else {
            LengthWidth::Eight
        }
    }

    /// Narrowest width able to hold a signed value
    pub fn for_signed(value: i64) -> Self {
        if value >= i8::MIN as i64 && value <= i8::MAX as i64 {
            LengthWidth::One
        } else if value >= i16::MIN as i64 && value <= i16::MAX as i64 {
            LengthWidth::Two
        } else if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
            LengthWidth::Four
        } else {
            LengthWidth::Eight
        }
    }
}

/// The three TLV container kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerType {
    Structure,
    Array,
    List,
}

impl ContainerType {
    pub(crate) fn element_type(self) -> ElementType {
        match self {
            ContainerType::Structure => ElementType::Structure,
            ContainerType::Array => ElementType::Array,
            ContainerType::List => ElementType::List,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            ContainerType::Structure => "structure",
            ContainerType::Array => "array",
            ContainerType::List => "list",
        }
    }
}

/// TLV element type, as selected by the low 5 bits of a control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Signed integer, two's complement, little-endian
    Int(LengthWidth),
    /// Unsigned integer, little-endian
    UInt(LengthWidth),
    BoolFalse,
    BoolTrue,
    Float32,
    Float64,
    /// UTF-8 string with a length field of the given width
    Utf8String(LengthWidth),
    /// Octet string with a length field of the given width
    ByteString(LengthWidth),
    Null,
    Structure,
    Array,
    List,
    EndOfContainer,
}

impl ElementType {
    /// Parse from the low 5 bits of a control byte
    pub fn from_bits(bits: u8) -> Result<Self, TlvError> {
        match bits & super::ELEMENT_TYPE_MASK {
            b @ 0x00..=0x03 => Ok(ElementType::Int(LengthWidth::from_bits(b))),
            b @ 0x04..=0x07 => Ok(ElementType::UInt(LengthWidth::from_bits(b))),
            0x08 => Ok(ElementType::BoolFalse),
            0x09 => Ok(ElementType::BoolTrue),
            0x0A => Ok(ElementType::Float32),
            0x0B => Ok(ElementType::Float64),
            b @ 0x0C..=0x0F => Ok(ElementType::Utf8String(LengthWidth::from_bits(b))),
            b @ 0x10..=0x13 => Ok(ElementType::ByteString(LengthWidth::from_bits(b))),
            0x14 => Ok(ElementType::Null),
            0x15 => Ok(ElementType::Structure),
            0x16 => Ok(ElementType::Array),
            0x17 => Ok(ElementType::List),
            0x18 => Ok(ElementType::EndOfContainer),
            b => Err(TlvError::InvalidControlByte(b)),
        }
    }

    /// Convert to the low 5 bits of a control byte
    pub fn to_bits(self) -> u8 {
        match self {
            ElementType::Int(w) => w.to_bits(),
            ElementType::UInt(w) => 0x04 | w.to_bits(),
            ElementType::BoolFalse => 0x08,
            ElementType::BoolTrue => 0x09,
            ElementType::Float32 => 0x0A,
            ElementType::Float64 => 0x0B,
            ElementType::Utf8String(w) => 0x0C | w.to_bits(),
            ElementType::ByteString(w) => 0x10 | w.to_bits(),
            ElementType::Null => 0x14,
            ElementType::Structure => 0x15,
            ElementType::Array => 0x16,
            ElementType::List => 0x17,
            ElementType::EndOfContainer => 0x18,
        }
    }

    /// True for structure, array and list starts
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ElementType::Structure | ElementType::Array | ElementType::List
        )
    }
}
