//! TLV tags
//!
//! A tag names an element within its enclosing container. The upper 3 bits
//! of the control byte select the tag form; the tag's own bytes follow the
//! control byte, little-endian.
//!
//! Only anonymous and context tags appear in this system's own traffic,
//! but all forms decode for forward compatibility.

use super::TlvError;

/// Tag form and value of one TLV element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// No identity; valid only inside arrays and lists
    Anonymous,
    /// 1-byte number, unique within the enclosing structure
    Context(u8),
    /// Common-profile tag, 16-bit number
    CommonProfile16(u16),
    /// Common-profile tag, 32-bit number
    CommonProfile32(u32),
    /// Implicit-profile tag, 16-bit number
    ImplicitProfile16(u16),
    /// Implicit-profile tag, 32-bit number
    ImplicitProfile32(u32),
    /// Fully-qualified tag with 16-bit tag number (6 tag bytes)
    FullyQualified48 {
        vendor_id: u16,
        profile: u16,
        tag: u16,
    },
    /// Fully-qualified tag with 32-bit tag number (8 tag bytes)
    FullyQualified64 {
        vendor_id: u16,
        profile: u16,
        tag: u32,
    },
}

impl Tag {
    /// Tag-form bits for the control byte (upper 3 bits)
    pub fn control_bits(self) -> u8 {
        match self {
            Tag::Anonymous => 0x00,
            Tag::Context(_) => 0x20,
            Tag::CommonProfile16(_) => 0x40,
            Tag::CommonProfile32(_) => 0x60,
            Tag::ImplicitProfile16(_) => 0x80,
            Tag::ImplicitProfile32(_) => 0xA0,
            Tag::FullyQualified48 { .. } => 0xC0,
            Tag::FullyQualified64 { .. } => 0xE0,
        }
    }

    /// Number of tag bytes following the control byte
    pub fn encoded_len(self) -> usize {
        match self {
            Tag::Anonymous => 0,
            Tag::Context(_) => 1,
            Tag::CommonProfile16(_) | Tag::ImplicitProfile16(_) => 2,
            Tag::CommonProfile32(_) | Tag::ImplicitProfile32(_) => 4,
            Tag::FullyQualified48 { .. } => 6,
            Tag::FullyQualified64 { .. } => 8,
        }
    }

    /// Append this tag's bytes (not the control byte) to `out`
    pub(crate) fn write_bytes(self, out: &mut Vec<u8>) {
        match self {
            Tag::Anonymous => {}
            Tag::Context(n) => out.push(n),
            Tag::CommonProfile16(n) | Tag::ImplicitProfile16(n) => {
                out.extend_from_slice(&n.to_le_bytes())
            }
            Tag::CommonProfile32(n) | Tag::ImplicitProfile32(n) => {
                out.extend_from_slice(&n.to_le_bytes())
            }
            Tag::FullyQualified48 {
                vendor_id,
                profile,
                tag,
            } => {
                out.extend_from_slice(&vendor_id.to_le_bytes());
                out.extend_from_slice(&profile.to_le_bytes());
                out.extend_from_slice(&tag.to_le_bytes());
            }
            Tag::FullyQualified64 {
                vendor_id,
                profile,
                tag,
            } => {
                out.extend_from_slice(&vendor_id.to_le_bytes());
                out.extend_from_slice(&profile.to_le_bytes());
                out.extend_from_slice(&tag.to_le_bytes());
            }
        }
    }

    /// Decode the tag bytes selected by `control` from the front of `buf`
    ///
    /// Returns the tag and the number of bytes consumed.
    pub(crate) fn read_bytes(control: u8, buf: &[u8]) -> Result<(Self, usize), TlvError> {
        let form = control & super::TAG_CONTROL_MASK;
        let need = match form {
            0x00 => 0,
            0x20 => 1,
            0x40 | 0x80 => 2,
            0x60 | 0xA0 => 4,
            0xC0 => 6,
            0xE0 => 8,
            _ => unreachable!("3-bit tag form"),
        };
        if buf.len() < need {
            return Err(TlvError::UnexpectedEndOfBuffer);
        }
        let tag = match form {
            0x00 => Tag::Anonymous,
            0x20 => Tag::Context(buf[0]),
            0x40 => Tag::CommonProfile16(u16::from_le_bytes([buf[0], buf[1]])),
            0x60 => Tag::CommonProfile32(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
            0x80 => Tag::ImplicitProfile16(u16::from_le_bytes([buf[0], buf[1]])),
            0xA0 => Tag::ImplicitProfile32(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
            0xC0 => Tag::FullyQualified48 {
                vendor_id: u16::from_le_bytes([buf[0], buf[1]]),
                profile: u16::from_le_bytes([buf[2], buf[3]]),
                tag: u16::from_le_bytes([buf[4], buf[5]]),
            },
            0xE0 => Tag::FullyQualified64 {
                vendor_id: u16::from_le_bytes([buf[0], buf[1]]),
                profile: u16::from_le_bytes([buf[2], buf[3]]),
                tag: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            },
            _ => unreachable!(),
        };
        Ok((tag, need))
    }
}
