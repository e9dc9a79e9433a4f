//! TLV writer
//!
//! Cursor-style encoder appending one element per call to a growable
//! buffer. Integers and length fields always use the narrowest width that
//! losslessly represents the value, so re-encoding a decoded value is
//! byte-identical.

use super::element::{ContainerType, ElementType, LengthWidth};
use super::tag::Tag;

/// Encoder for the TLV wire format
///
/// The writer tracks an explicit container stack. Closing a container that
/// was never opened, or finishing with containers still open, is a
/// programming-contract violation and panics; wire-level failures cannot
/// occur on the encode path.
///
/// # Example
///
/// ```
/// use matter_fabric::tlv::{Tag, TlvWriter};
///
/// let mut w = TlvWriter::new();
/// w.start_structure(Tag::Anonymous);
/// w.put_u64(Tag::Context(1), 42);
/// w.end_container();
/// let bytes = w.finish();
/// assert_eq!(bytes, vec![0x15, 0x24, 0x01, 0x2A, 0x18]);
/// ```
#[derive(Debug, Default)]
pub struct TlvWriter {
    buf: Vec<u8>,
    depth: Vec<ContainerType>,
}

impl TlvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded bytes so far
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return the encoding
    ///
    /// # Panics
    ///
    /// Panics if any container is still open.
    pub fn finish(self) -> Vec<u8> {
        assert!(
            self.depth.is_empty(),
            "TlvWriter::finish() with {} unclosed container(s)",
            self.depth.len()
        );
        self.buf
    }

    fn put_control(&mut self, tag: Tag, element_type: ElementType) {
        self.buf.push(tag.control_bits() | element_type.to_bits());
        tag.write_bytes(&mut self.buf);
    }

    /// Open a structure container
    pub fn start_structure(&mut self, tag: Tag) {
        self.put_control(tag, ElementType::Structure);
        self.depth.push(ContainerType::Structure);
    }

    /// Open an array container
    pub fn start_array(&mut self, tag: Tag) {
        self.put_control(tag, ElementType::Array);
        self.depth.push(ContainerType::Array);
    }

    /// Open a list container
    pub fn start_list(&mut self, tag: Tag) {
        self.put_control(tag, ElementType::List);
        self.depth.push(ContainerType::List);
    }

    /// Close the innermost open container
    ///
    /// # Panics
    ///
    /// Panics if no container is open. That is a caller logic error, not a
    /// wire error.
    pub fn end_container(&mut self) {
        assert!(
            self.depth.pop().is_some(),
            "TlvWriter::end_container() with no open container"
        );
        self.buf.push(ElementType::EndOfContainer.to_bits());
    }

    /// Append an unsigned integer using the narrowest lossless width
    pub fn put_u64(&mut self, tag: Tag, value: u64) {
        let width = LengthWidth::for_unsigned(value);
        self.put_control(tag, ElementType::UInt(width));
        self.buf
            .extend_from_slice(&value.to_le_bytes()[..width.byte_len()]);
    }

    /// Append a signed integer using the narrowest lossless width
    pub fn put_i64(&mut self, tag: Tag, value: i64) {
        let width = LengthWidth::for_signed(value);
        self.put_control(tag, ElementType::Int(width));
        self.buf
            .extend_from_slice(&value.to_le_bytes()[..width.byte_len()]);
    }

    /// Append a boolean; the value lives in the element type itself
    pub fn put_bool(&mut self, tag: Tag, value: bool) {
        let et = if value {
            ElementType::BoolTrue
        } else {
            ElementType::BoolFalse
        };
        self.put_control(tag, et);
    }

    /// Append a UTF-8 string with a narrowest-width length field
    pub fn put_string(&mut self, tag: Tag, value: &str) {
        let width = LengthWidth::for_unsigned(value.len() as u64);
        self.put_control(tag, ElementType::Utf8String(width));
        self.put_length(value.len(), width);
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Append an octet string with a narrowest-width length field
    pub fn put_bytes(&mut self, tag: Tag, value: &[u8]) {
        let width = LengthWidth::for_unsigned(value.len() as u64);
        self.put_control(tag, ElementType::ByteString(width));
        self.put_length(value.len(), width);
        self.buf.extend_from_slice(value);
    }

    /// Append an explicit null element
    pub fn put_null(&mut self, tag: Tag) {
        self.put_control(tag, ElementType::Null);
    }

    /// Append an IEEE-754 single-precision float
    pub fn put_f32(&mut self, tag: Tag, value: f32) {
        self.put_control(tag, ElementType::Float32);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append an IEEE-754 double-precision float
    pub fn put_f64(&mut self, tag: Tag, value: f64) {
        self.put_control(tag, ElementType::Float64);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_length(&mut self, len: usize, width: LengthWidth) {
        self.buf
            .extend_from_slice(&(len as u64).to_le_bytes()[..width.byte_len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_width_uint() {
        let mut w = TlvWriter::new();
        w.put_u64(Tag::Context(1), 0x2A);
        // control 0x24 (context | UInt8), tag 0x01, value 0x2A
        assert_eq!(w.finish(), vec![0x24, 0x01, 0x2A]);

        let mut w = TlvWriter::new();
        w.put_u64(Tag::Context(1), 0x1234);
        assert_eq!(w.finish(), vec![0x25, 0x01, 0x34, 0x12]);

        let mut w = TlvWriter::new();
        w.put_u64(Tag::Anonymous, 0xDEAD_BEEF);
        assert_eq!(w.finish(), vec![0x06, 0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn test_minimal_width_int() {
        let mut w = TlvWriter::new();
        w.put_i64(Tag::Context(2), -1);
        assert_eq!(w.finish(), vec![0x20, 0x02, 0xFF]);

        let mut w = TlvWriter::new();
        w.put_i64(Tag::Context(2), -300);
        assert_eq!(w.finish(), vec![0x21, 0x02, 0xD4, 0xFE]);
    }

    #[test]
    fn test_bool_encoding() {
        let mut w = TlvWriter::new();
        w.put_bool(Tag::Context(3), false);
        w.put_bool(Tag::Context(3), true);
        assert_eq!(w.finish(), vec![0x28, 0x03, 0x29, 0x03]);
    }

    #[test]
    fn test_string_and_bytes() {
        let mut w = TlvWriter::new();
        w.put_string(Tag::Anonymous, "hi");
        assert_eq!(w.finish(), vec![0x0C, 0x02, b'h', b'i']);

        let mut w = TlvWriter::new();
        w.put_bytes(Tag::Context(9), &[0xAA, 0xBB]);
        assert_eq!(w.finish(), vec![0x30, 0x09, 0x02, 0xAA, 0xBB]);
    }

    #[test]
    fn test_two_byte_length_field() {
        let payload = vec![0x55u8; 300];
        let mut w = TlvWriter::new();
        w.put_bytes(Tag::Anonymous, &payload);
        let bytes = w.finish();
        // ByteString with 2-byte length: 0x11, then 300 LE
        assert_eq!(&bytes[..3], &[0x11, 0x2C, 0x01]);
        assert_eq!(bytes.len(), 3 + 300);
    }

    #[test]
    fn test_nested_containers() {
        let mut w = TlvWriter::new();
        w.start_structure(Tag::Anonymous);
        w.start_array(Tag::Context(1));
        w.put_u64(Tag::Anonymous, 1);
        w.end_container();
        w.end_container();
        assert_eq!(
            w.finish(),
            vec![0x15, 0x36, 0x01, 0x04, 0x01, 0x18, 0x18]
        );
    }

    #[test]
    #[should_panic(expected = "no open container")]
    fn test_end_container_underflow_panics() {
        let mut w = TlvWriter::new();
        w.end_container();
    }

    #[test]
    #[should_panic(expected = "unclosed container")]
    fn test_finish_with_open_container_panics() {
        let mut w = TlvWriter::new();
        w.start_structure(Tag::Anonymous);
        let _ = w.finish();
    }
}
