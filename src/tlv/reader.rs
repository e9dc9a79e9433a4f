//! TLV reader
//!
//! Cursor-style decoder over an in-memory buffer of untrusted bytes.
//! `next()` advances element by element at the current container depth;
//! typed accessors materialize the current element's value. Any decode
//! failure poisons the reader: the cursor state after an error is not
//! meaningful, so every later call reports [`TlvError::ReaderPoisoned`]
//! until the caller re-initializes over the buffer.

use super::element::{ContainerType, ElementType, LengthWidth};
use super::tag::Tag;
use super::TlvError;

#[derive(Debug, Clone, Copy)]
struct Element {
    tag: Tag,
    element_type: ElementType,
    header_start: usize,
    value_start: usize,
    value_len: usize,
}

/// Decoder for the TLV wire format
///
/// A reader is a single-threaded sequential traversal over one buffer,
/// like an iterator; distinct readers over distinct buffers are fully
/// independent.
///
/// # Example
///
/// ```
/// use matter_fabric::tlv::{ContainerType, Tag, TlvReader};
///
/// // anonymous structure { context-1: uint 42 }
/// let bytes = [0x15, 0x24, 0x01, 0x2A, 0x18];
/// let mut r = TlvReader::new(&bytes);
/// assert!(r.next()?);
/// r.enter_container(ContainerType::Structure)?;
/// assert!(r.next()?);
/// assert_eq!(r.tag()?, Tag::Context(1));
/// assert_eq!(r.uint()?, 42);
/// r.exit_container()?;
/// # Ok::<(), matter_fabric::tlv::TlvError>(())
/// ```
#[derive(Debug)]
pub struct TlvReader<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: Vec<ContainerType>,
    current: Option<Element>,
    poisoned: bool,
}

impl<'a> TlvReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            depth: Vec::new(),
            current: None,
            poisoned: false,
        }
    }

    /// Current container nesting depth (0 at top level)
    pub fn depth(&self) -> usize {
        self.depth.len()
    }

    /// Byte offset of the current element's control byte
    pub fn element_offset(&self) -> Result<usize, TlvError> {
        Ok(self.current()?.header_start)
    }

    /// Advance to the next element at the current depth
    ///
    /// Returns `Ok(false)` at the end of the buffer (top level) or when the
    /// enclosing container's end marker is reached; call
    /// [`exit_container`](Self::exit_container) to move past the latter.
    /// A pending, un-entered container is skipped in full.
    pub fn next(&mut self) -> Result<bool, TlvError> {
        self.check_live()?;
        match self.advance() {
            Ok(more) => Ok(more),
            Err(e) => self.poison(e),
        }
    }

    /// Tag of the current element
    pub fn tag(&self) -> Result<Tag, TlvError> {
        Ok(self.current()?.tag)
    }

    /// Wire type of the current element
    pub fn element_type(&self) -> Result<ElementType, TlvError> {
        Ok(self.current()?.element_type)
    }

    /// Descend into the current element, which must start a container of
    /// the given kind
    pub fn enter_container(&mut self, kind: ContainerType) -> Result<(), TlvError> {
        let element = *self.current()?;
        if element.element_type != kind.element_type() {
            return self.poison(TlvError::TypeMismatch {
                expected: kind.name(),
                actual: element.element_type,
            });
        }
        self.depth.push(kind);
        self.current = None;
        Ok(())
    }

    /// Consume the rest of the enclosing container, including its end
    /// marker, and pop back to the parent depth
    pub fn exit_container(&mut self) -> Result<(), TlvError> {
        self.check_live()?;
        if self.depth.is_empty() {
            return Err(TlvError::NoContainerToExit);
        }
        if let Err(e) = self.finish_current().and_then(|_| self.consume_to_container_end()) {
            return self.poison(e);
        }
        self.depth.pop();
        self.current = None;
        Ok(())
    }

    /// Discard the current element without materializing it, descending
    /// into and fully consuming any container it opens
    ///
    /// Required for forward compatibility: unknown tags are passed over,
    /// not rejected.
    pub fn skip(&mut self) -> Result<(), TlvError> {
        self.current()?;
        if let Err(e) = self.finish_current() {
            return self.poison(e);
        }
        self.current = None;
        Ok(())
    }

    /// Unsigned integer value of the current element
    pub fn uint(&mut self) -> Result<u64, TlvError> {
        let element = *self.current()?;
        match element.element_type {
            ElementType::UInt(_) => Ok(read_le_unsigned(self.value_slice(&element))),
            actual => self.poison(TlvError::TypeMismatch {
                expected: "unsigned integer",
                actual,
            }),
        }
    }

    /// Signed integer value of the current element
    pub fn int(&mut self) -> Result<i64, TlvError> {
        let element = *self.current()?;
        match element.element_type {
            ElementType::Int(_) => Ok(read_le_signed(self.value_slice(&element))),
            actual => self.poison(TlvError::TypeMismatch {
                expected: "signed integer",
                actual,
            }),
        }
    }

    /// Boolean value of the current element
    pub fn bool(&mut self) -> Result<bool, TlvError> {
        let element = *self.current()?;
        match element.element_type {
            ElementType::BoolTrue => Ok(true),
            ElementType::BoolFalse => Ok(false),
            actual => self.poison(TlvError::TypeMismatch {
                expected: "boolean",
                actual,
            }),
        }
    }

    /// UTF-8 string value of the current element
    pub fn string(&mut self) -> Result<&'a str, TlvError> {
        let element = *self.current()?;
        match element.element_type {
            ElementType::Utf8String(_) => match std::str::from_utf8(self.value_slice(&element)) {
                Ok(s) => Ok(s),
                Err(_) => self.poison(TlvError::InvalidUtf8),
            },
            actual => self.poison(TlvError::TypeMismatch {
                expected: "UTF-8 string",
                actual,
            }),
        }
    }

    /// Octet-string value of the current element
    pub fn bytes(&mut self) -> Result<&'a [u8], TlvError> {
        let element = *self.current()?;
        match element.element_type {
            ElementType::ByteString(_) => Ok(self.value_slice(&element)),
            actual => self.poison(TlvError::TypeMismatch {
                expected: "byte string",
                actual,
            }),
        }
    }

    /// Single-precision float value of the current element
    pub fn f32(&mut self) -> Result<f32, TlvError> {
        let element = *self.current()?;
        match element.element_type {
            ElementType::Float32 => {
                let v = self.value_slice(&element);
                Ok(f32::from_le_bytes([v[0], v[1], v[2], v[3]]))
            }
            actual => self.poison(TlvError::TypeMismatch {
                expected: "float32",
                actual,
            }),
        }
    }

    /// Double-precision float value of the current element
    pub fn f64(&mut self) -> Result<f64, TlvError> {
        let element = *self.current()?;
        match element.element_type {
            ElementType::Float64 => {
                let v = self.value_slice(&element);
                Ok(f64::from_le_bytes([
                    v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7],
                ]))
            }
            actual => self.poison(TlvError::TypeMismatch {
                expected: "float64",
                actual,
            }),
        }
    }

    fn check_live(&self) -> Result<(), TlvError> {
        if self.poisoned {
            Err(TlvError::ReaderPoisoned)
        } else {
            Ok(())
        }
    }

    fn current(&self) -> Result<&Element, TlvError> {
        self.check_live()?;
        self.current.as_ref().ok_or(TlvError::NoCurrentElement)
    }

    fn poison<T>(&mut self, e: TlvError) -> Result<T, TlvError> {
        self.poisoned = true;
        self.current = None;
        Err(e)
    }

    fn value_slice(&self, element: &Element) -> &'a [u8] {
        // Bounds were checked when the head was parsed
        &self.buf[element.value_start..element.value_start + element.value_len]
    }

    fn advance(&mut self) -> Result<bool, TlvError> {
        self.finish_current()?;
        self.current = None;
        if self.pos >= self.buf.len() {
            if !self.depth.is_empty() {
                return Err(TlvError::UnterminatedContainer);
            }
            return Ok(false);
        }
        let head_start = self.pos;
        let element = self.read_head()?;
        if element.element_type == ElementType::EndOfContainer {
            if self.depth.is_empty() {
                return Err(TlvError::UnexpectedEndOfContainer);
            }
            // Leave the cursor on the marker for exit_container()
            self.pos = head_start;
            return Ok(false);
        }
        self.current = Some(element);
        Ok(true)
    }

    /// Consume whatever remains of the current element. A pending
    /// container that was never entered is skipped body and all.
    fn finish_current(&mut self) -> Result<(), TlvError> {
        if let Some(element) = self.current {
            if element.element_type.is_container() {
                self.consume_to_container_end()?;
            }
        }
        Ok(())
    }

    /// Consume elements until the end marker matching the present depth,
    /// including the marker itself
    fn consume_to_container_end(&mut self) -> Result<(), TlvError> {
        let mut nesting = 1usize;
        while nesting > 0 {
            if self.pos >= self.buf.len() {
                return Err(TlvError::UnterminatedContainer);
            }
            let element = self.read_head()?;
            match element.element_type {
                ElementType::EndOfContainer => nesting -= 1,
                t if t.is_container() => nesting += 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Decode one element head at the cursor: control byte, tag bytes and,
    /// for primitives, the value span. The cursor lands past the value for
    /// primitives and on the first child for containers.
    fn read_head(&mut self) -> Result<Element, TlvError> {
        let header_start = self.pos;
        let control = *self
            .buf
            .get(self.pos)
            .ok_or(TlvError::UnexpectedEndOfBuffer)?;
        let element_type = ElementType::from_bits(control & super::ELEMENT_TYPE_MASK)
            .map_err(|_| TlvError::InvalidControlByte(control))?;
        if element_type == ElementType::EndOfContainer && control & super::TAG_CONTROL_MASK != 0 {
            return Err(TlvError::InvalidControlByte(control));
        }
        self.pos += 1;
        let (tag, tag_len) = Tag::read_bytes(control, &self.buf[self.pos..])?;
        self.pos += tag_len;

        let (value_start, value_len) = match element_type {
            ElementType::Int(w) | ElementType::UInt(w) => self.take_value(w.byte_len())?,
            ElementType::Float32 => self.take_value(4)?,
            ElementType::Float64 => self.take_value(8)?,
            ElementType::Utf8String(w) | ElementType::ByteString(w) => {
                let len = self.read_length(w)?;
                self.take_value(len)?
            }
            ElementType::BoolFalse
            | ElementType::BoolTrue
            | ElementType::Null
            | ElementType::EndOfContainer
            | ElementType::Structure
            | ElementType::Array
            | ElementType::List => (self.pos, 0),
        };

        Ok(Element {
            tag,
            element_type,
            header_start,
            value_start,
            value_len,
        })
    }

    fn take_value(&mut self, len: usize) -> Result<(usize, usize), TlvError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(TlvError::LengthOverflow(len as u64))?;
        if end > self.buf.len() {
            return Err(TlvError::UnexpectedEndOfBuffer);
        }
        let start = self.pos;
        self.pos = end;
        Ok((start, len))
    }

    fn read_length(&mut self, width: LengthWidth) -> Result<usize, TlvError> {
        let (start, len) = self.take_value(width.byte_len())?;
        let raw = read_le_unsigned(&self.buf[start..start + len]);
        usize::try_from(raw).map_err(|_| TlvError::LengthOverflow(raw))
    }
}

fn read_le_unsigned(bytes: &[u8]) -> u64 {
    let mut out = [0u8; 8];
    out[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(out)
}

fn read_le_signed(bytes: &[u8]) -> i64 {
    let fill = if bytes.last().is_some_and(|b| b & 0x80 != 0) {
        0xFF
    } else {
        0x00
    };
    let mut out = [fill; 8];
    out[..bytes.len()].copy_from_slice(bytes);
    i64::from_le_bytes(out)
}

#[cfg(test)]
mod tests {
    use super::super::writer::TlvWriter;
    use super::*;

    #[test]
    fn test_flat_elements() {
        let mut w = TlvWriter::new();
        w.put_u64(Tag::Context(1), 42);
        w.put_i64(Tag::Context(2), -7);
        w.put_bool(Tag::Context(3), true);
        w.put_string(Tag::Context(4), "abc");
        w.put_bytes(Tag::Context(5), &[1, 2, 3]);
        w.put_null(Tag::Context(6));
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        assert!(r.next().unwrap());
        assert_eq!(r.tag().unwrap(), Tag::Context(1));
        assert_eq!(r.uint().unwrap(), 42);
        assert!(r.next().unwrap());
        assert_eq!(r.int().unwrap(), -7);
        assert!(r.next().unwrap());
        assert!(r.bool().unwrap());
        assert!(r.next().unwrap());
        assert_eq!(r.string().unwrap(), "abc");
        assert!(r.next().unwrap());
        assert_eq!(r.bytes().unwrap(), &[1, 2, 3]);
        assert!(r.next().unwrap());
        assert_eq!(r.element_type().unwrap(), ElementType::Null);
        assert!(!r.next().unwrap());
    }

    #[test]
    fn test_nested_containers() {
        let mut w = TlvWriter::new();
        w.start_structure(Tag::Anonymous);
        w.start_array(Tag::Context(1));
        w.put_u64(Tag::Anonymous, 10);
        w.put_u64(Tag::Anonymous, 20);
        w.end_container();
        w.put_string(Tag::Context(2), "tail");
        w.end_container();
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        assert!(r.next().unwrap());
        r.enter_container(ContainerType::Structure).unwrap();
        assert!(r.next().unwrap());
        r.enter_container(ContainerType::Array).unwrap();
        assert!(r.next().unwrap());
        assert_eq!(r.uint().unwrap(), 10);
        assert!(r.next().unwrap());
        assert_eq!(r.uint().unwrap(), 20);
        assert!(!r.next().unwrap());
        r.exit_container().unwrap();
        assert!(r.next().unwrap());
        assert_eq!(r.string().unwrap(), "tail");
        assert!(!r.next().unwrap());
        r.exit_container().unwrap();
        assert!(!r.next().unwrap());
    }

    #[test]
    fn test_next_skips_unentered_container() {
        let mut w = TlvWriter::new();
        w.start_structure(Tag::Context(1));
        w.start_list(Tag::Context(9));
        w.put_u64(Tag::Context(1), 1);
        w.end_container();
        w.end_container();
        w.put_u64(Tag::Context(2), 99);
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        assert!(r.next().unwrap()); // the structure; never entered
        assert!(r.next().unwrap()); // skips over it entirely
        assert_eq!(r.tag().unwrap(), Tag::Context(2));
        assert_eq!(r.uint().unwrap(), 99);
    }

    #[test]
    fn test_exit_consumes_remaining_elements() {
        let mut w = TlvWriter::new();
        w.start_structure(Tag::Anonymous);
        w.put_u64(Tag::Context(1), 1);
        w.put_u64(Tag::Context(2), 2);
        w.put_u64(Tag::Context(3), 3);
        w.end_container();
        w.put_bool(Tag::Anonymous, true);
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        assert!(r.next().unwrap());
        r.enter_container(ContainerType::Structure).unwrap();
        assert!(r.next().unwrap()); // only the first field
        r.exit_container().unwrap();
        assert!(r.next().unwrap());
        assert!(r.bool().unwrap());
    }

    #[test]
    fn test_accessor_type_mismatch() {
        let mut w = TlvWriter::new();
        w.put_u64(Tag::Context(1), 5);
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        r.next().unwrap();
        let err = r.string().unwrap_err();
        assert!(matches!(err, TlvError::TypeMismatch { .. }));
        // reader is poisoned afterwards
        assert_eq!(r.next(), Err(TlvError::ReaderPoisoned));
    }

    #[test]
    fn test_enter_wrong_container_type() {
        let mut w = TlvWriter::new();
        w.start_array(Tag::Anonymous);
        w.end_container();
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        r.next().unwrap();
        let err = r.enter_container(ContainerType::Structure).unwrap_err();
        assert!(matches!(err, TlvError::TypeMismatch { .. }));
    }

    #[test]
    fn test_stray_end_of_container() {
        let mut r = TlvReader::new(&[0x18]);
        assert_eq!(r.next(), Err(TlvError::UnexpectedEndOfContainer));
    }

    #[test]
    fn test_end_of_container_with_tag_rejected() {
        // end-of-container must use the anonymous form
        let mut r = TlvReader::new(&[0x15, 0x38, 0x01]);
        r.next().unwrap();
        r.enter_container(ContainerType::Structure).unwrap();
        assert!(r.next().is_err());
    }

    #[test]
    fn test_reserved_element_type_reports_full_control_byte() {
        // context tag bits set plus reserved type 0x1B
        let mut r = TlvReader::new(&[0x3B]);
        assert_eq!(r.next(), Err(TlvError::InvalidControlByte(0x3B)));
    }

    #[test]
    fn test_unterminated_container() {
        let bytes = [0x15, 0x24, 0x01, 0x2A]; // structure, field, no end marker
        let mut r = TlvReader::new(&bytes);
        r.next().unwrap();
        r.enter_container(ContainerType::Structure).unwrap();
        r.next().unwrap();
        assert_eq!(r.next(), Err(TlvError::UnterminatedContainer));
    }

    #[test]
    fn test_truncation_at_every_boundary() {
        let mut w = TlvWriter::new();
        w.start_structure(Tag::Anonymous);
        w.put_u64(Tag::Context(1), 0x1234_5678);
        w.put_string(Tag::Context(2), "hello");
        w.start_array(Tag::Context(3));
        w.put_i64(Tag::Anonymous, -42);
        w.end_container();
        w.end_container();
        let bytes = w.finish();

        for cut in 0..bytes.len() {
            let truncated = &bytes[..cut];
            let mut r = TlvReader::new(truncated);
            // drain; must end in Ok(false) (cut == 0) or an error, never panic
            let mut result = Ok(());
            loop {
                match r.next() {
                    Ok(true) => {
                        if r.element_type().unwrap().is_container() {
                            // enter to force traversal of nested content
                            let kind = match r.element_type().unwrap() {
                                ElementType::Structure => ContainerType::Structure,
                                ElementType::Array => ContainerType::Array,
                                _ => ContainerType::List,
                            };
                            if let Err(e) = r.enter_container(kind) {
                                result = Err(e);
                                break;
                            }
                        }
                    }
                    Ok(false) => {
                        if r.depth() == 0 {
                            break;
                        }
                        if let Err(e) = r.exit_container() {
                            result = Err(e);
                            break;
                        }
                    }
                    Err(e) => {
                        result = Err(e);
                        break;
                    }
                }
            }
            if cut > 0 {
                assert!(result.is_err(), "cut at {cut} decoded cleanly");
            }
        }
    }

    #[test]
    fn test_reencode_is_idempotent() {
        let mut w = TlvWriter::new();
        w.start_structure(Tag::Anonymous);
        w.put_u64(Tag::Context(1), 300);
        w.put_i64(Tag::Context(2), -2);
        w.end_container();
        let first = w.finish();

        let mut r = TlvReader::new(&first);
        r.next().unwrap();
        r.enter_container(ContainerType::Structure).unwrap();
        let mut w2 = TlvWriter::new();
        w2.start_structure(Tag::Anonymous);
        r.next().unwrap();
        w2.put_u64(r.tag().unwrap(), r.uint().unwrap());
        r.next().unwrap();
        w2.put_i64(r.tag().unwrap(), r.int().unwrap());
        w2.end_container();
        assert_eq!(w2.finish(), first);
    }

    #[test]
    fn test_float_roundtrip() {
        let mut w = TlvWriter::new();
        w.put_f32(Tag::Context(1), 1.5);
        w.put_f64(Tag::Context(2), -2.25);
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        r.next().unwrap();
        assert_eq!(r.f32().unwrap(), 1.5);
        r.next().unwrap();
        assert_eq!(r.f64().unwrap(), -2.25);
    }

    #[test]
    fn test_profile_qualified_tags_roundtrip() {
        let tag = Tag::FullyQualified64 {
            vendor_id: 0xFFF1,
            profile: 0xDEED,
            tag: 0x1234_5678,
        };
        let mut w = TlvWriter::new();
        w.put_u64(tag, 17);
        let bytes = w.finish();

        let mut r = TlvReader::new(&bytes);
        r.next().unwrap();
        assert_eq!(r.tag().unwrap(), tag);
        assert_eq!(r.uint().unwrap(), 17);
    }
}
