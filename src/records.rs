//! Credential-storage wire records
//!
//! Thin TLV-codable records consumed by the credential-storage attribute
//! surface. An optional field on the wire has three states, and callers
//! need all three: *absent* (the tag is simply not encoded, "leave
//! unchanged"), *explicit null* (the tag is encoded with the null element
//! type, "clear this field") and *present with a value*. [`Nullable`]
//! keeps them apart instead of collapsing to an `Option`.

use crate::tlv::{ContainerType, ElementType, Tag, TlvError, TlvReader, TlvWriter};
use thiserror::Error;

// NOC record tags
const TAG_NOC: u8 = 1;
const TAG_ICAC: u8 = 2;

// Fabric descriptor tags
const TAG_ROOT_PUBLIC_KEY: u8 = 1;
const TAG_VENDOR_ID: u8 = 2;
const TAG_FABRIC_ID: u8 = 3;
const TAG_NODE_ID: u8 = 4;
const TAG_LABEL: u8 = 5;

// Shared list-entry tag
const TAG_FABRIC_INDEX: u8 = 254;

/// Wire-record decoding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("TLV decode error: {0}")]
    Tlv(#[from] TlvError),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {0} carries a value outside its valid range")]
    InvalidFieldValue(&'static str),
}

/// Tri-state wire field: not encoded, encoded as null, or a value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Nullable<T> {
    /// The tag was not encoded at all
    #[default]
    Absent,
    /// The tag was encoded with the null element type
    Null,
    /// The tag carried a value
    Value(T),
}

impl<T> Nullable<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Nullable::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Nullable::Null)
    }

    /// The value, when one is present; both other states map to `None`
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Nullable::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// One entry of the stored NOC list: the operational certificate, its
/// optional intermediate, and the fabric index naming the slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NocRecord {
    pub noc: Vec<u8>,
    pub icac: Nullable<Vec<u8>>,
    pub fabric_index: u8,
}

impl NocRecord {
    /// Encode as an anonymous top-level structure
    pub fn encode_tlv(&self) -> Vec<u8> {
        let mut w = TlvWriter::new();
        self.write_tlv(&mut w, Tag::Anonymous);
        w.finish()
    }

    /// Append this record to an open writer under the given tag
    pub fn write_tlv(&self, w: &mut TlvWriter, tag: Tag) {
        w.start_structure(tag);
        w.put_bytes(Tag::Context(TAG_NOC), &self.noc);
        match &self.icac {
            Nullable::Absent => {}
            Nullable::Null => w.put_null(Tag::Context(TAG_ICAC)),
            Nullable::Value(icac) => w.put_bytes(Tag::Context(TAG_ICAC), icac),
        }
        w.put_u64(Tag::Context(TAG_FABRIC_INDEX), self.fabric_index as u64);
        w.end_container();
    }

    pub fn decode_tlv(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut r = TlvReader::new(bytes);
        if !r.next()? {
            return Err(RecordError::MissingField("noc-record"));
        }
        Self::read_tlv(&mut r)
    }

    /// Decode the record the reader is currently positioned on
    pub fn read_tlv(r: &mut TlvReader) -> Result<Self, RecordError> {
        r.enter_container(ContainerType::Structure)?;
        let mut noc = None;
        let mut icac = Nullable::Absent;
        let mut fabric_index = None;
        while r.next()? {
            let Tag::Context(tag) = r.tag()? else {
                r.skip()?;
                continue;
            };
            match tag {
                TAG_NOC => noc = Some(r.bytes()?.to_vec()),
                TAG_ICAC => {
                    icac = if r.element_type()? == ElementType::Null {
                        Nullable::Null
                    } else {
                        Nullable::Value(r.bytes()?.to_vec())
                    }
                }
                TAG_FABRIC_INDEX => {
                    fabric_index = Some(
                        u8::try_from(r.uint()?)
                            .map_err(|_| RecordError::InvalidFieldValue("fabric-index"))?,
                    )
                }
                _ => r.skip()?,
            }
        }
        r.exit_container()?;
        Ok(Self {
            noc: noc.ok_or(RecordError::MissingField("noc"))?,
            icac,
            fabric_index: fabric_index.ok_or(RecordError::MissingField("fabric-index"))?,
        })
    }
}

/// One entry of the fabrics attribute: the identity of a fabric this
/// device belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricDescriptor {
    pub root_public_key: [u8; 65],
    pub vendor_id: u16,
    pub fabric_id: u64,
    pub node_id: u64,
    pub label: String,
    pub fabric_index: u8,
}

impl FabricDescriptor {
    pub fn encode_tlv(&self) -> Vec<u8> {
        let mut w = TlvWriter::new();
        self.write_tlv(&mut w, Tag::Anonymous);
        w.finish()
    }

    pub fn write_tlv(&self, w: &mut TlvWriter, tag: Tag) {
        w.start_structure(tag);
        w.put_bytes(Tag::Context(TAG_ROOT_PUBLIC_KEY), &self.root_public_key);
        w.put_u64(Tag::Context(TAG_VENDOR_ID), self.vendor_id as u64);
        w.put_u64(Tag::Context(TAG_FABRIC_ID), self.fabric_id);
        w.put_u64(Tag::Context(TAG_NODE_ID), self.node_id);
        w.put_string(Tag::Context(TAG_LABEL), &self.label);
        w.put_u64(Tag::Context(TAG_FABRIC_INDEX), self.fabric_index as u64);
        w.end_container();
    }

    pub fn decode_tlv(bytes: &[u8]) -> Result<Self, RecordError> {
        let mut r = TlvReader::new(bytes);
        if !r.next()? {
            return Err(RecordError::MissingField("fabric-descriptor"));
        }
        Self::read_tlv(&mut r)
    }

    pub fn read_tlv(r: &mut TlvReader) -> Result<Self, RecordError> {
        r.enter_container(ContainerType::Structure)?;
        let mut root_public_key = None;
        let mut vendor_id = None;
        let mut fabric_id = None;
        let mut node_id = None;
        let mut label = None;
        let mut fabric_index = None;
        while r.next()? {
            let Tag::Context(tag) = r.tag()? else {
                r.skip()?;
                continue;
            };
            match tag {
                TAG_ROOT_PUBLIC_KEY => {
                    let key: [u8; 65] = r
                        .bytes()?
                        .try_into()
                        .map_err(|_| RecordError::InvalidFieldValue("root-public-key"))?;
                    root_public_key = Some(key);
                }
                TAG_VENDOR_ID => {
                    vendor_id = Some(
                        u16::try_from(r.uint()?)
                            .map_err(|_| RecordError::InvalidFieldValue("vendor-id"))?,
                    )
                }
                TAG_FABRIC_ID => fabric_id = Some(r.uint()?),
                TAG_NODE_ID => node_id = Some(r.uint()?),
                TAG_LABEL => label = Some(r.string()?.to_string()),
                TAG_FABRIC_INDEX => {
                    fabric_index = Some(
                        u8::try_from(r.uint()?)
                            .map_err(|_| RecordError::InvalidFieldValue("fabric-index"))?,
                    )
                }
                _ => r.skip()?,
            }
        }
        r.exit_container()?;
        Ok(Self {
            root_public_key: root_public_key
                .ok_or(RecordError::MissingField("root-public-key"))?,
            vendor_id: vendor_id.ok_or(RecordError::MissingField("vendor-id"))?,
            fabric_id: fabric_id.ok_or(RecordError::MissingField("fabric-id"))?,
            node_id: node_id.ok_or(RecordError::MissingField("node-id"))?,
            label: label.ok_or(RecordError::MissingField("label"))?,
            fabric_index: fabric_index.ok_or(RecordError::MissingField("fabric-index"))?,
        })
    }
}
