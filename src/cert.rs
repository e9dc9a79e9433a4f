//! Matter operational certificate decoding
//!
//! Certificates travel as one top-level TLV structure with fixed context
//! tags. The decoder maps them to typed fields, records which identity
//! attributes are present in the issuer and subject (absence is a normal
//! state for CA certificates, not an error) and keeps the raw
//! to-be-signed byte span for signature verification by the chain
//! validator.
//!
//! ## Wire layout
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ structure (anonymous)                                      │
//! │   1: serial-number      (bytes)                            │
//! │   2: signature-algorithm (uint)                            │
//! │   3: issuer             (list of RDN attributes)           │
//! │   4: not-before         (uint, seconds since 2000-01-01Z)  │
//! │   5: not-after          (uint, 0 = no expiry)              │
//! │   6: subject            (list of RDN attributes)           │
//! │   7: public-key-algorithm (uint)                           │
//! │   8: elliptic-curve-id  (uint)                             │
//! │   9: ec-public-key      (65-byte uncompressed point)       │
//! │  10: extensions         (structure)                        │
//! │  11: signature          (64-byte r||s)                     │
//! └────────────────────────────────────────────────────────────┘
//! ```

use crate::tlv::{ContainerType, Tag, TlvError, TlvReader};
use thiserror::Error;

/// 64-bit fabric identifier; zero is reserved
pub type FabricId = u64;

/// 64-bit node identifier
pub type NodeId = u64;

/// Unix timestamp of the Matter epoch, 2000-01-01T00:00:00Z
pub const MATTER_EPOCH_UNIX: i64 = 946_684_800;

// Certificate field tags
const TAG_SERIAL_NUMBER: u8 = 1;
const TAG_SIGNATURE_ALGORITHM: u8 = 2;
const TAG_ISSUER: u8 = 3;
const TAG_NOT_BEFORE: u8 = 4;
const TAG_NOT_AFTER: u8 = 5;
const TAG_SUBJECT: u8 = 6;
const TAG_PUBLIC_KEY_ALGORITHM: u8 = 7;
const TAG_ELLIPTIC_CURVE_ID: u8 = 8;
const TAG_EC_PUBLIC_KEY: u8 = 9;
const TAG_EXTENSIONS: u8 = 10;
const TAG_SIGNATURE: u8 = 11;

// RDN attribute tags within issuer/subject lists
const ATTR_COMMON_NAME: u8 = 1;
const ATTR_NODE_ID: u8 = 17;
const ATTR_FIRMWARE_SIGNING_ID: u8 = 18;
const ATTR_ICAC_ID: u8 = 19;
const ATTR_RCAC_ID: u8 = 20;
const ATTR_FABRIC_ID: u8 = 21;
const ATTR_NOC_CAT: u8 = 22;

// Extension tags
const EXT_BASIC_CONSTRAINTS: u8 = 1;
const EXT_KEY_USAGE: u8 = 2;
const EXT_EXTENDED_KEY_USAGE: u8 = 3;
const EXT_SUBJECT_KEY_ID: u8 = 4;
const EXT_AUTHORITY_KEY_ID: u8 = 5;

// Basic-constraints fields
const BC_IS_CA: u8 = 1;
const BC_PATH_LEN: u8 = 2;

/// Certificate decoding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertificateError {
    #[error("TLV decode error: {0}")]
    Tlv(#[from] TlvError),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {0} carries a value outside its valid range")]
    InvalidFieldValue(&'static str),

    #[error("certificate carries no fabric id")]
    FabricIdNotPresent,

    #[error("not an operational certificate: subject carries no node id")]
    NotAnOperationalCertificate,

    #[error("public key is not a 65-byte uncompressed point")]
    InvalidPublicKey,

    #[error("unexpected data after the certificate structure")]
    TrailingData,
}

/// Role a certificate plays in a credential chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateType {
    /// Root CA certificate (RCAC)
    Root,
    /// Intermediate CA certificate (ICAC)
    Intermediate,
    /// Node operational certificate (NOC)
    Noc,
}

/// Identity attributes of one issuer or subject RDN list
///
/// Every field is optional on the wire; which ones are present is what
/// distinguishes certificate roles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistinguishedName {
    pub common_name: Option<String>,
    pub node_id: Option<NodeId>,
    pub firmware_signing_id: Option<u64>,
    pub icac_id: Option<u64>,
    pub rcac_id: Option<u64>,
    pub fabric_id: Option<FabricId>,
    /// CASE authenticated tag values; may repeat
    pub noc_cats: Vec<u32>,
}

/// Basic-constraints extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub path_len: Option<u8>,
}

/// Decoded certificate extensions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extensions {
    pub basic_constraints: Option<BasicConstraints>,
    pub key_usage: Option<u16>,
    pub extended_key_usage: Vec<u8>,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
}

/// One decoded Matter certificate
///
/// An immutable value record; decoding never caches and callers own the
/// result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: u8,
    pub issuer: DistinguishedName,
    /// Seconds since the Matter epoch
    pub not_before: u32,
    /// Seconds since the Matter epoch; 0 means no expiry
    pub not_after: u32,
    pub subject: DistinguishedName,
    pub public_key_algorithm: u8,
    pub elliptic_curve_id: u8,
    pub public_key: [u8; 65],
    pub extensions: Extensions,
    pub signature: Vec<u8>,
    tbs: Vec<u8>,
}

impl Certificate {
    /// Role of this certificate, classified from its subject attributes
    /// and basic constraints
    ///
    /// A subject carrying both node id and fabric id is a NOC. CA
    /// certificates are told apart by their rcac-id/icac-id attribute or,
    /// failing that, by being self-issued.
    pub fn certificate_type(&self) -> CertificateType {
        if self.subject.node_id.is_some() && self.subject.fabric_id.is_some() {
            return CertificateType::Noc;
        }
        if self.subject.rcac_id.is_some() {
            return CertificateType::Root;
        }
        if self.subject.icac_id.is_some() {
            return CertificateType::Intermediate;
        }
        if self.subject == self.issuer {
            CertificateType::Root
        } else {
            CertificateType::Intermediate
        }
    }

    /// CA flag from the basic-constraints extension
    pub fn is_ca(&self) -> bool {
        self.extensions
            .basic_constraints
            .map(|bc| bc.is_ca)
            .unwrap_or(false)
    }

    /// Raw to-be-signed bytes: the encoded span from the start of the
    /// top-level structure up to the signature element
    pub fn tbs_bytes(&self) -> &[u8] {
        &self.tbs
    }

    /// `not_before` as a UTC instant
    pub fn not_before_utc(&self) -> chrono::DateTime<chrono::Utc> {
        matter_time(self.not_before)
    }

    /// `not_after` as a UTC instant; `None` when the certificate carries
    /// no well-defined expiry (`not_after == 0`)
    pub fn not_after_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if self.not_after == 0 {
            None
        } else {
            Some(matter_time(self.not_after))
        }
    }
}

fn matter_time(seconds: u32) -> chrono::DateTime<chrono::Utc> {
    // u32 seconds past 2000-01-01 stays far inside chrono's range
    chrono::DateTime::from_timestamp(MATTER_EPOCH_UNIX + seconds as i64, 0)
        .expect("matter timestamp in range")
}

/// Decode one TLV-encoded certificate
///
/// Unknown tags at every level are skipped for forward compatibility.
/// Missing mandatory fields, wrong field types and malformed TLV all map
/// to [`CertificateError`]; no input crashes the decoder.
pub fn parse_certificate(bytes: &[u8]) -> Result<Certificate, CertificateError> {
    let mut reader = TlvReader::new(bytes);
    if !reader.next()? {
        return Err(CertificateError::MissingField("certificate"));
    }
    reader.enter_container(ContainerType::Structure)?;

    let mut serial_number = None;
    let mut signature_algorithm = None;
    let mut issuer = None;
    let mut not_before = None;
    let mut not_after = None;
    let mut subject = None;
    let mut public_key_algorithm = None;
    let mut elliptic_curve_id = None;
    let mut public_key = None;
    let mut extensions = None;
    let mut signature = None;
    let mut tbs_end = None;

    while reader.next()? {
        let Tag::Context(tag) = reader.tag()? else {
            reader.skip()?;
            continue;
        };
        match tag {
            TAG_SERIAL_NUMBER => serial_number = Some(reader.bytes()?.to_vec()),
            TAG_SIGNATURE_ALGORITHM => {
                signature_algorithm = Some(narrow_u8(reader.uint()?, "signature-algorithm")?)
            }
            TAG_ISSUER => issuer = Some(decode_dn(&mut reader)?),
            TAG_NOT_BEFORE => not_before = Some(narrow_u32(reader.uint()?, "not-before")?),
            TAG_NOT_AFTER => not_after = Some(narrow_u32(reader.uint()?, "not-after")?),
            TAG_SUBJECT => subject = Some(decode_dn(&mut reader)?),
            TAG_PUBLIC_KEY_ALGORITHM => {
                public_key_algorithm = Some(narrow_u8(reader.uint()?, "public-key-algorithm")?)
            }
            TAG_ELLIPTIC_CURVE_ID => {
                elliptic_curve_id = Some(narrow_u8(reader.uint()?, "elliptic-curve-id")?)
            }
            TAG_EC_PUBLIC_KEY => {
                let raw = reader.bytes()?;
                let key: [u8; 65] = raw.try_into().map_err(|_| CertificateError::InvalidPublicKey)?;
                if key[0] != 0x04 {
                    return Err(CertificateError::InvalidPublicKey);
                }
                public_key = Some(key);
            }
            TAG_EXTENSIONS => extensions = Some(decode_extensions(&mut reader)?),
            TAG_SIGNATURE => {
                tbs_end = Some(reader.element_offset()?);
                signature = Some(reader.bytes()?.to_vec());
            }
            _ => reader.skip()?,
        }
    }
    reader.exit_container()?;
    if reader.next()? {
        return Err(CertificateError::TrailingData);
    }

    let tbs_end = tbs_end.ok_or(CertificateError::MissingField("signature"))?;

    Ok(Certificate {
        serial_number: serial_number.ok_or(CertificateError::MissingField("serial-number"))?,
        signature_algorithm: signature_algorithm
            .ok_or(CertificateError::MissingField("signature-algorithm"))?,
        issuer: issuer.ok_or(CertificateError::MissingField("issuer"))?,
        not_before: not_before.ok_or(CertificateError::MissingField("not-before"))?,
        not_after: not_after.ok_or(CertificateError::MissingField("not-after"))?,
        subject: subject.ok_or(CertificateError::MissingField("subject"))?,
        public_key_algorithm: public_key_algorithm
            .ok_or(CertificateError::MissingField("public-key-algorithm"))?,
        elliptic_curve_id: elliptic_curve_id
            .ok_or(CertificateError::MissingField("elliptic-curve-id"))?,
        public_key: public_key.ok_or(CertificateError::MissingField("ec-public-key"))?,
        extensions: extensions.ok_or(CertificateError::MissingField("extensions"))?,
        signature: signature.ok_or(CertificateError::MissingField("signature"))?,
        tbs: bytes[..tbs_end].to_vec(),
    })
}

fn decode_dn(reader: &mut TlvReader) -> Result<DistinguishedName, CertificateError> {
    reader.enter_container(ContainerType::List)?;
    let mut dn = DistinguishedName::default();
    while reader.next()? {
        let Tag::Context(tag) = reader.tag()? else {
            reader.skip()?;
            continue;
        };
        match tag {
            ATTR_COMMON_NAME => dn.common_name = Some(reader.string()?.to_string()),
            ATTR_NODE_ID => dn.node_id = Some(reader.uint()?),
            ATTR_FIRMWARE_SIGNING_ID => dn.firmware_signing_id = Some(reader.uint()?),
            ATTR_ICAC_ID => dn.icac_id = Some(reader.uint()?),
            ATTR_RCAC_ID => dn.rcac_id = Some(reader.uint()?),
            ATTR_FABRIC_ID => dn.fabric_id = Some(reader.uint()?),
            ATTR_NOC_CAT => dn.noc_cats.push(narrow_u32(reader.uint()?, "noc-cat")?),
            _ => reader.skip()?,
        }
    }
    reader.exit_container()?;
    Ok(dn)
}

fn decode_extensions(reader: &mut TlvReader) -> Result<Extensions, CertificateError> {
    reader.enter_container(ContainerType::Structure)?;
    let mut ext = Extensions::default();
    while reader.next()? {
        let Tag::Context(tag) = reader.tag()? else {
            reader.skip()?;
            continue;
        };
        match tag {
            EXT_BASIC_CONSTRAINTS => ext.basic_constraints = Some(decode_basic_constraints(reader)?),
            EXT_KEY_USAGE => {
                ext.key_usage = Some(
                    u16::try_from(reader.uint()?)
                        .map_err(|_| CertificateError::InvalidFieldValue("key-usage"))?,
                )
            }
            EXT_EXTENDED_KEY_USAGE => {
                reader.enter_container(ContainerType::Array)?;
                while reader.next()? {
                    ext.extended_key_usage
                        .push(narrow_u8(reader.uint()?, "extended-key-usage")?);
                }
                reader.exit_container()?;
            }
            EXT_SUBJECT_KEY_ID => ext.subject_key_id = Some(reader.bytes()?.to_vec()),
            EXT_AUTHORITY_KEY_ID => ext.authority_key_id = Some(reader.bytes()?.to_vec()),
            _ => reader.skip()?,
        }
    }
    reader.exit_container()?;
    Ok(ext)
}

fn decode_basic_constraints(reader: &mut TlvReader) -> Result<BasicConstraints, CertificateError> {
    reader.enter_container(ContainerType::Structure)?;
    let mut bc = BasicConstraints::default();
    while reader.next()? {
        let Tag::Context(tag) = reader.tag()? else {
            reader.skip()?;
            continue;
        };
        match tag {
            BC_IS_CA => bc.is_ca = reader.bool()?,
            BC_PATH_LEN => bc.path_len = Some(narrow_u8(reader.uint()?, "path-len")?),
            _ => reader.skip()?,
        }
    }
    reader.exit_container()?;
    Ok(bc)
}

fn narrow_u8(value: u64, field: &'static str) -> Result<u8, CertificateError> {
    u8::try_from(value).map_err(|_| CertificateError::InvalidFieldValue(field))
}

fn narrow_u32(value: u64, field: &'static str) -> Result<u32, CertificateError> {
    u32::try_from(value).map_err(|_| CertificateError::InvalidFieldValue(field))
}

/// Fabric id from a certificate's subject, failing when absent
pub fn extract_fabric_id(cert: &Certificate) -> Result<FabricId, CertificateError> {
    extract_fabric_id_optional(cert).ok_or(CertificateError::FabricIdNotPresent)
}

/// Fabric id from a certificate's subject; `None` is a legitimate state
/// for root and intermediate certificates
pub fn extract_fabric_id_optional(cert: &Certificate) -> Option<FabricId> {
    cert.subject.fabric_id
}

/// Node id from an operational certificate's subject
///
/// Fails for root and intermediate certificates, which never carry one.
pub fn extract_node_id(cert: &Certificate) -> Result<NodeId, CertificateError> {
    cert.subject
        .node_id
        .ok_or(CertificateError::NotAnOperationalCertificate)
}

/// 65-byte uncompressed root public key from a certificate
pub fn extract_root_public_key(cert: &Certificate) -> Result<[u8; 65], CertificateError> {
    if cert.public_key[0] != 0x04 {
        return Err(CertificateError::InvalidPublicKey);
    }
    Ok(cert.public_key)
}
