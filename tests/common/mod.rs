//! Common test utilities for matter-fabric integration tests
//!
//! Builds small but genuinely signed certificate chains: the TBS bytes are
//! encoded with the crate's own writer and signed with fixed-seed ECDSA
//! P-256 keys, so chain validation exercises real signature verification
//! without any stored fixtures.

use matter_fabric::tlv::{Tag, TlvWriter};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};

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

// RDN attribute tags
pub const ATTR_NODE_ID: u8 = 17;
pub const ATTR_ICAC_ID: u8 = 19;
pub const ATTR_RCAC_ID: u8 = 20;
pub const ATTR_FABRIC_ID: u8 = 21;

// Extension tags
const EXT_BASIC_CONSTRAINTS: u8 = 1;
const EXT_SUBJECT_KEY_ID: u8 = 4;
const EXT_AUTHORITY_KEY_ID: u8 = 5;
const BC_IS_CA: u8 = 1;

/// Identity values from the published certificate extraction vectors
pub const TEST_FABRIC_ID: u64 = 0xFAB0_0000_0000_001D;
pub const TEST_NODE_ID: u64 = 0xDEDE_DEDE_0001_0001;

/// One certificate to encode and sign
pub struct CertSpec<'a> {
    pub serial: u8,
    pub issuer: &'a [(u8, u64)],
    pub subject: &'a [(u8, u64)],
    pub not_before: u32,
    /// 0 means no expiry
    pub not_after: u32,
    pub is_ca: bool,
    pub subject_key_id: [u8; 20],
    pub authority_key_id: [u8; 20],
    /// The subject's own key; its public half lands in the certificate
    pub subject_key: &'a SigningKey,
    /// The issuer's key; signs the TBS bytes (same as `subject_key` for a
    /// self-signed root)
    pub issuer_key: &'a SigningKey,
}

/// Encode and sign one certificate
pub fn build_certificate(spec: &CertSpec) -> Vec<u8> {
    let mut w = TlvWriter::new();
    w.start_structure(Tag::Anonymous);
    w.put_bytes(Tag::Context(TAG_SERIAL_NUMBER), &[spec.serial]);
    w.put_u64(Tag::Context(TAG_SIGNATURE_ALGORITHM), 1);
    put_dn(&mut w, TAG_ISSUER, spec.issuer);
    w.put_u64(Tag::Context(TAG_NOT_BEFORE), spec.not_before as u64);
    w.put_u64(Tag::Context(TAG_NOT_AFTER), spec.not_after as u64);
    put_dn(&mut w, TAG_SUBJECT, spec.subject);
    w.put_u64(Tag::Context(TAG_PUBLIC_KEY_ALGORITHM), 1);
    w.put_u64(Tag::Context(TAG_ELLIPTIC_CURVE_ID), 1);
    let public_key = spec.subject_key.verifying_key().to_encoded_point(false);
    w.put_bytes(Tag::Context(TAG_EC_PUBLIC_KEY), public_key.as_bytes());
    w.start_structure(Tag::Context(TAG_EXTENSIONS));
    w.start_structure(Tag::Context(EXT_BASIC_CONSTRAINTS));
    w.put_bool(Tag::Context(BC_IS_CA), spec.is_ca);
    w.end_container();
    w.put_bytes(Tag::Context(EXT_SUBJECT_KEY_ID), &spec.subject_key_id);
    w.put_bytes(Tag::Context(EXT_AUTHORITY_KEY_ID), &spec.authority_key_id);
    w.end_container();

    // Everything emitted so far is the TBS span the validator verifies
    let signature: Signature = spec.issuer_key.sign(w.bytes());
    w.put_bytes(Tag::Context(TAG_SIGNATURE), &signature.to_bytes());
    w.end_container();
    w.finish()
}

fn put_dn(w: &mut TlvWriter, tag: u8, attrs: &[(u8, u64)]) {
    w.start_list(Tag::Context(tag));
    for (attr, value) in attrs {
        w.put_u64(Tag::Context(*attr), *value);
    }
    w.end_container();
}

/// Deterministic P-256 key from a fixed seed byte
pub fn test_key(seed: u8) -> SigningKey {
    SigningKey::from_slice(&[seed; 32]).expect("fixed seed is a valid scalar")
}

/// A complete root → intermediate → NOC chain with matching linkage
pub struct TestChain {
    pub root: Vec<u8>,
    pub icac: Vec<u8>,
    pub noc: Vec<u8>,
    pub root_key: SigningKey,
}

/// Build a matched chain carrying the extraction-vector identity values,
/// valid from shortly after the 2000 epoch with no expiry
pub fn build_test_chain() -> TestChain {
    build_test_chain_with_validity(1, 0)
}

/// Same chain but with explicit validity bounds on every certificate
pub fn build_test_chain_with_validity(not_before: u32, not_after: u32) -> TestChain {
    let root_key = test_key(0x11);
    let icac_key = test_key(0x22);
    let noc_key = test_key(0x33);

    let root = build_certificate(&CertSpec {
        serial: 1,
        issuer: &[(ATTR_RCAC_ID, 1)],
        subject: &[(ATTR_RCAC_ID, 1)],
        not_before,
        not_after,
        is_ca: true,
        subject_key_id: [0xA1; 20],
        authority_key_id: [0xA1; 20],
        subject_key: &root_key,
        issuer_key: &root_key,
    });
    let icac = build_certificate(&CertSpec {
        serial: 2,
        issuer: &[(ATTR_RCAC_ID, 1)],
        subject: &[(ATTR_ICAC_ID, 2)],
        not_before,
        not_after,
        is_ca: true,
        subject_key_id: [0xB2; 20],
        authority_key_id: [0xA1; 20],
        subject_key: &icac_key,
        issuer_key: &root_key,
    });
    let noc = build_certificate(&CertSpec {
        serial: 3,
        issuer: &[(ATTR_ICAC_ID, 2)],
        subject: &[(ATTR_FABRIC_ID, TEST_FABRIC_ID), (ATTR_NODE_ID, TEST_NODE_ID)],
        not_before,
        not_after,
        is_ca: false,
        subject_key_id: [0xC3; 20],
        authority_key_id: [0xB2; 20],
        subject_key: &noc_key,
        issuer_key: &icac_key,
    });

    TestChain {
        root,
        icac,
        noc,
        root_key,
    }
}

/// A two-certificate chain: NOC issued directly by the root
pub fn build_test_chain_without_icac() -> TestChain {
    let root_key = test_key(0x11);
    let noc_key = test_key(0x33);

    let root = build_certificate(&CertSpec {
        serial: 1,
        issuer: &[(ATTR_RCAC_ID, 1)],
        subject: &[(ATTR_RCAC_ID, 1)],
        not_before: 1,
        not_after: 0,
        is_ca: true,
        subject_key_id: [0xA1; 20],
        authority_key_id: [0xA1; 20],
        subject_key: &root_key,
        issuer_key: &root_key,
    });
    let noc = build_certificate(&CertSpec {
        serial: 2,
        issuer: &[(ATTR_RCAC_ID, 1)],
        subject: &[(ATTR_FABRIC_ID, TEST_FABRIC_ID), (ATTR_NODE_ID, TEST_NODE_ID)],
        not_before: 1,
        not_after: 0,
        is_ca: false,
        subject_key_id: [0xC3; 20],
        authority_key_id: [0xA1; 20],
        subject_key: &noc_key,
        issuer_key: &root_key,
    });

    TestChain {
        root,
        icac: Vec::new(),
        noc,
        root_key,
    }
}
