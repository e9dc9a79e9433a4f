//! NOC chain validation
//!
//! A device's credential for one fabric is an ordered chain: root CA
//! certificate, optional intermediate CA certificate, and the node
//! operational certificate. Validation gates whether a device may join a
//! fabric at all, so every step failing is terminal for the call; the
//! caller decides whether to drop the connection or surface a
//! commissioning failure.
//!
//! Checks run in order: decode, role ordering, issuer/subject linkage,
//! validity windows, then ECDSA P-256 signature verification of each
//! certificate's to-be-signed bytes against its issuer's public key (the
//! root verifies against itself).

use crate::cert::{
    extract_fabric_id_optional, extract_node_id, extract_root_public_key, parse_certificate,
    Certificate, CertificateError, CertificateType, FabricId, NodeId,
};
use chrono::{DateTime, Utc};
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::EncodedPoint;
use thiserror::Error;

/// Chain validation errors
#[derive(Debug, Error)]
pub enum ChainError {
    /// Any decode failure, including empty or non-certificate input
    #[error("certificate decode failed: {0}")]
    Certificate(#[from] CertificateError),

    /// A certificate was passed in the wrong role position
    #[error("role mismatch: expected {expected:?}, found {actual:?}")]
    RoleMismatch {
        expected: CertificateType,
        actual: CertificateType,
    },

    /// A CA certificate without the basic-constraints CA flag
    #[error("{0} certificate does not carry the CA flag")]
    NotACa(&'static str),

    /// Authority-key-id does not match the issuer's subject-key-id
    #[error("issuer/subject linkage mismatch at the {0} certificate")]
    LinkageMismatch(&'static str),

    /// Reference time precedes the certificate's not-before
    #[error("{0} certificate is not yet valid")]
    NotYetValid(&'static str),

    /// Reference time is past the certificate's not-after
    #[error("{0} certificate has expired")]
    Expired(&'static str),

    /// The issuer's public key does not decode as a P-256 point
    #[error("{0} certificate carries an invalid P-256 public key")]
    InvalidIssuerKey(&'static str),

    /// ECDSA verification of the TBS bytes failed
    #[error("signature verification failed for the {0} certificate")]
    SignatureInvalid(&'static str),
}

/// Identity extracted from a validated chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    pub fabric_id: FabricId,
    pub node_id: NodeId,
    pub root_public_key: [u8; 65],
}

/// Validate a root → [intermediate] → NOC chain against the current time
pub fn validate_noc_chain(
    root: &[u8],
    noc: &[u8],
    intermediate: Option<&[u8]>,
) -> Result<(), ChainError> {
    validate_noc_chain_at(root, noc, intermediate, Utc::now())
}

/// Validate a chain against a caller-supplied reference time
///
/// The explicit time keeps validation deterministic for testing and for
/// replay of stored commissioning records.
pub fn validate_noc_chain_at(
    root: &[u8],
    noc: &[u8],
    intermediate: Option<&[u8]>,
    at: DateTime<Utc>,
) -> Result<(), ChainError> {
    let root = parse_certificate(root)?;
    let noc = parse_certificate(noc)?;
    let intermediate = intermediate.map(parse_certificate).transpose()?;

    // Role ordering is a deliberate misuse guard, independent of the
    // cryptographic checks below.
    expect_role(&root, CertificateType::Root)?;
    expect_role(&noc, CertificateType::Noc)?;
    if !root.is_ca() {
        return Err(ChainError::NotACa("root"));
    }
    if let Some(icac) = &intermediate {
        expect_role(icac, CertificateType::Intermediate)?;
        if !icac.is_ca() {
            return Err(ChainError::NotACa("intermediate"));
        }
    }

    let noc_issuer = intermediate.as_ref().unwrap_or(&root);
    check_linkage(&noc, noc_issuer, "operational")?;
    if let Some(icac) = &intermediate {
        check_linkage(icac, &root, "intermediate")?;
    }
    check_linkage(&root, &root, "root")?;

    check_validity(&root, at, "root")?;
    if let Some(icac) = &intermediate {
        check_validity(icac, at, "intermediate")?;
    }
    check_validity(&noc, at, "operational")?;

    verify_signature(&root, &root, "root")?;
    if let Some(icac) = &intermediate {
        verify_signature(icac, &root, "intermediate")?;
    }
    verify_signature(&noc, noc_issuer, "operational")?;

    Ok(())
}

/// Pull the fabric identity out of a (root, NOC) pair
///
/// FabricID comes preferentially from the NOC, falling back to the root's
/// if the root happens to carry one; NodeID always from the NOC;
/// RootPublicKey always from the root.
pub fn extract_chain_info(root: &[u8], noc: &[u8]) -> Result<ChainInfo, ChainError> {
    let root = parse_certificate(root)?;
    let noc = parse_certificate(noc)?;

    let fabric_id = extract_fabric_id_optional(&noc)
        .or_else(|| extract_fabric_id_optional(&root))
        .ok_or(CertificateError::FabricIdNotPresent)?;
    let node_id = extract_node_id(&noc)?;
    let root_public_key = extract_root_public_key(&root)?;

    Ok(ChainInfo {
        fabric_id,
        node_id,
        root_public_key,
    })
}

fn expect_role(cert: &Certificate, expected: CertificateType) -> Result<(), ChainError> {
    let actual = cert.certificate_type();
    if actual != expected {
        return Err(ChainError::RoleMismatch { expected, actual });
    }
    Ok(())
}

/// Subject-key-id / authority-key-id correspondence. A self-linked root
/// may omit its authority-key-id.
fn check_linkage(cert: &Certificate, issuer: &Certificate, which: &'static str) -> Result<(), ChainError> {
    let issuer_skid = issuer
        .extensions
        .subject_key_id
        .as_ref()
        .ok_or(ChainError::LinkageMismatch(which))?;
    match (&cert.extensions.authority_key_id, std::ptr::eq(cert, issuer)) {
        (Some(akid), _) if akid == issuer_skid => Ok(()),
        (None, true) => Ok(()),
        _ => Err(ChainError::LinkageMismatch(which)),
    }
}

fn check_validity(cert: &Certificate, at: DateTime<Utc>, which: &'static str) -> Result<(), ChainError> {
    if at < cert.not_before_utc() {
        return Err(ChainError::NotYetValid(which));
    }
    if let Some(not_after) = cert.not_after_utc() {
        if at > not_after {
            return Err(ChainError::Expired(which));
        }
    }
    Ok(())
}

fn verify_signature(
    cert: &Certificate,
    issuer: &Certificate,
    which: &'static str,
) -> Result<(), ChainError> {
    let point = EncodedPoint::from_bytes(issuer.public_key)
        .map_err(|_| ChainError::InvalidIssuerKey(which))?;
    let key = VerifyingKey::from_encoded_point(&point)
        .map_err(|_| ChainError::InvalidIssuerKey(which))?;
    let signature = Signature::from_slice(&cert.signature)
        .map_err(|_| ChainError::SignatureInvalid(which))?;
    key.verify(cert.tbs_bytes(), &signature)
        .map_err(|_| ChainError::SignatureInvalid(which))
}
