//! Unified error type for the matter-fabric public API
//!
//! Internal modules maintain their domain-specific errors for precise
//! handling. This unified type provides a clean surface for consumers
//! that do not care which layer failed.
//!
//! # Example
//!
//! ```no_run
//! use matter_fabric::MatterFabricError;
//!
//! fn join_fabric() -> Result<(), MatterFabricError> {
//!     // codec, certificate, fabric and chain errors all convert
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all matter-fabric operations
///
/// Consumers that need granular handling can still match the underlying
/// error types through the enum variants.
///
/// # Error Categories
///
/// - **Tlv**: malformed or truncated wire bytes
/// - **Certificate**: certificate structure or field errors
/// - **Fabric**: compressed-fabric-id precondition failures
/// - **Chain**: credential chain validation failures
/// - **Record**: credential-storage record decode errors
#[derive(Debug, Error)]
pub enum MatterFabricError {
    /// Wire decode error from the TLV codec
    #[error("TLV error: {0}")]
    Tlv(#[from] crate::tlv::TlvError),

    /// Certificate decode or extraction error
    #[error("certificate error: {0}")]
    Certificate(#[from] crate::cert::CertificateError),

    /// Compressed-fabric-id derivation error
    #[error("fabric error: {0}")]
    Fabric(#[from] crate::fabric::FabricError),

    /// NOC chain validation error
    #[error("chain error: {0}")]
    Chain(#[from] crate::chain::ChainError),

    /// Wire record decode error
    #[error("record error: {0}")]
    Record(#[from] crate::records::RecordError),
}

impl MatterFabricError {
    /// True when the failure came from decoding untrusted bytes
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Tlv(_) | Self::Certificate(_) | Self::Record(_))
    }

    /// True when the failure is a credential trust decision
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Chain(_))
    }

    /// True when a caller-supplied input failed a precondition
    pub fn is_precondition_error(&self) -> bool {
        matches!(self, Self::Fabric(_))
    }
}
