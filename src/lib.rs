//! Matter application-layer wire codec and fabric credential subsystem
//!
//! This crate implements the two foundations every Matter message,
//! attribute, command and certificate sits on:
//!
//! - the **TLV codec** ([`tlv`]): a cursor-based writer and reader for the
//!   tagged, nested, self-describing binary format, hardened against
//!   adversarial input;
//! - the **credential subsystem** ([`cert`], [`fabric`], [`chain`],
//!   [`records`]): operational-certificate decoding, compressed-fabric-id
//!   derivation and NOC chain validation: the security boundary that
//!   gates whether a device may join a fabric.
//!
//! All operations are synchronous, CPU-bound and free of I/O; they work
//! on in-memory buffers and return typed errors. Nothing here retries,
//! caches or holds global state.
//!
//! # Example
//!
//! ```
//! use matter_fabric::fabric::compressed_fabric_id;
//!
//! # fn example() -> Result<(), matter_fabric::MatterFabricError> {
//! let root_public_key = [0x04u8; 65]; // uncompressed P-256 point
//! let id = compressed_fabric_id(&root_public_key, 0x2906_C908_D115_D362)?;
//! assert_eq!(id.len(), 8);
//! # Ok(())
//! # }
//! ```

pub mod cert;
pub mod chain;
mod error;
pub mod fabric;
pub mod records;
pub mod tlv;

pub use cert::{
    extract_fabric_id, extract_fabric_id_optional, extract_node_id, extract_root_public_key,
    parse_certificate, Certificate, CertificateError, CertificateType, DistinguishedName,
    Extensions, FabricId, NodeId,
};
pub use chain::{
    extract_chain_info, validate_noc_chain, validate_noc_chain_at, ChainError, ChainInfo,
};
pub use error::MatterFabricError;
pub use fabric::{
    compressed_fabric_id, compressed_fabric_id_from_cert, compressed_fabric_id_u64, FabricError,
};
pub use records::{FabricDescriptor, NocRecord, Nullable, RecordError};
pub use tlv::{ContainerType, ElementType, Tag, TlvError, TlvReader, TlvWriter};
