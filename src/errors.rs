//! Error taxonomy for asset/collection decoding, derivation and authority resolution
//!
//! Errors fall into three classes:
//! - Fatal: abort the specific call (wrong base record key, collection mismatch,
//!   unresolved PDA inputs, unsupported data-section link, malformed payloads)
//! - Absorbed: per-record anomalies that are filtered and never surface to callers
//!   (unknown registry tags)
//! - Degraded: the call succeeds with a reduced result and a warning is logged
//!   (MsgPack adapter data)

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::types::{ExternalPluginAdapterSchema, Key, PluginType};

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error type for every operation exposed by this crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A field could not be decoded at the given buffer offset
    ///
    /// `what` names the field or plugin key being decoded so failures in large
    /// registries can be traced back to the offending entry.
    #[error("Decode error ({what} at offset {offset}): {reason}")]
    Decode {
        /// Field, record or plugin key being decoded
        what: String,
        /// Byte offset the decode started at
        offset: usize,
        /// Underlying codec failure
        reason: String,
    },

    /// The leading discriminator does not match the expected record kind
    #[error("Unexpected account key: expected {expected:?}, found {found}")]
    UnexpectedKey {
        /// Kind the caller asked to decode
        expected: Key,
        /// Raw discriminator byte found in the buffer
        found: u8,
    },

    /// Registry entry with a type tag this version does not recognize
    ///
    /// Absorbed during registry decoding: the entry is skipped and filtered.
    #[error("Unknown registry entry tag {tag} at offset {offset}")]
    UnknownRegistryEntry {
        /// Raw tag byte
        tag: u8,
        /// Offset of the tag in the buffer
        offset: usize,
    },

    /// Two registry records describe the same plugin type
    ///
    /// Only raised when the decoder is configured to reject duplicates.
    #[error("Duplicate plugin {plugin_type:?} in registry (offsets {first} and {second})")]
    DuplicatePlugin {
        /// Plugin type that appears twice
        plugin_type: PluginType,
        /// Payload offset of the first record
        first: u64,
        /// Payload offset of the second record
        second: u64,
    },

    /// The collection supplied to an authority check is not the asset's collection
    #[error("Collection mismatch: asset belongs to {asset_collection}, got {supplied}")]
    CollectionMismatch {
        /// Collection address embedded in the asset's update authority
        asset_collection: Pubkey,
        /// Address of the collection passed by the caller
        supplied: Pubkey,
    },

    /// Extra-account resolution needs well-known addresses that were not supplied
    #[error("Missing required input(s) for extra account resolution: {}", .inputs.join(", "))]
    MissingRequiredInput {
        /// Every missing input, in first-seen order
        inputs: Vec<&'static str>,
    },

    /// No program address can be derived from a custom seed list
    #[error("Invalid PDA seeds for program {program_id}: {reason}")]
    InvalidSeeds {
        /// Program the address was derived under
        program_id: Pubkey,
        reason: String,
    },

    /// A data section is linked to a lifecycle hook, which is not supported
    #[error("Unsupported data section link to LinkedLifecycleHook {hooked_program}")]
    UnsupportedLink {
        /// Hooked program named by the data section's parent key
        hooked_program: Pubkey,
    },

    /// Adapter data uses a schema this crate cannot decode
    ///
    /// Degraded: decoding continues with the raw bytes.
    #[error("Unsupported adapter data schema {schema:?} at offset {offset}, returning raw bytes")]
    UnsupportedSchema {
        /// Declared schema
        schema: ExternalPluginAdapterSchema,
        /// Offset of the data blob
        offset: usize,
    },
}

impl CoreError {
    /// Shorthand for a [`CoreError::Decode`]
    pub fn decode(what: impl Into<String>, offset: usize, reason: impl ToString) -> Self {
        Self::Decode {
            what: what.into(),
            offset,
            reason: reason.to_string(),
        }
    }

    /// Check whether this error aborts the call that produced it
    ///
    /// Returns `false` for absorbed and degraded outcomes, which are only ever
    /// logged by this crate.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::UnknownRegistryEntry { .. } => false,
            Self::UnsupportedSchema { .. } => false,

            Self::Decode { .. } => true,
            Self::UnexpectedKey { .. } => true,
            Self::DuplicatePlugin { .. } => true,
            Self::CollectionMismatch { .. } => true,
            Self::MissingRequiredInput { .. } => true,
            Self::InvalidSeeds { .. } => true,
            Self::UnsupportedLink { .. } => true,
        }
    }

    /// Get a short error type name for log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::UnexpectedKey { .. } => "unexpected_key",
            Self::UnknownRegistryEntry { .. } => "unknown_registry_entry",
            Self::DuplicatePlugin { .. } => "duplicate_plugin",
            Self::CollectionMismatch { .. } => "collection_mismatch",
            Self::MissingRequiredInput { .. } => "missing_required_input",
            Self::InvalidSeeds { .. } => "invalid_seeds",
            Self::UnsupportedLink { .. } => "unsupported_link",
            Self::UnsupportedSchema { .. } => "unsupported_schema",
        }
    }
}
