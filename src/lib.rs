//! Asset plugins - decoding and authority resolution for plugin-bearing asset accounts
//!
//! Decodes asset and collection account bytes (base record, plugin header, plugin
//! registry and external adapter registry), derives an asset's effective plugin state
//! under its collection, answers authority questions for a principal, and expands
//! lifecycle adapters into the extra accounts an instruction needs.
//!
//! Everything here is synchronous and operates on caller-supplied buffers; fetching
//! account data and building transactions live elsewhere.

pub mod account;
pub mod authority;
pub mod codec;
pub mod config;
pub mod derive;
pub mod errors;
pub mod lifecycle;
pub mod materialize;
pub mod registry;
pub mod types;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use account::{
    decode_asset_account, decode_collection_account, AccountDecoder, AssetView, CollectionView,
};
pub use authority::{
    can_burn, can_transfer, can_update, check_plugin_authorities, collection_address_of,
    has_update_authority, is_frozen, is_owner, plugin_authority_matches, PluginAuthorityCheck,
};
pub use config::{DecoderConfig, DuplicatePluginPolicy};
pub use derive::derive_asset_plugins;
pub use errors::{CoreError, Result};
pub use lifecycle::{
    resolve_extra_account, resolve_lifecycle_extra_accounts, LifecycleInputs, PRECONFIGURED_SEED,
};

// Re-export commonly used types
pub use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};
