//! Asset and collection account decoding
//!
//! `Buffer := BaseRecord [PluginHeader PluginRegistry]`: the plugin header sits
//! right after the base record and is only present when the buffer is longer than
//! the base record itself.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::codec::{to_index, ByteCursor};
use crate::config::DecoderConfig;
use crate::errors::Result;
use crate::materialize::{materialize_adapters, materialize_plugins};
use crate::registry::{decode_plugin_registry, PluginHeader};
use crate::types::{ExternalPluginAdaptersList, Key, PluginsList, UpdateAuthority};

/// Decoded asset account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    /// Account address
    pub public_key: Pubkey,
    pub owner: Pubkey,
    pub update_authority: UpdateAuthority,
    pub name: String,
    pub uri: String,
    pub seq: Option<u64>,
    pub plugin_header: Option<PluginHeader>,
    pub plugins: PluginsList,
    pub external_plugin_adapters: ExternalPluginAdaptersList,
}

/// Decoded collection account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionView {
    /// Account address
    pub public_key: Pubkey,
    pub update_authority: Pubkey,
    pub name: String,
    pub uri: String,
    pub num_minted: u32,
    pub current_size: u32,
    pub plugin_header: Option<PluginHeader>,
    pub plugins: PluginsList,
    pub external_plugin_adapters: ExternalPluginAdaptersList,
}

type PluginSection = (Option<PluginHeader>, PluginsList, ExternalPluginAdaptersList);

/// Account decoder with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct AccountDecoder {
    config: DecoderConfig,
}

impl AccountDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode an asset account's bytes
    pub fn decode_asset(&self, address: Pubkey, data: &[u8]) -> Result<AssetView> {
        let mut cursor = ByteCursor::new(data, 0);
        Key::expect(&mut cursor, Key::AssetV1)?;
        let owner = cursor.read_pubkey("owner")?;
        let update_authority = UpdateAuthority::decode(&mut cursor)?;
        let name = cursor.read_string("name")?;
        let uri = cursor.read_string("uri")?;
        let seq = cursor.read_option("seq", |c| c.read_u64("seq"))?;

        let (plugin_header, plugins, external_plugin_adapters) =
            self.decode_plugin_section(data, cursor.offset())?;
        debug!(
            asset = %address,
            plugins = plugins.len(),
            adapters = external_plugin_adapters.len(),
            "Decoded asset account"
        );

        Ok(AssetView {
            public_key: address,
            owner,
            update_authority,
            name,
            uri,
            seq,
            plugin_header,
            plugins,
            external_plugin_adapters,
        })
    }

    /// Decode a collection account's bytes
    pub fn decode_collection(&self, address: Pubkey, data: &[u8]) -> Result<CollectionView> {
        let mut cursor = ByteCursor::new(data, 0);
        Key::expect(&mut cursor, Key::CollectionV1)?;
        let update_authority = cursor.read_pubkey("update_authority")?;
        let name = cursor.read_string("name")?;
        let uri = cursor.read_string("uri")?;
        let num_minted = cursor.read_u32("num_minted")?;
        let current_size = cursor.read_u32("current_size")?;

        let (plugin_header, plugins, external_plugin_adapters) =
            self.decode_plugin_section(data, cursor.offset())?;
        debug!(
            collection = %address,
            plugins = plugins.len(),
            adapters = external_plugin_adapters.len(),
            "Decoded collection account"
        );

        Ok(CollectionView {
            public_key: address,
            update_authority,
            name,
            uri,
            num_minted,
            current_size,
            plugin_header,
            plugins,
            external_plugin_adapters,
        })
    }

    fn decode_plugin_section(&self, data: &[u8], base_len: usize) -> Result<PluginSection> {
        if data.len() <= base_len {
            return Ok((None, PluginsList::default(), ExternalPluginAdaptersList::default()));
        }

        let header = PluginHeader::decode(data, base_len)?;
        let registry_offset = to_index(header.plugin_registry_offset, data, "plugin_registry")?;
        let registry = decode_plugin_registry(data, registry_offset, &self.config)?;

        let plugins = materialize_plugins(&registry.registry, data, &self.config)?;
        let adapters = materialize_adapters(&registry.external_registry, data, &self.config)?;
        Ok((Some(header), plugins, adapters))
    }
}

/// Decode an asset account with the default configuration
pub fn decode_asset_account(address: Pubkey, data: &[u8]) -> Result<AssetView> {
    AccountDecoder::default().decode_asset(address, data)
}

/// Decode a collection account with the default configuration
pub fn decode_collection_account(address: Pubkey, data: &[u8]) -> Result<CollectionView> {
    AccountDecoder::default().decode_collection(address, data)
}
