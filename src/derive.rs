//! Collection derivation
//!
//! Combines an asset's plugin state with its collection's. Plugin slots are
//! asset-wins with no field-level merging; adapter arrays keep every asset entry
//! and append collection entries whose identity the asset does not already carry.

use std::collections::HashSet;

use tracing::debug;

use crate::account::{AssetView, CollectionView};
use crate::errors::{CoreError, Result};
use crate::types::{AdapterKind, AttachedAdapter, ExternalPluginAdaptersList, LinkedDataKey, PluginsList};

/// Derive the effective plugin state of `asset` under `collection`
///
/// Without a collection the asset is returned as is. The result never shares
/// plugin or adapter storage with the inputs.
///
/// # Errors
///
/// `UnsupportedLink` when a merged data section is linked to a lifecycle hook.
pub fn derive_asset_plugins(
    asset: &AssetView,
    collection: Option<&CollectionView>,
) -> Result<AssetView> {
    let Some(collection) = collection else {
        return Ok(asset.clone());
    };

    let plugins = merge_plugins(&asset.plugins, &collection.plugins);
    let mut external_plugin_adapters = merge_adapters(
        &asset.external_plugin_adapters,
        &collection.external_plugin_adapters,
    );
    inject_data_sections(&mut external_plugin_adapters)?;

    debug!(
        asset = %asset.public_key,
        collection = %collection.public_key,
        plugins = plugins.len(),
        adapters = external_plugin_adapters.len(),
        "Derived asset plugins"
    );

    Ok(AssetView {
        public_key: asset.public_key,
        owner: asset.owner,
        update_authority: asset.update_authority,
        name: asset.name.clone(),
        uri: asset.uri.clone(),
        seq: asset.seq,
        plugin_header: asset.plugin_header,
        plugins,
        external_plugin_adapters,
    })
}

fn prefer<T: Clone>(asset: &Option<T>, collection: &Option<T>) -> Option<T> {
    asset.clone().or_else(|| collection.clone())
}

/// Asset-wins merge of every plugin slot
///
/// `master_edition` only has meaning on a collection and is not inherited.
pub fn merge_plugins(asset: &PluginsList, collection: &PluginsList) -> PluginsList {
    PluginsList {
        royalties: prefer(&asset.royalties, &collection.royalties),
        freeze_delegate: prefer(&asset.freeze_delegate, &collection.freeze_delegate),
        burn_delegate: prefer(&asset.burn_delegate, &collection.burn_delegate),
        transfer_delegate: prefer(&asset.transfer_delegate, &collection.transfer_delegate),
        update_delegate: prefer(&asset.update_delegate, &collection.update_delegate),
        permanent_freeze_delegate: prefer(
            &asset.permanent_freeze_delegate,
            &collection.permanent_freeze_delegate,
        ),
        attributes: prefer(&asset.attributes, &collection.attributes),
        permanent_transfer_delegate: prefer(
            &asset.permanent_transfer_delegate,
            &collection.permanent_transfer_delegate,
        ),
        permanent_burn_delegate: prefer(
            &asset.permanent_burn_delegate,
            &collection.permanent_burn_delegate,
        ),
        edition: prefer(&asset.edition, &collection.edition),
        master_edition: asset.master_edition.clone(),
        add_blocker: prefer(&asset.add_blocker, &collection.add_blocker),
        immutable_metadata: prefer(&asset.immutable_metadata, &collection.immutable_metadata),
        verified_creators: prefer(&asset.verified_creators, &collection.verified_creators),
        autograph: prefer(&asset.autograph, &collection.autograph),
    }
}

/// Asset entries first, then collection entries with an identity the asset lacks
pub fn merge_adapter_list<T: AdapterKind>(
    asset: &[AttachedAdapter<T>],
    collection: &[AttachedAdapter<T>],
) -> Vec<AttachedAdapter<T>> {
    let asset_identities: HashSet<String> =
        asset.iter().map(|entry| entry.adapter.identity()).collect();

    asset
        .iter()
        .cloned()
        .chain(
            collection
                .iter()
                .filter(|entry| !asset_identities.contains(&entry.adapter.identity()))
                .cloned(),
        )
        .collect()
}

pub fn merge_adapters(
    asset: &ExternalPluginAdaptersList,
    collection: &ExternalPluginAdaptersList,
) -> ExternalPluginAdaptersList {
    ExternalPluginAdaptersList {
        lifecycle_hooks: merge_adapter_list(&asset.lifecycle_hooks, &collection.lifecycle_hooks),
        oracles: merge_adapter_list(&asset.oracles, &collection.oracles),
        app_datas: merge_adapter_list(&asset.app_datas, &collection.app_datas),
        linked_lifecycle_hooks: merge_adapter_list(
            &asset.linked_lifecycle_hooks,
            &collection.linked_lifecycle_hooks,
        ),
        linked_app_datas: merge_adapter_list(&asset.linked_app_datas, &collection.linked_app_datas),
        data_sections: merge_adapter_list(&asset.data_sections, &collection.data_sections),
    }
}

/// Copy each data section's payload onto the linked app data it belongs to
fn inject_data_sections(adapters: &mut ExternalPluginAdaptersList) -> Result<()> {
    for section in &adapters.data_sections {
        match section.adapter.parent_key {
            LinkedDataKey::LinkedLifecycleHook(hooked_program) => {
                return Err(CoreError::UnsupportedLink { hooked_program });
            }
            LinkedDataKey::LinkedAppData(authority) => {
                if let Some(linked) = adapters
                    .linked_app_datas
                    .iter_mut()
                    .find(|linked| linked.adapter.data_authority == authority)
                {
                    linked.data = section.data.clone();
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AdapterData, ExternalPluginAdapterSchema, LinkedAppData, Oracle, PluginAuthority,
        ValidationResultsOffset,
    };
    use solana_sdk::pubkey::Pubkey;

    fn attach<T>(adapter: T, data: Option<AdapterData>) -> AttachedAdapter<T> {
        AttachedAdapter {
            authority: PluginAuthority::UpdateAuthority,
            offset: 0,
            lifecycle_checks: None,
            data_offset: None,
            data_len: None,
            data,
            adapter,
        }
    }

    fn oracle(base_address: Pubkey) -> AttachedAdapter<Oracle> {
        attach(
            Oracle {
                base_address,
                base_address_config: None,
                results_offset: ValidationResultsOffset::NoOffset,
            },
            None,
        )
    }

    #[test]
    fn test_oracle_dedup_by_base_address() {
        let shared = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        let merged = merge_adapter_list(&[oracle(shared)], &[oracle(shared)]);
        assert_eq!(merged.len(), 1);

        let merged = merge_adapter_list(&[oracle(shared)], &[oracle(other)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].adapter.base_address, shared);
        assert_eq!(merged[1].adapter.base_address, other);
    }

    #[test]
    fn test_linked_app_data_dedup_includes_address() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let linked = |address| {
            attach(
                LinkedAppData {
                    data_authority: PluginAuthority::Address { address },
                    schema: ExternalPluginAdapterSchema::Binary,
                },
                None,
            )
        };

        assert_eq!(merge_adapter_list(&[linked(a)], &[linked(a)]).len(), 1);
        assert_eq!(merge_adapter_list(&[linked(a)], &[linked(b)]).len(), 2);
    }

    #[test]
    fn test_collection_duplicates_among_themselves_are_kept() {
        let x = Pubkey::new_unique();
        let merged = merge_adapter_list(&[], &[oracle(x), oracle(x)]);
        assert_eq!(merged.len(), 2);
    }
}
