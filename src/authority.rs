//! Authority resolution
//!
//! Decides whether a principal may mutate a plugin or perform a lifecycle action on
//! an asset. Plugin lookups always go through the derived (asset + collection) view.

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::account::{AssetView, CollectionView};
use crate::derive::derive_asset_plugins;
use crate::errors::{CoreError, Result};
use crate::types::{PluginAuthority, PluginType, UpdateAuthority};

/// Collection the asset belongs to, if its update authority is a collection
pub fn collection_address_of(asset: &AssetView) -> Option<Pubkey> {
    match asset.update_authority {
        UpdateAuthority::Collection(address) => Some(address),
        UpdateAuthority::Address(_) | UpdateAuthority::None => None,
    }
}

pub fn is_owner(principal: &Pubkey, asset: &AssetView) -> bool {
    *principal == asset.owner
}

/// Check update authority over the asset
///
/// For an asset in a collection the collection's update authority applies, and
/// without the collection at hand nobody qualifies.
pub fn has_update_authority(
    principal: &Pubkey,
    asset: &AssetView,
    collection: Option<&CollectionView>,
) -> bool {
    match asset.update_authority {
        UpdateAuthority::Collection(_) => {
            collection.is_some_and(|collection| collection.update_authority == *principal)
        }
        UpdateAuthority::Address(address) => address == *principal,
        UpdateAuthority::None => false,
    }
}

/// Check a principal against a plugin's authority
pub fn plugin_authority_matches(
    principal: &Pubkey,
    authority: &PluginAuthority,
    asset: &AssetView,
    collection: Option<&CollectionView>,
) -> bool {
    match authority {
        PluginAuthority::None => false,
        PluginAuthority::Owner => is_owner(principal, asset),
        PluginAuthority::UpdateAuthority => has_update_authority(principal, asset, collection),
        PluginAuthority::Address { address } => address == principal,
    }
}

/// Arguments of [`check_plugin_authorities`]
#[derive(Debug, Clone, Copy)]
pub struct PluginAuthorityCheck<'a> {
    pub principal: Pubkey,
    pub plugin_types: &'a [PluginType],
    pub asset: &'a AssetView,
    pub collection: Option<&'a CollectionView>,
}

fn ensure_collection_matches(asset: &AssetView, collection: Option<&CollectionView>) -> Result<()> {
    if let (Some(asset_collection), Some(collection)) = (collection_address_of(asset), collection) {
        if asset_collection != collection.public_key {
            return Err(CoreError::CollectionMismatch {
                asset_collection,
                supplied: collection.public_key,
            });
        }
    }
    Ok(())
}

fn slot_matches(
    derived: &AssetView,
    plugin_type: PluginType,
    principal: &Pubkey,
    asset: &AssetView,
    collection: Option<&CollectionView>,
) -> bool {
    derived
        .plugins
        .authority_of(plugin_type)
        .is_some_and(|authority| plugin_authority_matches(principal, &authority, asset, collection))
}

/// Check the principal against each requested plugin type of the derived asset
///
/// Returns one flag per requested type, in input order; a type the derived asset
/// does not carry is `false`.
///
/// # Errors
///
/// `CollectionMismatch` when the asset names a different collection than the one
/// supplied, plus any derivation error.
pub fn check_plugin_authorities(args: &PluginAuthorityCheck<'_>) -> Result<Vec<bool>> {
    ensure_collection_matches(args.asset, args.collection)?;
    let derived = derive_asset_plugins(args.asset, args.collection)?;

    Ok(args
        .plugin_types
        .iter()
        .map(|plugin_type| {
            slot_matches(
                &derived,
                *plugin_type,
                &args.principal,
                args.asset,
                args.collection,
            )
        })
        .collect())
}

fn frozen_in(derived: &AssetView) -> bool {
    derived
        .plugins
        .freeze_delegate
        .as_ref()
        .is_some_and(|p| p.plugin.frozen)
        || derived
            .plugins
            .permanent_freeze_delegate
            .as_ref()
            .is_some_and(|p| p.plugin.frozen)
}

/// Whether the derived asset is frozen by either freeze delegate
pub fn is_frozen(asset: &AssetView, collection: Option<&CollectionView>) -> Result<bool> {
    Ok(frozen_in(&derive_asset_plugins(asset, collection)?))
}

/// Shared shape of transfer and burn permission
///
/// The permanent delegate bypasses the freeze gate; otherwise the asset must be
/// unfrozen and the principal must own it or hold the regular delegate.
fn can_act(
    principal: &Pubkey,
    asset: &AssetView,
    collection: Option<&CollectionView>,
    permanent: PluginType,
    delegate: PluginType,
) -> Result<bool> {
    ensure_collection_matches(asset, collection)?;
    let derived = derive_asset_plugins(asset, collection)?;

    if slot_matches(&derived, permanent, principal, asset, collection) {
        return Ok(true);
    }
    if frozen_in(&derived) {
        return Ok(false);
    }
    if is_owner(principal, asset) {
        return Ok(true);
    }
    Ok(slot_matches(&derived, delegate, principal, asset, collection))
}

pub fn can_transfer(
    principal: &Pubkey,
    asset: &AssetView,
    collection: Option<&CollectionView>,
) -> Result<bool> {
    let allowed = can_act(
        principal,
        asset,
        collection,
        PluginType::PermanentTransferDelegate,
        PluginType::TransferDelegate,
    )?;
    debug!(principal = %principal, asset = %asset.public_key, allowed, "Resolved transfer permission");
    Ok(allowed)
}

pub fn can_burn(
    principal: &Pubkey,
    asset: &AssetView,
    collection: Option<&CollectionView>,
) -> Result<bool> {
    let allowed = can_act(
        principal,
        asset,
        collection,
        PluginType::PermanentBurnDelegate,
        PluginType::BurnDelegate,
    )?;
    debug!(principal = %principal, asset = %asset.public_key, allowed, "Resolved burn permission");
    Ok(allowed)
}

pub fn can_update(
    principal: &Pubkey,
    asset: &AssetView,
    collection: Option<&CollectionView>,
) -> bool {
    has_update_authority(principal, asset, collection)
}
