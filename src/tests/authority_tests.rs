//! Authority resolution scenarios

use solana_sdk::pubkey::Pubkey;

use crate::account::{decode_asset_account, decode_collection_account, AssetView, CollectionView};
use crate::authority::{
    can_burn, can_transfer, can_update, check_plugin_authorities, has_update_authority,
    is_frozen, plugin_authority_matches, PluginAuthorityCheck,
};
use crate::errors::CoreError;
use crate::test_utils::AccountBuilder;
use crate::types::{
    BurnDelegate, FreezeDelegate, PermanentFreezeDelegate, PermanentTransferDelegate, Plugin,
    PluginAuthority, PluginType, TransferDelegate, UpdateAuthority,
};

fn asset(builder: AccountBuilder) -> AssetView {
    decode_asset_account(Pubkey::new_unique(), &builder.build()).unwrap()
}

fn collection_at(address: Pubkey, builder: AccountBuilder) -> CollectionView {
    decode_collection_account(address, &builder.build()).unwrap()
}

#[test]
fn test_plugin_authority_matrix() {
    let owner = Pubkey::new_unique();
    let update_authority = Pubkey::new_unique();
    let arbitrary = Pubkey::new_unique();
    let asset = asset(AccountBuilder::asset(
        owner,
        UpdateAuthority::Address(update_authority),
    ));

    for principal in [owner, update_authority, arbitrary] {
        let authorities = [
            (PluginAuthority::None, false),
            (PluginAuthority::Owner, principal == owner),
            (
                PluginAuthority::UpdateAuthority,
                principal == update_authority,
            ),
            (PluginAuthority::Address { address: principal }, true),
            (
                PluginAuthority::Address {
                    address: Pubkey::new_unique(),
                },
                false,
            ),
        ];
        for (authority, expected) in authorities {
            assert_eq!(
                plugin_authority_matches(&principal, &authority, &asset, None),
                expected,
                "authority {:?} principal {}",
                authority,
                principal
            );
        }
    }
}

#[test]
fn test_update_authority_through_collection() {
    let collection_address = Pubkey::new_unique();
    let collection_authority = Pubkey::new_unique();
    let asset = asset(AccountBuilder::asset(
        Pubkey::new_unique(),
        UpdateAuthority::Collection(collection_address),
    ));
    let collection = collection_at(
        collection_address,
        AccountBuilder::collection(collection_authority),
    );

    assert!(has_update_authority(&collection_authority, &asset, Some(&collection)));
    assert!(!has_update_authority(&collection_authority, &asset, None));
    assert!(!has_update_authority(&collection_address, &asset, Some(&collection)));
    assert!(can_update(&collection_authority, &asset, Some(&collection)));
}

#[test]
fn test_check_plugin_authorities_in_request_order() {
    let owner = Pubkey::new_unique();
    let delegate = Pubkey::new_unique();
    let asset = asset(
        AccountBuilder::asset(owner, UpdateAuthority::None)
            .plugin(
                PluginAuthority::Owner,
                Plugin::FreezeDelegate(FreezeDelegate { frozen: false }),
            )
            .plugin(
                PluginAuthority::Address { address: delegate },
                Plugin::TransferDelegate(TransferDelegate),
            ),
    );

    let checks = check_plugin_authorities(&PluginAuthorityCheck {
        principal: owner,
        plugin_types: &[
            PluginType::TransferDelegate,
            PluginType::FreezeDelegate,
            PluginType::Royalties,
        ],
        asset: &asset,
        collection: None,
    })
    .unwrap();
    assert_eq!(checks, vec![false, true, false]);
}

#[test]
fn test_collection_mismatch_is_fatal() {
    let embedded = Pubkey::new_unique();
    let other = Pubkey::new_unique();
    let asset = asset(AccountBuilder::asset(
        Pubkey::new_unique(),
        UpdateAuthority::Collection(embedded),
    ));
    let collection = collection_at(other, AccountBuilder::collection(Pubkey::new_unique()));

    let err = check_plugin_authorities(&PluginAuthorityCheck {
        principal: asset.owner,
        plugin_types: &[PluginType::FreezeDelegate],
        asset: &asset,
        collection: Some(&collection),
    })
    .unwrap_err();
    assert_eq!(
        err,
        CoreError::CollectionMismatch {
            asset_collection: embedded,
            supplied: other,
        }
    );
    assert!(can_transfer(&asset.owner, &asset, Some(&collection)).is_err());
}

#[test]
fn test_plugin_inherited_from_collection_is_checked() {
    let collection_address = Pubkey::new_unique();
    let collection_authority = Pubkey::new_unique();
    let owner = Pubkey::new_unique();
    let asset = asset(AccountBuilder::asset(
        owner,
        UpdateAuthority::Collection(collection_address),
    ));
    let collection = collection_at(
        collection_address,
        AccountBuilder::collection(collection_authority).plugin(
            PluginAuthority::UpdateAuthority,
            Plugin::PermanentFreezeDelegate(PermanentFreezeDelegate { frozen: true }),
        ),
    );

    let checks = check_plugin_authorities(&PluginAuthorityCheck {
        principal: collection_authority,
        plugin_types: &[PluginType::PermanentFreezeDelegate],
        asset: &asset,
        collection: Some(&collection),
    })
    .unwrap();
    assert_eq!(checks, vec![true]);

    assert!(is_frozen(&asset, Some(&collection)).unwrap());
    assert!(!is_frozen(&asset, None).unwrap());
    assert!(!can_transfer(&owner, &asset, Some(&collection)).unwrap());
    assert!(can_transfer(&owner, &asset, None).unwrap());
}

#[test]
fn test_owner_transfer_blocked_by_freeze() {
    let owner = Pubkey::new_unique();
    let frozen = asset(AccountBuilder::asset(owner, UpdateAuthority::None).plugin(
        PluginAuthority::Owner,
        Plugin::FreezeDelegate(FreezeDelegate { frozen: true }),
    ));
    let thawed = asset(AccountBuilder::asset(owner, UpdateAuthority::None).plugin(
        PluginAuthority::Owner,
        Plugin::FreezeDelegate(FreezeDelegate { frozen: false }),
    ));

    assert!(!can_transfer(&owner, &frozen, None).unwrap());
    assert!(!can_burn(&owner, &frozen, None).unwrap());
    assert!(can_transfer(&owner, &thawed, None).unwrap());
    assert!(can_burn(&owner, &thawed, None).unwrap());
}

#[test]
fn test_permanent_delegate_bypasses_freeze() {
    let owner = Pubkey::new_unique();
    let permanent = Pubkey::new_unique();
    let asset = asset(
        AccountBuilder::asset(owner, UpdateAuthority::None)
            .plugin(
                PluginAuthority::Owner,
                Plugin::FreezeDelegate(FreezeDelegate { frozen: true }),
            )
            .plugin(
                PluginAuthority::Address { address: permanent },
                Plugin::PermanentTransferDelegate(PermanentTransferDelegate),
            ),
    );

    assert!(can_transfer(&permanent, &asset, None).unwrap());
    assert!(!can_burn(&permanent, &asset, None).unwrap());
    assert!(!can_transfer(&owner, &asset, None).unwrap());
}

#[test]
fn test_regular_delegates() {
    let owner = Pubkey::new_unique();
    let delegate = Pubkey::new_unique();
    let stranger = Pubkey::new_unique();
    let asset = asset(
        AccountBuilder::asset(owner, UpdateAuthority::None)
            .plugin(
                PluginAuthority::Address { address: delegate },
                Plugin::TransferDelegate(TransferDelegate),
            )
            .plugin(
                PluginAuthority::Address { address: delegate },
                Plugin::BurnDelegate(BurnDelegate),
            ),
    );

    assert!(can_transfer(&delegate, &asset, None).unwrap());
    assert!(can_burn(&delegate, &asset, None).unwrap());
    assert!(!can_transfer(&stranger, &asset, None).unwrap());
    assert!(!can_burn(&stranger, &asset, None).unwrap());
    assert!(!can_update(&owner, &asset, None));
}
