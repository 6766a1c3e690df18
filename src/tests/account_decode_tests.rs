//! Account decoding scenarios built from full account buffers

use solana_sdk::pubkey::Pubkey;

use crate::account::{decode_asset_account, decode_collection_account, AccountDecoder};
use crate::config::{DecoderConfig, DuplicatePluginPolicy};
use crate::errors::CoreError;
use crate::registry::PluginHeader;
use crate::test_utils::{AccountBuilder, AdapterEntry};
use crate::types::{
    AdapterData, AppData, Attribute, Attributes, Edition, ExternalCheckResult,
    ExternalPluginAdapter, ExternalPluginAdapterSchema, FreezeDelegate, HookableLifecycleEvent,
    Key, LifecycleHook, MasterEdition, Oracle, Plugin, PluginAuthority, PluginType,
    TransferDelegate, UpdateAuthority, ValidationResultsOffset,
};

fn oracle(base_address: Pubkey) -> ExternalPluginAdapter {
    ExternalPluginAdapter::Oracle(Oracle {
        base_address,
        base_address_config: None,
        results_offset: ValidationResultsOffset::Anchor,
    })
}

#[test]
fn test_unknown_plugin_tag_is_filtered() {
    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .plugin(
            PluginAuthority::Owner,
            Plugin::FreezeDelegate(FreezeDelegate { frozen: false }),
        )
        .unknown_plugin(200, PluginAuthority::UpdateAuthority)
        .build();

    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    assert_eq!(asset.plugins.plugin_types(), vec![PluginType::FreezeDelegate]);
}

#[test]
fn test_records_after_unknown_tag_stay_aligned() {
    let delegate = Pubkey::new_unique();
    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .unknown_plugin(99, PluginAuthority::Address { address: delegate })
        .plugin(
            PluginAuthority::Address { address: delegate },
            Plugin::TransferDelegate(TransferDelegate),
        )
        .plugin(
            PluginAuthority::UpdateAuthority,
            Plugin::Attributes(Attributes {
                attribute_list: vec![Attribute {
                    key: "level".to_string(),
                    value: "7".to_string(),
                }],
            }),
        )
        .build();

    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    assert_eq!(
        asset.plugins.authority_of(PluginType::TransferDelegate),
        Some(PluginAuthority::Address { address: delegate })
    );
    let attributes = asset.plugins.attributes.unwrap();
    assert_eq!(attributes.plugin.attribute_list[0].value, "7");
}

#[test]
fn test_registry_without_external_section() {
    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .plugin(PluginAuthority::UpdateAuthority, Plugin::Edition(Edition { number: 3 }))
        .without_external_section()
        .build();

    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    assert_eq!(asset.plugins.edition.unwrap().plugin.number, 3);
    assert!(asset.external_plugin_adapters.is_empty());
}

#[test]
fn test_external_adapters_with_checks_and_data() {
    let base = Pubkey::new_unique();
    let hooked = Pubkey::new_unique();
    let writer = Pubkey::new_unique();

    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .adapter(
            AdapterEntry::new(PluginAuthority::UpdateAuthority, oracle(base)).listening(
                HookableLifecycleEvent::Transfer,
                ExternalCheckResult::CAN_REJECT,
            ),
        )
        .adapter(
            AdapterEntry::new(
                PluginAuthority::UpdateAuthority,
                ExternalPluginAdapter::LifecycleHook(LifecycleHook {
                    hooked_program: hooked,
                    extra_accounts: None,
                    data_authority: None,
                    schema: ExternalPluginAdapterSchema::Binary,
                }),
            )
            .listening(HookableLifecycleEvent::Burn, ExternalCheckResult::CAN_LISTEN)
            .listening(HookableLifecycleEvent::Create, ExternalCheckResult::CAN_APPROVE)
            .with_data(&[1, 2, 3]),
        )
        .adapter(
            AdapterEntry::new(
                PluginAuthority::UpdateAuthority,
                ExternalPluginAdapter::AppData(AppData {
                    data_authority: PluginAuthority::Address { address: writer },
                    schema: ExternalPluginAdapterSchema::Json,
                }),
            )
            .with_data(br#"{"score":10}"#),
        )
        .build();

    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    let adapters = &asset.external_plugin_adapters;
    assert_eq!(adapters.len(), 3);

    let oracle = &adapters.oracles[0];
    assert_eq!(oracle.adapter.base_address, base);
    assert!(oracle
        .check_for(HookableLifecycleEvent::Transfer)
        .unwrap()
        .can_reject());
    assert!(oracle.check_for(HookableLifecycleEvent::Burn).is_none());
    assert!(oracle.data.is_none());

    let hook = &adapters.lifecycle_hooks[0];
    assert_eq!(hook.adapter.hooked_program, hooked);
    assert_eq!(hook.lifecycle_checks.as_ref().unwrap().len(), 2);
    assert_eq!(hook.data, Some(AdapterData::Binary(vec![1, 2, 3])));
    assert_eq!(hook.data_len, Some(3));

    assert_eq!(
        adapters.app_datas[0].data,
        Some(AdapterData::Json(serde_json::json!({ "score": 10 })))
    );
}

#[test]
fn test_unwritten_json_app_data_is_empty() {
    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .adapter(
            AdapterEntry::new(
                PluginAuthority::UpdateAuthority,
                ExternalPluginAdapter::AppData(AppData {
                    data_authority: PluginAuthority::Owner,
                    schema: ExternalPluginAdapterSchema::Json,
                }),
            )
            .with_data(&[]),
        )
        .build();

    let lenient = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    let app_data = &lenient.external_plugin_adapters.app_datas[0];
    assert_eq!(app_data.data_len, Some(0));
    assert_eq!(app_data.data, None);

    let strict = AccountDecoder::new(DecoderConfig {
        json_fallback_to_binary: false,
        ..DecoderConfig::default()
    });
    let asset = strict.decode_asset(Pubkey::new_unique(), &data).unwrap();
    assert_eq!(asset.external_plugin_adapters.app_datas[0].data, None);
}

#[test]
fn test_unknown_adapter_tag_is_filtered() {
    let base = Pubkey::new_unique();
    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .adapter(AdapterEntry::new(PluginAuthority::None, oracle(base)))
        .unknown_adapter(42, PluginAuthority::Owner)
        .build();

    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    assert_eq!(asset.external_plugin_adapters.len(), 1);
    assert_eq!(asset.external_plugin_adapters.oracles[0].adapter.base_address, base);
}

#[test]
fn test_truncated_external_entry_drops_the_rest() {
    let first = Pubkey::new_unique();
    let mut data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .adapter(AdapterEntry::new(PluginAuthority::None, oracle(first)))
        .adapter(AdapterEntry::new(PluginAuthority::None, oracle(Pubkey::new_unique())))
        .build();
    // Cut into the payload offset of the last external record
    data.truncate(data.len() - 3);

    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    assert_eq!(asset.external_plugin_adapters.oracles.len(), 1);
    assert_eq!(asset.external_plugin_adapters.oracles[0].adapter.base_address, first);
}

#[test]
fn test_duplicate_plugin_policy_from_config() {
    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .plugin(
            PluginAuthority::Owner,
            Plugin::FreezeDelegate(FreezeDelegate { frozen: false }),
        )
        .plugin(
            PluginAuthority::UpdateAuthority,
            Plugin::FreezeDelegate(FreezeDelegate { frozen: true }),
        )
        .build();

    let lenient = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    let freeze = lenient.plugins.freeze_delegate.unwrap();
    assert_eq!(freeze.authority, PluginAuthority::UpdateAuthority);
    assert!(freeze.plugin.frozen);

    let strict = AccountDecoder::new(DecoderConfig {
        duplicate_plugins: DuplicatePluginPolicy::Reject,
        ..DecoderConfig::default()
    });
    assert!(matches!(
        strict.decode_asset(Pubkey::new_unique(), &data),
        Err(CoreError::DuplicatePlugin {
            plugin_type: PluginType::FreezeDelegate,
            ..
        })
    ));
}

#[test]
fn test_registry_key_is_validated() {
    let builder = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None).plugin(
        PluginAuthority::Owner,
        Plugin::FreezeDelegate(FreezeDelegate { frozen: false }),
    );
    let mut data = builder.build();
    let header = PluginHeader::decode(&data, builder.base_len()).unwrap();
    data[header.plugin_registry_offset as usize] = Key::AssetV1 as u8;

    assert_eq!(
        decode_asset_account(Pubkey::new_unique(), &data).unwrap_err(),
        CoreError::UnexpectedKey {
            expected: Key::PluginRegistryV1,
            found: Key::AssetV1 as u8,
        }
    );
}

#[test]
fn test_registry_offset_out_of_bounds() {
    let builder = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None).plugin(
        PluginAuthority::Owner,
        Plugin::FreezeDelegate(FreezeDelegate { frozen: false }),
    );
    let mut data = builder.build();
    let at = builder.base_len() + 1;
    let past_end = data.len() as u64 + 10;
    data[at..at + 8].copy_from_slice(&past_end.to_le_bytes());

    assert!(matches!(
        decode_asset_account(Pubkey::new_unique(), &data),
        Err(CoreError::Decode { .. })
    ));
}

#[test]
fn test_collection_with_master_edition() {
    let update_authority = Pubkey::new_unique();
    let address = Pubkey::new_unique();
    let data = AccountBuilder::collection(update_authority)
        .plugin(
            PluginAuthority::UpdateAuthority,
            Plugin::MasterEdition(MasterEdition {
                max_supply: Some(10),
                name: Some("Prints".to_string()),
                uri: None,
            }),
        )
        .build();

    let collection = decode_collection_account(address, &data).unwrap();
    assert_eq!(collection.public_key, address);
    assert_eq!(collection.update_authority, update_authority);
    assert_eq!(collection.name, "Test Collection");
    assert_eq!(collection.num_minted, 0);
    let master = collection.plugins.master_edition.unwrap();
    assert_eq!(master.plugin.max_supply, Some(10));
    assert!(collection.plugin_header.is_some());
}

#[test]
fn test_asset_metadata_fields() {
    let owner = Pubkey::new_unique();
    let collection = Pubkey::new_unique();
    let data = AccountBuilder::asset_with_metadata(
        owner,
        UpdateAuthority::Collection(collection),
        "Sword #1",
        "https://example.com/sword.json",
        Some(4),
    )
    .build();

    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();
    assert_eq!(asset.owner, owner);
    assert_eq!(asset.update_authority, UpdateAuthority::Collection(collection));
    assert_eq!(asset.name, "Sword #1");
    assert_eq!(asset.seq, Some(4));
}

#[test]
fn test_asset_view_serializes_payloads() {
    let data = AccountBuilder::asset(Pubkey::new_unique(), UpdateAuthority::None)
        .plugin(
            PluginAuthority::Owner,
            Plugin::FreezeDelegate(FreezeDelegate { frozen: true }),
        )
        .adapter(
            AdapterEntry::new(
                PluginAuthority::UpdateAuthority,
                ExternalPluginAdapter::AppData(AppData {
                    data_authority: PluginAuthority::Owner,
                    schema: ExternalPluginAdapterSchema::Json,
                }),
            )
            .with_data(br#"{"level":2}"#),
        )
        .build();
    let asset = decode_asset_account(Pubkey::new_unique(), &data).unwrap();

    let value = serde_json::to_value(&asset).unwrap();
    let freeze = &value["plugins"]["freezeDelegate"];
    assert_eq!(freeze["authority"], serde_json::json!("owner"));
    assert_eq!(freeze["plugin"]["frozen"], serde_json::json!(true));

    let app_data = &value["externalPluginAdapters"]["appDatas"][0];
    assert_eq!(app_data["adapter"]["schema"], serde_json::json!("json"));
    assert_eq!(app_data["data"]["json"]["level"], serde_json::json!(2));
    assert!(value["externalPluginAdapters"]["dataSections"].is_array());
}
