//! Test Utilities Module
//!
//! Builders for asset and collection account buffers in the on-chain layout, so
//! decoder, derivation and authority tests can start from real bytes instead of
//! hand-assembled views.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use borsh::BorshSerialize;
use solana_sdk::pubkey::Pubkey;

use crate::registry::PluginHeader;
use crate::types::{
    ExternalPluginAdapter, ExternalPluginAdapterSchema, ExtraAccount, HookableLifecycleEvent, Key,
    LinkedDataKey, Plugin, PluginAuthority, RuleSet, Seed, UpdateAuthority,
    ValidationResultsOffset,
};

/// Borsh writer for account structures
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put<T: BorshSerialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        value
            .serialize(&mut self.buf)
            .expect("writing to a Vec cannot fail");
        self
    }

    pub fn pubkey(&mut self, key: &Pubkey) -> &mut Self {
        self.buf.extend_from_slice(key.as_ref());
        self
    }

    pub fn option<T>(&mut self, value: Option<&T>, f: impl FnOnce(&mut Self, &T)) -> &mut Self {
        match value {
            Some(value) => {
                self.put(&1u8);
                f(self, value);
            }
            None => {
                self.put(&0u8);
            }
        }
        self
    }

    pub fn vec<T>(&mut self, items: &[T], f: impl Fn(&mut Self, &T)) -> &mut Self {
        self.put(&(items.len() as u32));
        for item in items {
            f(self, item);
        }
        self
    }

    pub fn authority(&mut self, authority: &PluginAuthority) -> &mut Self {
        match authority {
            PluginAuthority::None => self.put(&0u8),
            PluginAuthority::Owner => self.put(&1u8),
            PluginAuthority::UpdateAuthority => self.put(&2u8),
            PluginAuthority::Address { address } => self.put(&3u8).pubkey(address),
        }
    }

    pub fn update_authority(&mut self, authority: &UpdateAuthority) -> &mut Self {
        match authority {
            UpdateAuthority::None => self.put(&0u8),
            UpdateAuthority::Address(address) => self.put(&1u8).pubkey(address),
            UpdateAuthority::Collection(address) => self.put(&2u8).pubkey(address),
        }
    }

    /// Plugin payload: type tag followed by its fields
    pub fn plugin(&mut self, plugin: &Plugin) -> &mut Self {
        self.put(&(plugin.plugin_type() as u8));
        match plugin {
            Plugin::Royalties(p) => {
                self.put(&p.basis_points);
                self.vec(&p.creators, |e, c| {
                    e.pubkey(&c.address).put(&c.percentage);
                });
                match &p.rule_set {
                    RuleSet::None => self.put(&0u8),
                    RuleSet::ProgramAllowList(list) => {
                        self.put(&1u8).vec(list, |e, k| {
                            e.pubkey(k);
                        })
                    }
                    RuleSet::ProgramDenyList(list) => {
                        self.put(&2u8).vec(list, |e, k| {
                            e.pubkey(k);
                        })
                    }
                }
            }
            Plugin::FreezeDelegate(p) => self.put(&p.frozen),
            Plugin::PermanentFreezeDelegate(p) => self.put(&p.frozen),
            Plugin::UpdateDelegate(p) => self.vec(&p.additional_delegates, |e, k| {
                e.pubkey(k);
            }),
            Plugin::Attributes(p) => self.vec(&p.attribute_list, |e, a| {
                e.put(a.key.as_str()).put(a.value.as_str());
            }),
            Plugin::Edition(p) => self.put(&p.number),
            Plugin::MasterEdition(p) => self
                .option(p.max_supply.as_ref(), |e, v| {
                    e.put(v);
                })
                .option(p.name.as_ref(), |e, v| {
                    e.put(v.as_str());
                })
                .option(p.uri.as_ref(), |e, v| {
                    e.put(v.as_str());
                }),
            Plugin::VerifiedCreators(p) => self.vec(&p.signatures, |e, s| {
                e.pubkey(&s.address).put(&s.verified);
            }),
            Plugin::Autograph(p) => self.vec(&p.signatures, |e, s| {
                e.pubkey(&s.address).put(s.message.as_str());
            }),
            Plugin::BurnDelegate(_)
            | Plugin::TransferDelegate(_)
            | Plugin::PermanentTransferDelegate(_)
            | Plugin::PermanentBurnDelegate(_)
            | Plugin::AddBlocker(_)
            | Plugin::ImmutableMetadata(_) => self,
        }
    }

    pub fn schema(&mut self, schema: ExternalPluginAdapterSchema) -> &mut Self {
        let tag: u8 = match schema {
            ExternalPluginAdapterSchema::Binary => 0,
            ExternalPluginAdapterSchema::Json => 1,
            ExternalPluginAdapterSchema::MsgPack => 2,
        };
        self.put(&tag)
    }

    pub fn seed(&mut self, seed: &Seed) -> &mut Self {
        match seed {
            Seed::Collection => self.put(&0u8),
            Seed::Owner => self.put(&1u8),
            Seed::Recipient => self.put(&2u8),
            Seed::Asset => self.put(&3u8),
            Seed::Address(address) => self.put(&4u8).pubkey(address),
            Seed::Bytes(bytes) => self.put(&5u8).put(bytes),
        }
    }

    pub fn extra_account(&mut self, extra: &ExtraAccount) -> &mut Self {
        let (is_signer, is_writable) = extra.flags();
        match extra {
            ExtraAccount::PreconfiguredProgram { .. } => self.put(&0u8),
            ExtraAccount::PreconfiguredCollection { .. } => self.put(&1u8),
            ExtraAccount::PreconfiguredOwner { .. } => self.put(&2u8),
            ExtraAccount::PreconfiguredRecipient { .. } => self.put(&3u8),
            ExtraAccount::PreconfiguredAsset { .. } => self.put(&4u8),
            ExtraAccount::CustomPda {
                seeds,
                custom_program_id,
                ..
            } => self
                .put(&5u8)
                .vec(seeds, |e, s| {
                    e.seed(s);
                })
                .option(custom_program_id.as_ref(), |e, k| {
                    e.pubkey(k);
                }),
            ExtraAccount::Address { address, .. } => self.put(&6u8).pubkey(address),
        };
        self.put(&is_signer).put(&is_writable)
    }

    fn hook_fields(
        &mut self,
        hooked_program: &Pubkey,
        extra_accounts: &Option<Vec<ExtraAccount>>,
        data_authority: &Option<PluginAuthority>,
        schema: ExternalPluginAdapterSchema,
    ) -> &mut Self {
        self.pubkey(hooked_program)
            .option(extra_accounts.as_ref(), |e, list| {
                e.vec(list, |e, x| {
                    e.extra_account(x);
                });
            })
            .option(data_authority.as_ref(), |e, a| {
                e.authority(a);
            })
            .schema(schema)
    }

    /// Adapter payload: adapter type tag followed by its fields
    pub fn adapter(&mut self, adapter: &ExternalPluginAdapter) -> &mut Self {
        self.put(&(adapter.adapter_type() as u8));
        match adapter {
            ExternalPluginAdapter::LifecycleHook(a) => {
                self.hook_fields(&a.hooked_program, &a.extra_accounts, &a.data_authority, a.schema)
            }
            ExternalPluginAdapter::LinkedLifecycleHook(a) => {
                self.hook_fields(&a.hooked_program, &a.extra_accounts, &a.data_authority, a.schema)
            }
            ExternalPluginAdapter::Oracle(a) => {
                self.pubkey(&a.base_address)
                    .option(a.base_address_config.as_ref(), |e, x| {
                        e.extra_account(x);
                    });
                match a.results_offset {
                    ValidationResultsOffset::NoOffset => self.put(&0u8),
                    ValidationResultsOffset::Anchor => self.put(&1u8),
                    ValidationResultsOffset::Custom(offset) => self.put(&2u8).put(&offset),
                }
            }
            ExternalPluginAdapter::AppData(a) => self.authority(&a.data_authority).schema(a.schema),
            ExternalPluginAdapter::LinkedAppData(a) => {
                self.authority(&a.data_authority).schema(a.schema)
            }
            ExternalPluginAdapter::DataSection(a) => {
                match &a.parent_key {
                    LinkedDataKey::LinkedLifecycleHook(program) => self.put(&0u8).pubkey(program),
                    LinkedDataKey::LinkedAppData(authority) => self.put(&1u8).authority(authority),
                };
                self.schema(a.schema)
            }
        }
    }
}

/// External adapter queued on an [`AccountBuilder`]
#[derive(Debug, Clone)]
pub struct AdapterEntry {
    pub authority: PluginAuthority,
    pub lifecycle_checks: Option<Vec<(HookableLifecycleEvent, u32)>>,
    pub adapter: ExternalPluginAdapter,
    pub data: Option<Vec<u8>>,
}

impl AdapterEntry {
    pub fn new(authority: PluginAuthority, adapter: ExternalPluginAdapter) -> Self {
        Self {
            authority,
            lifecycle_checks: None,
            adapter,
            data: None,
        }
    }

    /// Register a check result for `event`
    pub fn listening(mut self, event: HookableLifecycleEvent, flags: u32) -> Self {
        self.lifecycle_checks
            .get_or_insert_with(Vec::new)
            .push((event, flags));
        self
    }

    pub fn with_data(mut self, data: &[u8]) -> Self {
        self.data = Some(data.to_vec());
        self
    }
}

#[derive(Debug, Clone)]
enum PluginEntry {
    Known(PluginAuthority, Plugin),
    Unknown(u8, PluginAuthority),
}

/// Account buffer builder
///
/// Layout produced: base record, plugin header, plugin payloads, adapter payloads
/// each followed by their data, then the registry.
#[derive(Debug, Clone)]
pub struct AccountBuilder {
    base: Vec<u8>,
    plugins: Vec<PluginEntry>,
    adapters: Vec<AdapterEntry>,
    unknown_adapters: Vec<(u8, PluginAuthority)>,
    external_section: bool,
}

impl AccountBuilder {
    fn from_base(base: Vec<u8>) -> Self {
        Self {
            base,
            plugins: Vec::new(),
            adapters: Vec::new(),
            unknown_adapters: Vec::new(),
            external_section: true,
        }
    }

    /// AssetV1 with test metadata and no `seq`
    pub fn asset(owner: Pubkey, update_authority: UpdateAuthority) -> Self {
        Self::asset_with_metadata(
            owner,
            update_authority,
            "Test Asset",
            "https://example.com/asset.json",
            None,
        )
    }

    pub fn asset_with_metadata(
        owner: Pubkey,
        update_authority: UpdateAuthority,
        name: &str,
        uri: &str,
        seq: Option<u64>,
    ) -> Self {
        let mut e = Encoder::new();
        e.put(&(Key::AssetV1 as u8))
            .pubkey(&owner)
            .update_authority(&update_authority)
            .put(name)
            .put(uri)
            .option(seq.as_ref(), |e, v| {
                e.put(v);
            });
        Self::from_base(e.into_bytes())
    }

    /// CollectionV1 with test metadata
    pub fn collection(update_authority: Pubkey) -> Self {
        let mut e = Encoder::new();
        e.put(&(Key::CollectionV1 as u8))
            .pubkey(&update_authority)
            .put("Test Collection")
            .put("https://example.com/collection.json")
            .put(&0u32)
            .put(&0u32);
        Self::from_base(e.into_bytes())
    }

    pub fn plugin(mut self, authority: PluginAuthority, plugin: Plugin) -> Self {
        self.plugins.push(PluginEntry::Known(authority, plugin));
        self
    }

    /// Registry record with an unrecognized type tag
    pub fn unknown_plugin(mut self, tag: u8, authority: PluginAuthority) -> Self {
        self.plugins.push(PluginEntry::Unknown(tag, authority));
        self
    }

    pub fn adapter(mut self, entry: AdapterEntry) -> Self {
        self.adapters.push(entry);
        self
    }

    /// External registry record with an unrecognized type tag
    pub fn unknown_adapter(mut self, tag: u8, authority: PluginAuthority) -> Self {
        self.unknown_adapters.push((tag, authority));
        self
    }

    /// End the registry after the first-party array, as older accounts do
    pub fn without_external_section(mut self) -> Self {
        self.external_section = false;
        self
    }

    /// Length of the base record alone
    pub fn base_len(&self) -> usize {
        self.base.len()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = self.base.clone();
        if self.plugins.is_empty() && self.adapters.is_empty() && self.unknown_adapters.is_empty() {
            return data;
        }

        let header_at = data.len();
        data.resize(header_at + PluginHeader::LEN, 0);

        let mut records = Encoder::new();
        records.put(&(self.plugins.len() as u32));
        for entry in &self.plugins {
            let offset = data.len() as u64;
            match entry {
                PluginEntry::Known(authority, plugin) => {
                    let mut payload = Encoder::new();
                    payload.plugin(plugin);
                    data.extend(payload.into_bytes());
                    records
                        .put(&(plugin.plugin_type() as u8))
                        .authority(authority)
                        .put(&offset);
                }
                PluginEntry::Unknown(tag, authority) => {
                    data.push(*tag);
                    records.put(tag).authority(authority).put(&offset);
                }
            }
        }

        if self.external_section {
            records.put(&((self.adapters.len() + self.unknown_adapters.len()) as u32));
            for entry in &self.adapters {
                let offset = data.len() as u64;
                let mut payload = Encoder::new();
                payload.adapter(&entry.adapter);
                data.extend(payload.into_bytes());

                let blob = entry.data.as_ref().map(|bytes| {
                    let at = data.len() as u64;
                    data.extend_from_slice(bytes);
                    (at, bytes.len() as u64)
                });

                records
                    .put(&(entry.adapter.adapter_type() as u8))
                    .authority(&entry.authority)
                    .option(entry.lifecycle_checks.as_ref(), |e, checks| {
                        e.vec(checks, |e, (event, flags)| {
                            e.put(&(*event as u8)).put(flags);
                        });
                    })
                    .put(&offset)
                    .option(blob.as_ref().map(|(at, _)| at), |e, v| {
                        e.put(v);
                    })
                    .option(blob.as_ref().map(|(_, len)| len), |e, v| {
                        e.put(v);
                    });
            }
            for (tag, authority) in &self.unknown_adapters {
                let offset = data.len() as u64;
                data.push(*tag);
                records
                    .put(tag)
                    .authority(authority)
                    .put(&0u8)
                    .put(&offset)
                    .put(&0u8)
                    .put(&0u8);
            }
        }

        let registry_offset = data.len() as u64;
        data.push(Key::PluginRegistryV1 as u8);
        data.extend(records.into_bytes());

        data[header_at] = Key::PluginHeaderV1 as u8;
        data[header_at + 1..header_at + PluginHeader::LEN]
            .copy_from_slice(&registry_offset.to_le_bytes());
        data
    }
}
