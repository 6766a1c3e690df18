//! First-party plugins and their payload decoders

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::codec::ByteCursor;
use crate::errors::{CoreError, Result};
use crate::types::PluginAuthority;

/// First-party plugin discriminator (registry record tag and payload tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum PluginType {
    Royalties = 0,
    FreezeDelegate = 1,
    BurnDelegate = 2,
    TransferDelegate = 3,
    UpdateDelegate = 4,
    PermanentFreezeDelegate = 5,
    Attributes = 6,
    PermanentTransferDelegate = 7,
    PermanentBurnDelegate = 8,
    Edition = 9,
    MasterEdition = 10,
    AddBlocker = 11,
    ImmutableMetadata = 12,
    VerifiedCreators = 13,
    Autograph = 14,
}

impl PluginType {
    pub const ALL: [PluginType; 15] = [
        Self::Royalties,
        Self::FreezeDelegate,
        Self::BurnDelegate,
        Self::TransferDelegate,
        Self::UpdateDelegate,
        Self::PermanentFreezeDelegate,
        Self::Attributes,
        Self::PermanentTransferDelegate,
        Self::PermanentBurnDelegate,
        Self::Edition,
        Self::MasterEdition,
        Self::AddBlocker,
        Self::ImmutableMetadata,
        Self::VerifiedCreators,
        Self::Autograph,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Canonical key name of the plugin slot
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::Royalties => "royalties",
            Self::FreezeDelegate => "freezeDelegate",
            Self::BurnDelegate => "burnDelegate",
            Self::TransferDelegate => "transferDelegate",
            Self::UpdateDelegate => "updateDelegate",
            Self::PermanentFreezeDelegate => "permanentFreezeDelegate",
            Self::Attributes => "attributes",
            Self::PermanentTransferDelegate => "permanentTransferDelegate",
            Self::PermanentBurnDelegate => "permanentBurnDelegate",
            Self::Edition => "edition",
            Self::MasterEdition => "masterEdition",
            Self::AddBlocker => "addBlocker",
            Self::ImmutableMetadata => "immutableMetadata",
            Self::VerifiedCreators => "verifiedCreators",
            Self::Autograph => "autograph",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub address: Pubkey,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleSet {
    None,
    ProgramAllowList(Vec<Pubkey>),
    ProgramDenyList(Vec<Pubkey>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Royalties {
    pub basis_points: u16,
    pub creators: Vec<Creator>,
    pub rule_set: RuleSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezeDelegate {
    pub frozen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BurnDelegate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferDelegate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDelegate {
    pub additional_delegates: Vec<Pubkey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermanentFreezeDelegate {
    pub frozen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub attribute_list: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermanentTransferDelegate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermanentBurnDelegate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edition {
    pub number: u32,
}

/// Collection-only plugin; never carried onto a derived asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterEdition {
    pub max_supply: Option<u32>,
    pub name: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddBlocker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImmutableMetadata;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCreatorsSignature {
    pub address: Pubkey,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCreators {
    pub signatures: Vec<VerifiedCreatorsSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutographSignature {
    pub address: Pubkey,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Autograph {
    pub signatures: Vec<AutographSignature>,
}

/// Decoded plugin payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Plugin {
    Royalties(Royalties),
    FreezeDelegate(FreezeDelegate),
    BurnDelegate(BurnDelegate),
    TransferDelegate(TransferDelegate),
    UpdateDelegate(UpdateDelegate),
    PermanentFreezeDelegate(PermanentFreezeDelegate),
    Attributes(Attributes),
    PermanentTransferDelegate(PermanentTransferDelegate),
    PermanentBurnDelegate(PermanentBurnDelegate),
    Edition(Edition),
    MasterEdition(MasterEdition),
    AddBlocker(AddBlocker),
    ImmutableMetadata(ImmutableMetadata),
    VerifiedCreators(VerifiedCreators),
    Autograph(Autograph),
}

impl Plugin {
    pub fn plugin_type(&self) -> PluginType {
        match self {
            Self::Royalties(_) => PluginType::Royalties,
            Self::FreezeDelegate(_) => PluginType::FreezeDelegate,
            Self::BurnDelegate(_) => PluginType::BurnDelegate,
            Self::TransferDelegate(_) => PluginType::TransferDelegate,
            Self::UpdateDelegate(_) => PluginType::UpdateDelegate,
            Self::PermanentFreezeDelegate(_) => PluginType::PermanentFreezeDelegate,
            Self::Attributes(_) => PluginType::Attributes,
            Self::PermanentTransferDelegate(_) => PluginType::PermanentTransferDelegate,
            Self::PermanentBurnDelegate(_) => PluginType::PermanentBurnDelegate,
            Self::Edition(_) => PluginType::Edition,
            Self::MasterEdition(_) => PluginType::MasterEdition,
            Self::AddBlocker(_) => PluginType::AddBlocker,
            Self::ImmutableMetadata(_) => PluginType::ImmutableMetadata,
            Self::VerifiedCreators(_) => PluginType::VerifiedCreators,
            Self::Autograph(_) => PluginType::Autograph,
        }
    }

    /// Decode a plugin payload (tag + fields) at the cursor
    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        let tag = cursor.read_u8("plugin")?;
        let plugin_type = PluginType::from_u8(tag).ok_or_else(|| {
            CoreError::decode("plugin", start, format!("unknown plugin tag {}", tag))
        })?;
        let key = plugin_type.key_name();

        let plugin = match plugin_type {
            PluginType::Royalties => Self::Royalties(Royalties {
                basis_points: cursor.read::<u16>(key)?,
                creators: cursor.read_vec(key, |c| {
                    Ok(Creator {
                        address: c.read_pubkey(key)?,
                        percentage: c.read_u8(key)?,
                    })
                })?,
                rule_set: decode_rule_set(cursor)?,
            }),
            PluginType::FreezeDelegate => Self::FreezeDelegate(FreezeDelegate {
                frozen: cursor.read_bool(key)?,
            }),
            PluginType::BurnDelegate => Self::BurnDelegate(BurnDelegate),
            PluginType::TransferDelegate => Self::TransferDelegate(TransferDelegate),
            PluginType::UpdateDelegate => Self::UpdateDelegate(UpdateDelegate {
                additional_delegates: cursor.read_vec(key, |c| c.read_pubkey(key))?,
            }),
            PluginType::PermanentFreezeDelegate => {
                Self::PermanentFreezeDelegate(PermanentFreezeDelegate {
                    frozen: cursor.read_bool(key)?,
                })
            }
            PluginType::Attributes => Self::Attributes(Attributes {
                attribute_list: cursor.read_vec(key, |c| {
                    Ok(Attribute {
                        key: c.read_string(key)?,
                        value: c.read_string(key)?,
                    })
                })?,
            }),
            PluginType::PermanentTransferDelegate => {
                Self::PermanentTransferDelegate(PermanentTransferDelegate)
            }
            PluginType::PermanentBurnDelegate => Self::PermanentBurnDelegate(PermanentBurnDelegate),
            PluginType::Edition => Self::Edition(Edition {
                number: cursor.read_u32(key)?,
            }),
            PluginType::MasterEdition => Self::MasterEdition(MasterEdition {
                max_supply: cursor.read_option(key, |c| c.read_u32(key))?,
                name: cursor.read_option(key, |c| c.read_string(key))?,
                uri: cursor.read_option(key, |c| c.read_string(key))?,
            }),
            PluginType::AddBlocker => Self::AddBlocker(AddBlocker),
            PluginType::ImmutableMetadata => Self::ImmutableMetadata(ImmutableMetadata),
            PluginType::VerifiedCreators => Self::VerifiedCreators(VerifiedCreators {
                signatures: cursor.read_vec(key, |c| {
                    Ok(VerifiedCreatorsSignature {
                        address: c.read_pubkey(key)?,
                        verified: c.read_bool(key)?,
                    })
                })?,
            }),
            PluginType::Autograph => Self::Autograph(Autograph {
                signatures: cursor.read_vec(key, |c| {
                    Ok(AutographSignature {
                        address: c.read_pubkey(key)?,
                        message: c.read_string(key)?,
                    })
                })?,
            }),
        };
        Ok(plugin)
    }
}

fn decode_rule_set(cursor: &mut ByteCursor<'_>) -> Result<RuleSet> {
    let start = cursor.offset();
    match cursor.read_u8("royalties.rule_set")? {
        0 => Ok(RuleSet::None),
        1 => Ok(RuleSet::ProgramAllowList(
            cursor.read_vec("royalties.rule_set", |c| c.read_pubkey("royalties.rule_set"))?,
        )),
        2 => Ok(RuleSet::ProgramDenyList(
            cursor.read_vec("royalties.rule_set", |c| c.read_pubkey("royalties.rule_set"))?,
        )),
        other => Err(CoreError::decode(
            "royalties.rule_set",
            start,
            format!("unknown rule set tag {}", other),
        )),
    }
}

/// A plugin together with the registry data that located it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedPlugin<T> {
    pub authority: PluginAuthority,
    pub offset: u64,
    pub plugin: T,
}

impl<T> AttachedPlugin<T> {
    pub fn new(authority: PluginAuthority, offset: u64, plugin: T) -> Self {
        Self {
            authority,
            offset,
            plugin,
        }
    }
}

/// Single-valued plugin slots of an asset or collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginsList {
    pub royalties: Option<AttachedPlugin<Royalties>>,
    pub freeze_delegate: Option<AttachedPlugin<FreezeDelegate>>,
    pub burn_delegate: Option<AttachedPlugin<BurnDelegate>>,
    pub transfer_delegate: Option<AttachedPlugin<TransferDelegate>>,
    pub update_delegate: Option<AttachedPlugin<UpdateDelegate>>,
    pub permanent_freeze_delegate: Option<AttachedPlugin<PermanentFreezeDelegate>>,
    pub attributes: Option<AttachedPlugin<Attributes>>,
    pub permanent_transfer_delegate: Option<AttachedPlugin<PermanentTransferDelegate>>,
    pub permanent_burn_delegate: Option<AttachedPlugin<PermanentBurnDelegate>>,
    pub edition: Option<AttachedPlugin<Edition>>,
    pub master_edition: Option<AttachedPlugin<MasterEdition>>,
    pub add_blocker: Option<AttachedPlugin<AddBlocker>>,
    pub immutable_metadata: Option<AttachedPlugin<ImmutableMetadata>>,
    pub verified_creators: Option<AttachedPlugin<VerifiedCreators>>,
    pub autograph: Option<AttachedPlugin<Autograph>>,
}

impl PluginsList {
    /// Store a plugin in its slot
    ///
    /// Returns the payload offset of the plugin previously held by the slot, if any.
    pub fn insert(&mut self, authority: PluginAuthority, offset: u64, plugin: Plugin) -> Option<u64> {
        fn put<T>(slot: &mut Option<AttachedPlugin<T>>, value: AttachedPlugin<T>) -> Option<u64> {
            slot.replace(value).map(|previous| previous.offset)
        }

        match plugin {
            Plugin::Royalties(p) => put(&mut self.royalties, AttachedPlugin::new(authority, offset, p)),
            Plugin::FreezeDelegate(p) => {
                put(&mut self.freeze_delegate, AttachedPlugin::new(authority, offset, p))
            }
            Plugin::BurnDelegate(p) => {
                put(&mut self.burn_delegate, AttachedPlugin::new(authority, offset, p))
            }
            Plugin::TransferDelegate(p) => {
                put(&mut self.transfer_delegate, AttachedPlugin::new(authority, offset, p))
            }
            Plugin::UpdateDelegate(p) => {
                put(&mut self.update_delegate, AttachedPlugin::new(authority, offset, p))
            }
            Plugin::PermanentFreezeDelegate(p) => put(
                &mut self.permanent_freeze_delegate,
                AttachedPlugin::new(authority, offset, p),
            ),
            Plugin::Attributes(p) => put(&mut self.attributes, AttachedPlugin::new(authority, offset, p)),
            Plugin::PermanentTransferDelegate(p) => put(
                &mut self.permanent_transfer_delegate,
                AttachedPlugin::new(authority, offset, p),
            ),
            Plugin::PermanentBurnDelegate(p) => put(
                &mut self.permanent_burn_delegate,
                AttachedPlugin::new(authority, offset, p),
            ),
            Plugin::Edition(p) => put(&mut self.edition, AttachedPlugin::new(authority, offset, p)),
            Plugin::MasterEdition(p) => {
                put(&mut self.master_edition, AttachedPlugin::new(authority, offset, p))
            }
            Plugin::AddBlocker(p) => put(&mut self.add_blocker, AttachedPlugin::new(authority, offset, p)),
            Plugin::ImmutableMetadata(p) => {
                put(&mut self.immutable_metadata, AttachedPlugin::new(authority, offset, p))
            }
            Plugin::VerifiedCreators(p) => {
                put(&mut self.verified_creators, AttachedPlugin::new(authority, offset, p))
            }
            Plugin::Autograph(p) => put(&mut self.autograph, AttachedPlugin::new(authority, offset, p)),
        }
    }

    /// Authority and offset of the plugin in the given slot
    pub fn slot(&self, plugin_type: PluginType) -> Option<(PluginAuthority, u64)> {
        fn meta<T>(slot: &Option<AttachedPlugin<T>>) -> Option<(PluginAuthority, u64)> {
            slot.as_ref().map(|p| (p.authority, p.offset))
        }

        match plugin_type {
            PluginType::Royalties => meta(&self.royalties),
            PluginType::FreezeDelegate => meta(&self.freeze_delegate),
            PluginType::BurnDelegate => meta(&self.burn_delegate),
            PluginType::TransferDelegate => meta(&self.transfer_delegate),
            PluginType::UpdateDelegate => meta(&self.update_delegate),
            PluginType::PermanentFreezeDelegate => meta(&self.permanent_freeze_delegate),
            PluginType::Attributes => meta(&self.attributes),
            PluginType::PermanentTransferDelegate => meta(&self.permanent_transfer_delegate),
            PluginType::PermanentBurnDelegate => meta(&self.permanent_burn_delegate),
            PluginType::Edition => meta(&self.edition),
            PluginType::MasterEdition => meta(&self.master_edition),
            PluginType::AddBlocker => meta(&self.add_blocker),
            PluginType::ImmutableMetadata => meta(&self.immutable_metadata),
            PluginType::VerifiedCreators => meta(&self.verified_creators),
            PluginType::Autograph => meta(&self.autograph),
        }
    }

    /// Authority of the plugin in the given slot
    pub fn authority_of(&self, plugin_type: PluginType) -> Option<PluginAuthority> {
        self.slot(plugin_type).map(|(authority, _)| authority)
    }

    /// Plugin types with a populated slot, in discriminant order
    pub fn plugin_types(&self) -> Vec<PluginType> {
        PluginType::ALL
            .iter()
            .copied()
            .filter(|t| self.slot(*t).is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.plugin_types().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
