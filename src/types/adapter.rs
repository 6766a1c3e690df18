//! External plugin adapters, lifecycle checks and extra-account specs

use std::collections::BTreeMap;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::codec::ByteCursor;
use crate::errors::{CoreError, Result};
use crate::types::PluginAuthority;

/// External adapter discriminator (registry record tag and payload tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum ExternalPluginAdapterType {
    LifecycleHook = 0,
    Oracle = 1,
    AppData = 2,
    LinkedLifecycleHook = 3,
    LinkedAppData = 4,
    DataSection = 5,
}

impl ExternalPluginAdapterType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::LifecycleHook),
            1 => Some(Self::Oracle),
            2 => Some(Self::AppData),
            3 => Some(Self::LinkedLifecycleHook),
            4 => Some(Self::LinkedAppData),
            5 => Some(Self::DataSection),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::LifecycleHook => "LifecycleHook",
            Self::Oracle => "Oracle",
            Self::AppData => "AppData",
            Self::LinkedLifecycleHook => "LinkedLifecycleHook",
            Self::LinkedAppData => "LinkedAppData",
            Self::DataSection => "DataSection",
        }
    }
}

/// Encoding of an adapter's attached data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExternalPluginAdapterSchema {
    Binary,
    Json,
    MsgPack,
}

impl ExternalPluginAdapterSchema {
    fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        match cursor.read_u8("schema")? {
            0 => Ok(Self::Binary),
            1 => Ok(Self::Json),
            2 => Ok(Self::MsgPack),
            other => Err(CoreError::decode("schema", start, format!("unknown schema tag {}", other))),
        }
    }
}

/// Lifecycle events adapters can opt into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HookableLifecycleEvent {
    Create,
    Transfer,
    Burn,
    Update,
}

impl HookableLifecycleEvent {
    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        match cursor.read_u8("lifecycle_event")? {
            0 => Ok(Self::Create),
            1 => Ok(Self::Transfer),
            2 => Ok(Self::Burn),
            3 => Ok(Self::Update),
            other => Err(CoreError::decode(
                "lifecycle_event",
                start,
                format!("unknown lifecycle event {}", other),
            )),
        }
    }
}

impl std::str::FromStr for HookableLifecycleEvent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "transfer" => Ok(Self::Transfer),
            "burn" => Ok(Self::Burn),
            "update" => Ok(Self::Update),
            other => Err(format!("unknown lifecycle event '{}'", other)),
        }
    }
}

/// Bit flags describing how an adapter participates in a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCheckResult {
    pub flags: u32,
}

impl ExternalCheckResult {
    pub const CAN_LISTEN: u32 = 1;
    pub const CAN_APPROVE: u32 = 1 << 1;
    pub const CAN_REJECT: u32 = 1 << 2;

    pub fn can_listen(&self) -> bool {
        self.flags & Self::CAN_LISTEN != 0
    }

    pub fn can_approve(&self) -> bool {
        self.flags & Self::CAN_APPROVE != 0
    }

    pub fn can_reject(&self) -> bool {
        self.flags & Self::CAN_REJECT != 0
    }
}

pub type LifecycleChecks = BTreeMap<HookableLifecycleEvent, ExternalCheckResult>;

/// Where an oracle account stores its validation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationResultsOffset {
    NoOffset,
    Anchor,
    Custom(u64),
}

/// One entry of a custom PDA seed list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Seed {
    Collection,
    Owner,
    Recipient,
    Asset,
    Address(Pubkey),
    Bytes(Vec<u8>),
}

impl Seed {
    fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        match cursor.read_u8("seed")? {
            0 => Ok(Self::Collection),
            1 => Ok(Self::Owner),
            2 => Ok(Self::Recipient),
            3 => Ok(Self::Asset),
            4 => Ok(Self::Address(cursor.read_pubkey("seed.address")?)),
            5 => Ok(Self::Bytes(cursor.read::<Vec<u8>>("seed.bytes")?)),
            other => Err(CoreError::decode("seed", start, format!("unknown seed tag {}", other))),
        }
    }
}

/// Declarative description of an auxiliary account an adapter needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ExtraAccount {
    PreconfiguredProgram {
        is_signer: bool,
        is_writable: bool,
    },
    PreconfiguredCollection {
        is_signer: bool,
        is_writable: bool,
    },
    PreconfiguredOwner {
        is_signer: bool,
        is_writable: bool,
    },
    PreconfiguredRecipient {
        is_signer: bool,
        is_writable: bool,
    },
    PreconfiguredAsset {
        is_signer: bool,
        is_writable: bool,
    },
    CustomPda {
        seeds: Vec<Seed>,
        custom_program_id: Option<Pubkey>,
        is_signer: bool,
        is_writable: bool,
    },
    Address {
        address: Pubkey,
        is_signer: bool,
        is_writable: bool,
    },
}

impl ExtraAccount {
    /// `(is_signer, is_writable)`
    pub fn flags(&self) -> (bool, bool) {
        match self {
            Self::PreconfiguredProgram { is_signer, is_writable }
            | Self::PreconfiguredCollection { is_signer, is_writable }
            | Self::PreconfiguredOwner { is_signer, is_writable }
            | Self::PreconfiguredRecipient { is_signer, is_writable }
            | Self::PreconfiguredAsset { is_signer, is_writable }
            | Self::CustomPda { is_signer, is_writable, .. }
            | Self::Address { is_signer, is_writable, .. } => (*is_signer, *is_writable),
        }
    }

    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        let tag = cursor.read_u8("extra_account")?;
        let account = match tag {
            0..=4 => {
                let is_signer = cursor.read_bool("extra_account.is_signer")?;
                let is_writable = cursor.read_bool("extra_account.is_writable")?;
                match tag {
                    0 => Self::PreconfiguredProgram { is_signer, is_writable },
                    1 => Self::PreconfiguredCollection { is_signer, is_writable },
                    2 => Self::PreconfiguredOwner { is_signer, is_writable },
                    3 => Self::PreconfiguredRecipient { is_signer, is_writable },
                    _ => Self::PreconfiguredAsset { is_signer, is_writable },
                }
            }
            5 => Self::CustomPda {
                seeds: cursor.read_vec("extra_account.seeds", Seed::decode)?,
                custom_program_id: cursor
                    .read_option("extra_account.custom_program_id", |c| {
                        c.read_pubkey("extra_account.custom_program_id")
                    })?,
                is_signer: cursor.read_bool("extra_account.is_signer")?,
                is_writable: cursor.read_bool("extra_account.is_writable")?,
            },
            6 => Self::Address {
                address: cursor.read_pubkey("extra_account.address")?,
                is_signer: cursor.read_bool("extra_account.is_signer")?,
                is_writable: cursor.read_bool("extra_account.is_writable")?,
            },
            other => {
                return Err(CoreError::decode(
                    "extra_account",
                    start,
                    format!("unknown extra account tag {}", other),
                ))
            }
        };
        Ok(account)
    }
}

/// Parent of a data section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkedDataKey {
    LinkedLifecycleHook(Pubkey),
    LinkedAppData(PluginAuthority),
}

impl LinkedDataKey {
    pub fn identity(&self) -> String {
        match self {
            Self::LinkedLifecycleHook(hooked_program) => {
                format!("LinkedLifecycleHook-{}", hooked_program)
            }
            Self::LinkedAppData(authority) => format!("LinkedAppData-{}", authority.identity()),
        }
    }

    fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        match cursor.read_u8("parent_key")? {
            0 => Ok(Self::LinkedLifecycleHook(cursor.read_pubkey("parent_key.hooked_program")?)),
            1 => Ok(Self::LinkedAppData(PluginAuthority::decode(cursor)?)),
            other => Err(CoreError::decode(
                "parent_key",
                start,
                format!("unknown linked data key tag {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleHook {
    pub hooked_program: Pubkey,
    pub extra_accounts: Option<Vec<ExtraAccount>>,
    pub data_authority: Option<PluginAuthority>,
    pub schema: ExternalPluginAdapterSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Oracle {
    pub base_address: Pubkey,
    pub base_address_config: Option<ExtraAccount>,
    pub results_offset: ValidationResultsOffset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub data_authority: PluginAuthority,
    pub schema: ExternalPluginAdapterSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedLifecycleHook {
    pub hooked_program: Pubkey,
    pub extra_accounts: Option<Vec<ExtraAccount>>,
    pub data_authority: Option<PluginAuthority>,
    pub schema: ExternalPluginAdapterSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAppData {
    pub data_authority: PluginAuthority,
    pub schema: ExternalPluginAdapterSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSection {
    pub parent_key: LinkedDataKey,
    pub schema: ExternalPluginAdapterSchema,
}

/// Decoded adapter payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExternalPluginAdapter {
    LifecycleHook(LifecycleHook),
    Oracle(Oracle),
    AppData(AppData),
    LinkedLifecycleHook(LinkedLifecycleHook),
    LinkedAppData(LinkedAppData),
    DataSection(DataSection),
}

impl ExternalPluginAdapter {
    pub fn adapter_type(&self) -> ExternalPluginAdapterType {
        match self {
            Self::LifecycleHook(_) => ExternalPluginAdapterType::LifecycleHook,
            Self::Oracle(_) => ExternalPluginAdapterType::Oracle,
            Self::AppData(_) => ExternalPluginAdapterType::AppData,
            Self::LinkedLifecycleHook(_) => ExternalPluginAdapterType::LinkedLifecycleHook,
            Self::LinkedAppData(_) => ExternalPluginAdapterType::LinkedAppData,
            Self::DataSection(_) => ExternalPluginAdapterType::DataSection,
        }
    }

    /// Schema of the attached data; oracles carry no data schema
    pub fn schema(&self) -> Option<ExternalPluginAdapterSchema> {
        match self {
            Self::LifecycleHook(a) => Some(a.schema),
            Self::Oracle(_) => None,
            Self::AppData(a) => Some(a.schema),
            Self::LinkedLifecycleHook(a) => Some(a.schema),
            Self::LinkedAppData(a) => Some(a.schema),
            Self::DataSection(a) => Some(a.schema),
        }
    }

    /// Decode an adapter payload (tag + fields) at the cursor
    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        let tag = cursor.read_u8("external_plugin_adapter")?;
        let adapter_type = ExternalPluginAdapterType::from_u8(tag).ok_or_else(|| {
            CoreError::decode(
                "external_plugin_adapter",
                start,
                format!("unknown adapter tag {}", tag),
            )
        })?;
        let key = adapter_type.type_name();

        let adapter = match adapter_type {
            ExternalPluginAdapterType::LifecycleHook => {
                let (hooked_program, extra_accounts, data_authority, schema) = decode_hook(cursor, key)?;
                Self::LifecycleHook(LifecycleHook {
                    hooked_program,
                    extra_accounts,
                    data_authority,
                    schema,
                })
            }
            ExternalPluginAdapterType::LinkedLifecycleHook => {
                let (hooked_program, extra_accounts, data_authority, schema) = decode_hook(cursor, key)?;
                Self::LinkedLifecycleHook(LinkedLifecycleHook {
                    hooked_program,
                    extra_accounts,
                    data_authority,
                    schema,
                })
            }
            ExternalPluginAdapterType::Oracle => Self::Oracle(Oracle {
                base_address: cursor.read_pubkey(key)?,
                base_address_config: cursor.read_option(key, ExtraAccount::decode)?,
                results_offset: {
                    let at = cursor.offset();
                    match cursor.read_u8(key)? {
                        0 => ValidationResultsOffset::NoOffset,
                        1 => ValidationResultsOffset::Anchor,
                        2 => ValidationResultsOffset::Custom(cursor.read_u64(key)?),
                        other => {
                            return Err(CoreError::decode(
                                "Oracle.results_offset",
                                at,
                                format!("unknown results offset tag {}", other),
                            ))
                        }
                    }
                },
            }),
            ExternalPluginAdapterType::AppData => Self::AppData(AppData {
                data_authority: PluginAuthority::decode(cursor)?,
                schema: ExternalPluginAdapterSchema::decode(cursor)?,
            }),
            ExternalPluginAdapterType::LinkedAppData => Self::LinkedAppData(LinkedAppData {
                data_authority: PluginAuthority::decode(cursor)?,
                schema: ExternalPluginAdapterSchema::decode(cursor)?,
            }),
            ExternalPluginAdapterType::DataSection => Self::DataSection(DataSection {
                parent_key: LinkedDataKey::decode(cursor)?,
                schema: ExternalPluginAdapterSchema::decode(cursor)?,
            }),
        };
        Ok(adapter)
    }
}

type HookFields = (
    Pubkey,
    Option<Vec<ExtraAccount>>,
    Option<PluginAuthority>,
    ExternalPluginAdapterSchema,
);

fn decode_hook(cursor: &mut ByteCursor<'_>, key: &str) -> Result<HookFields> {
    Ok((
        cursor.read_pubkey(key)?,
        cursor.read_option(key, |c| c.read_vec(key, ExtraAccount::decode))?,
        cursor.read_option(key, PluginAuthority::decode)?,
        ExternalPluginAdapterSchema::decode(cursor)?,
    ))
}

/// Data attached to an adapter, decoded by its schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdapterData {
    /// Raw bytes (Binary schema, or a degraded MsgPack/JSON decode)
    Binary(Vec<u8>),
    Json(serde_json::Value),
}

/// An adapter together with the registry data that located it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedAdapter<T> {
    pub authority: PluginAuthority,
    pub offset: u64,
    pub lifecycle_checks: Option<LifecycleChecks>,
    pub data_offset: Option<u64>,
    pub data_len: Option<u64>,
    pub data: Option<AdapterData>,
    pub adapter: T,
}

impl<T> AttachedAdapter<T> {
    /// Check result registered for `event`, if the adapter opted into it
    pub fn check_for(&self, event: HookableLifecycleEvent) -> Option<ExternalCheckResult> {
        self.lifecycle_checks
            .as_ref()
            .and_then(|checks| checks.get(&event).copied())
    }
}

/// Per-type behaviour of adapter variants used by derivation
pub trait AdapterKind: Clone {
    const TYPE: ExternalPluginAdapterType;

    /// De-duplication identity, prefixed with the adapter type name
    fn identity(&self) -> String;
}

impl AdapterKind for LifecycleHook {
    const TYPE: ExternalPluginAdapterType = ExternalPluginAdapterType::LifecycleHook;

    fn identity(&self) -> String {
        format!("{}-{}", Self::TYPE.type_name(), self.hooked_program)
    }
}

impl AdapterKind for Oracle {
    const TYPE: ExternalPluginAdapterType = ExternalPluginAdapterType::Oracle;

    fn identity(&self) -> String {
        format!("{}-{}", Self::TYPE.type_name(), self.base_address)
    }
}

impl AdapterKind for AppData {
    const TYPE: ExternalPluginAdapterType = ExternalPluginAdapterType::AppData;

    fn identity(&self) -> String {
        format!("{}-{}", Self::TYPE.type_name(), self.data_authority.identity())
    }
}

impl AdapterKind for LinkedLifecycleHook {
    const TYPE: ExternalPluginAdapterType = ExternalPluginAdapterType::LinkedLifecycleHook;

    fn identity(&self) -> String {
        format!("{}-{}", Self::TYPE.type_name(), self.hooked_program)
    }
}

impl AdapterKind for LinkedAppData {
    const TYPE: ExternalPluginAdapterType = ExternalPluginAdapterType::LinkedAppData;

    fn identity(&self) -> String {
        format!("{}-{}", Self::TYPE.type_name(), self.data_authority.identity())
    }
}

impl AdapterKind for DataSection {
    const TYPE: ExternalPluginAdapterType = ExternalPluginAdapterType::DataSection;

    fn identity(&self) -> String {
        format!("{}-{}", Self::TYPE.type_name(), self.parent_key.identity())
    }
}

/// Array-valued adapter slots of an asset or collection, in registry order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPluginAdaptersList {
    pub lifecycle_hooks: Vec<AttachedAdapter<LifecycleHook>>,
    pub oracles: Vec<AttachedAdapter<Oracle>>,
    pub app_datas: Vec<AttachedAdapter<AppData>>,
    pub linked_lifecycle_hooks: Vec<AttachedAdapter<LinkedLifecycleHook>>,
    pub linked_app_datas: Vec<AttachedAdapter<LinkedAppData>>,
    pub data_sections: Vec<AttachedAdapter<DataSection>>,
}

impl ExternalPluginAdaptersList {
    /// Append an adapter to the array for its type
    pub fn push(&mut self, base: AttachedAdapter<()>, adapter: ExternalPluginAdapter) {
        fn attach<T>(base: AttachedAdapter<()>, adapter: T) -> AttachedAdapter<T> {
            AttachedAdapter {
                authority: base.authority,
                offset: base.offset,
                lifecycle_checks: base.lifecycle_checks,
                data_offset: base.data_offset,
                data_len: base.data_len,
                data: base.data,
                adapter,
            }
        }

        match adapter {
            ExternalPluginAdapter::LifecycleHook(a) => self.lifecycle_hooks.push(attach(base, a)),
            ExternalPluginAdapter::Oracle(a) => self.oracles.push(attach(base, a)),
            ExternalPluginAdapter::AppData(a) => self.app_datas.push(attach(base, a)),
            ExternalPluginAdapter::LinkedLifecycleHook(a) => {
                self.linked_lifecycle_hooks.push(attach(base, a))
            }
            ExternalPluginAdapter::LinkedAppData(a) => self.linked_app_datas.push(attach(base, a)),
            ExternalPluginAdapter::DataSection(a) => self.data_sections.push(attach(base, a)),
        }
    }

    /// Total number of adapters across all types
    pub fn len(&self) -> usize {
        self.lifecycle_hooks.len()
            + self.oracles.len()
            + self.app_datas.len()
            + self.linked_lifecycle_hooks.len()
            + self.linked_app_datas.len()
            + self.data_sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
