//! Account discriminators and authority types

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::codec::ByteCursor;
use crate::errors::{CoreError, Result};

/// Leading discriminator of every account and registry structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum Key {
    Uninitialized = 0,
    AssetV1 = 1,
    HashedAssetV1 = 2,
    PluginHeaderV1 = 3,
    PluginRegistryV1 = 4,
    CollectionV1 = 5,
}

impl Key {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::AssetV1),
            2 => Some(Self::HashedAssetV1),
            3 => Some(Self::PluginHeaderV1),
            4 => Some(Self::PluginRegistryV1),
            5 => Some(Self::CollectionV1),
            _ => None,
        }
    }

    /// Read a discriminator and require it to be `expected`
    pub(crate) fn expect(cursor: &mut ByteCursor<'_>, expected: Key) -> Result<()> {
        let found = cursor.read_u8("key")?;
        if found != expected as u8 {
            return Err(CoreError::UnexpectedKey { expected, found });
        }
        Ok(())
    }
}

/// Who may mutate a plugin or adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PluginAuthority {
    /// Immutable: nobody matches
    None,
    /// The asset owner
    Owner,
    /// The asset's (or its collection's) update authority
    UpdateAuthority,
    /// A literal address
    Address { address: Pubkey },
}

impl PluginAuthority {
    /// Discriminant name used in adapter identities
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Owner => "Owner",
            Self::UpdateAuthority => "UpdateAuthority",
            Self::Address { .. } => "Address",
        }
    }

    /// Address carried by the `Address` variant
    pub fn address(&self) -> Option<Pubkey> {
        match self {
            Self::Address { address } => Some(*address),
            _ => None,
        }
    }

    /// Identity fragment: type name, plus `-<address>` when one is present
    pub fn identity(&self) -> String {
        match self.address() {
            Some(address) => format!("{}-{}", self.type_name(), address),
            None => self.type_name().to_string(),
        }
    }

    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        match cursor.read_u8("authority")? {
            0 => Ok(Self::None),
            1 => Ok(Self::Owner),
            2 => Ok(Self::UpdateAuthority),
            3 => Ok(Self::Address {
                address: cursor.read_pubkey("authority.address")?,
            }),
            other => Err(CoreError::decode(
                "authority",
                start,
                format!("unknown authority tag {}", other),
            )),
        }
    }
}

/// Update authority stored on an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateAuthority {
    None,
    Address(Pubkey),
    /// The asset belongs to this collection; the collection's update authority applies
    Collection(Pubkey),
}

impl UpdateAuthority {
    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.offset();
        match cursor.read_u8("update_authority")? {
            0 => Ok(Self::None),
            1 => Ok(Self::Address(cursor.read_pubkey("update_authority.address")?)),
            2 => Ok(Self::Collection(cursor.read_pubkey("update_authority.address")?)),
            other => Err(CoreError::decode(
                "update_authority",
                start,
                format!("unknown update authority tag {}", other),
            )),
        }
    }
}
