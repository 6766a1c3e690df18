//! Plugin header and registry record decoding
//!
//! Registry entries are decoded one at a time into a [`DecodedEntry`], which always
//! reports where the next entry starts. An unrecognized type tag yields
//! `Err(UnknownRegistryEntry)` and the cursor advances past a fixed tag width
//! (`DecoderConfig::unknown_tag_width`) before reading the rest of the entry, so
//! later entries stay parseable as long as the unknown tag really has that width.
//! Unknown entries are filtered from the final registry.

use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::ByteCursor;
use crate::config::DecoderConfig;
use crate::errors::{CoreError, Result};
use crate::types::{
    ExternalCheckResult, ExternalPluginAdapterType, HookableLifecycleEvent, Key,
    LifecycleChecks, PluginAuthority, PluginType,
};

/// Header written right after the base record when plugins are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginHeader {
    pub plugin_registry_offset: u64,
}

impl PluginHeader {
    /// Encoded size: key + u64 offset
    pub const LEN: usize = 1 + 8;

    pub fn decode(data: &[u8], offset: usize) -> Result<Self> {
        let mut cursor = ByteCursor::new(data, offset);
        Key::expect(&mut cursor, Key::PluginHeaderV1)?;
        Ok(Self {
            plugin_registry_offset: cursor.read_u64("plugin_registry_offset")?,
        })
    }
}

/// First-party registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub plugin_type: PluginType,
    pub authority: PluginAuthority,
    /// Offset of the plugin payload in the same buffer
    pub offset: u64,
}

/// External adapter registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRegistryRecord {
    pub plugin_type: ExternalPluginAdapterType,
    pub authority: PluginAuthority,
    pub lifecycle_checks: Option<LifecycleChecks>,
    /// Offset of the adapter payload in the same buffer
    pub offset: u64,
    pub data_offset: Option<u64>,
    pub data_len: Option<u64>,
}

/// Outcome of decoding one registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry<T> {
    /// The record, `UnknownRegistryEntry` for an unrecognized tag, or a structural error
    pub record: Result<T>,
    /// Where the next entry starts; the end of the buffer once alignment is lost
    pub next_offset: usize,
}

/// Both registries of an account, with unknown entries filtered out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRegistry {
    pub registry: Vec<RegistryRecord>,
    pub external_registry: Vec<ExternalRegistryRecord>,
}

/// Read a registry type tag, skipping the configured width when it is unknown
fn read_tag<T>(
    cursor: &mut ByteCursor<'_>,
    config: &DecoderConfig,
    parse: impl FnOnce(u8) -> Option<T>,
) -> Result<std::result::Result<T, CoreError>> {
    let start = cursor.offset();
    let tag = cursor.read_u8("registry_record.plugin_type")?;
    match parse(tag) {
        Some(value) => Ok(Ok(value)),
        None => {
            cursor.skip(config.unknown_tag_width.saturating_sub(1), "registry_record.plugin_type")?;
            Ok(Err(CoreError::UnknownRegistryEntry { tag, offset: start }))
        }
    }
}

/// Decode one first-party registry record at `offset`
pub fn decode_registry_record(
    data: &[u8],
    offset: usize,
    config: &DecoderConfig,
) -> DecodedEntry<RegistryRecord> {
    let mut cursor = ByteCursor::new(data, offset);
    let decoded = read_tag(&mut cursor, config, PluginType::from_u8).and_then(|plugin_type| {
        let authority = PluginAuthority::decode(&mut cursor)?;
        let payload_offset = cursor.read_u64("registry_record.offset")?;
        Ok(plugin_type.map(|plugin_type| RegistryRecord {
            plugin_type,
            authority,
            offset: payload_offset,
        }))
    });

    match decoded {
        Ok(record) => DecodedEntry {
            record,
            next_offset: cursor.offset(),
        },
        Err(e) => DecodedEntry {
            record: Err(e),
            next_offset: data.len(),
        },
    }
}

/// Decode one external adapter registry record at `offset`
pub fn decode_external_registry_record(
    data: &[u8],
    offset: usize,
    config: &DecoderConfig,
) -> DecodedEntry<ExternalRegistryRecord> {
    let mut cursor = ByteCursor::new(data, offset);
    let decoded = read_tag(&mut cursor, config, ExternalPluginAdapterType::from_u8).and_then(
        |plugin_type| {
            let authority = PluginAuthority::decode(&mut cursor)?;
            let lifecycle_checks = cursor.read_option("external_record.lifecycle_checks", |c| {
                let pairs = c.read_vec("external_record.lifecycle_checks", |c| {
                    let event = HookableLifecycleEvent::decode(c)?;
                    let flags = c.read_u32("external_record.check_result")?;
                    Ok((event, ExternalCheckResult { flags }))
                })?;
                Ok(pairs.into_iter().collect::<LifecycleChecks>())
            })?;
            let payload_offset = cursor.read_u64("external_record.offset")?;
            let data_offset =
                cursor.read_option("external_record.data_offset", |c| c.read_u64("data_offset"))?;
            let data_len =
                cursor.read_option("external_record.data_len", |c| c.read_u64("data_len"))?;

            Ok(plugin_type.map(|plugin_type| ExternalRegistryRecord {
                plugin_type,
                authority,
                lifecycle_checks,
                offset: payload_offset,
                data_offset,
                data_len,
            }))
        },
    );

    match decoded {
        Ok(record) => DecodedEntry {
            record,
            next_offset: cursor.offset(),
        },
        Err(e) => DecodedEntry {
            record: Err(e),
            next_offset: data.len(),
        },
    }
}

/// Decode the plugin registry at `offset`
///
/// Unknown entries in either array are dropped. A structural failure in the
/// first-party array aborts the decode; in the external array it drops that entry
/// and everything after it, since the entry boundaries can no longer be trusted.
pub fn decode_plugin_registry(
    data: &[u8],
    offset: usize,
    config: &DecoderConfig,
) -> Result<PluginRegistry> {
    let mut cursor = ByteCursor::new(data, offset);
    Key::expect(&mut cursor, Key::PluginRegistryV1)?;

    let count = cursor.read_u32("registry")?;
    let mut next = cursor.offset();
    let mut registry = Vec::new();
    for _ in 0..count {
        let entry = decode_registry_record(data, next, config);
        next = entry.next_offset;
        match entry.record {
            Ok(record) => registry.push(record),
            Err(CoreError::UnknownRegistryEntry { tag, offset }) => {
                debug!(tag, offset, "Skipping unknown plugin registry entry");
            }
            Err(e) => return Err(e),
        }
    }

    let mut external_registry = Vec::new();
    let mut cursor = ByteCursor::new(data, next);
    if cursor.remaining() == 0 {
        debug!(offset = next, "Registry has no external adapter section");
        return Ok(PluginRegistry {
            registry,
            external_registry,
        });
    }

    let external_count = cursor.read_u32("external_registry")?;
    next = cursor.offset();
    for index in 0..external_count {
        let entry = decode_external_registry_record(data, next, config);
        match entry.record {
            Ok(record) => external_registry.push(record),
            Err(CoreError::UnknownRegistryEntry { tag, offset }) => {
                debug!(tag, offset, "Skipping unknown external registry entry");
            }
            Err(e) => {
                warn!(
                    offset = next,
                    dropped = external_count - index,
                    error = %e,
                    "External registry entry unreadable, dropping remaining entries"
                );
                break;
            }
        }
        next = entry.next_offset;
    }

    Ok(PluginRegistry {
        registry,
        external_registry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(tag: u8, authority: &[u8], offset: u64) -> Vec<u8> {
        let mut bytes = vec![tag];
        bytes.extend_from_slice(authority);
        bytes.extend_from_slice(&offset.to_le_bytes());
        bytes
    }

    #[test]
    fn test_decode_known_record() {
        let data = record_bytes(1, &[1], 119);
        let entry = decode_registry_record(&data, 0, &DecoderConfig::default());
        assert_eq!(
            entry.record.unwrap(),
            RegistryRecord {
                plugin_type: PluginType::FreezeDelegate,
                authority: PluginAuthority::Owner,
                offset: 119,
            }
        );
        assert_eq!(entry.next_offset, data.len());
    }

    #[test]
    fn test_unknown_tag_advances_single_byte() {
        let mut data = record_bytes(250, &[2], 42);
        data.extend(record_bytes(0, &[0], 7));

        let config = DecoderConfig::default();
        let first = decode_registry_record(&data, 0, &config);
        assert_eq!(
            first.record.unwrap_err(),
            CoreError::UnknownRegistryEntry { tag: 250, offset: 0 }
        );
        assert_eq!(first.next_offset, 10);

        let second = decode_registry_record(&data, first.next_offset, &config);
        assert_eq!(second.record.unwrap().plugin_type, PluginType::Royalties);
    }

    #[test]
    fn test_wider_unknown_tag_keeps_next_record_aligned() {
        // Two-byte unknown tag: 250 followed by a second tag byte
        let mut unknown = vec![250u8, 3];
        unknown.extend_from_slice(&[2]);
        unknown.extend_from_slice(&42u64.to_le_bytes());
        let mut data = unknown.clone();
        data.extend(record_bytes(1, &[1], 7));

        let config = DecoderConfig {
            unknown_tag_width: 2,
            ..DecoderConfig::default()
        };
        let first = decode_registry_record(&data, 0, &config);
        assert_eq!(
            first.record.unwrap_err(),
            CoreError::UnknownRegistryEntry { tag: 250, offset: 0 }
        );
        assert_eq!(first.next_offset, unknown.len());

        let second = decode_registry_record(&data, first.next_offset, &config);
        assert_eq!(
            second.record.unwrap(),
            RegistryRecord {
                plugin_type: PluginType::FreezeDelegate,
                authority: PluginAuthority::Owner,
                offset: 7,
            }
        );

        let mut registry_data = vec![Key::PluginRegistryV1 as u8];
        registry_data.extend_from_slice(&2u32.to_le_bytes());
        registry_data.extend(&data);
        registry_data.extend_from_slice(&0u32.to_le_bytes());
        let registry = decode_plugin_registry(&registry_data, 0, &config).unwrap();
        assert_eq!(registry.registry.len(), 1);
        assert_eq!(registry.registry[0].offset, 7);
    }

    #[test]
    fn test_truncated_record_loses_alignment() {
        let data = vec![1u8, 1, 0, 0];
        let entry = decode_registry_record(&data, 0, &DecoderConfig::default());
        assert!(matches!(entry.record, Err(CoreError::Decode { .. })));
        assert_eq!(entry.next_offset, data.len());
    }

    #[test]
    fn test_registry_filters_unknown_entries() {
        let mut data = vec![Key::PluginRegistryV1 as u8];
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend(record_bytes(99, &[1], 5));
        data.extend(record_bytes(1, &[2], 6));
        data.extend_from_slice(&0u32.to_le_bytes());

        let registry = decode_plugin_registry(&data, 0, &DecoderConfig::default()).unwrap();
        assert_eq!(registry.registry.len(), 1);
        assert_eq!(registry.registry[0].plugin_type, PluginType::FreezeDelegate);
        assert!(registry.external_registry.is_empty());
    }

    #[test]
    fn test_external_record_with_checks_and_data() {
        let mut data = vec![1u8, 0, 1];
        data.extend_from_slice(&1u32.to_le_bytes());
        data.push(1); // Transfer
        data.extend_from_slice(&ExternalCheckResult::CAN_REJECT.to_le_bytes());
        data.extend_from_slice(&300u64.to_le_bytes());
        data.push(1);
        data.extend_from_slice(&400u64.to_le_bytes());
        data.push(1);
        data.extend_from_slice(&16u64.to_le_bytes());

        let entry = decode_external_registry_record(&data, 0, &DecoderConfig::default());
        let record = entry.record.unwrap();
        assert_eq!(record.plugin_type, ExternalPluginAdapterType::Oracle);
        assert_eq!(record.authority, PluginAuthority::None);
        let checks = record.lifecycle_checks.unwrap();
        assert!(checks[&HookableLifecycleEvent::Transfer].can_reject());
        assert_eq!(record.offset, 300);
        assert_eq!(record.data_offset, Some(400));
        assert_eq!(record.data_len, Some(16));
        assert_eq!(entry.next_offset, data.len());
    }

    #[test]
    fn test_malformed_external_entry_drops_rest() {
        let mut data = vec![Key::PluginRegistryV1 as u8];
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        // Oracle with an invalid authority tag
        data.extend_from_slice(&[1, 9]);
        data.extend_from_slice(&[0u8; 20]);

        let registry = decode_plugin_registry(&data, 0, &DecoderConfig::default()).unwrap();
        assert!(registry.external_registry.is_empty());
    }

    #[test]
    fn test_header_key_checked() {
        let mut data = vec![Key::PluginHeaderV1 as u8];
        data.extend_from_slice(&77u64.to_le_bytes());
        assert_eq!(PluginHeader::decode(&data, 0).unwrap().plugin_registry_offset, 77);

        data[0] = Key::PluginRegistryV1 as u8;
        assert!(matches!(
            PluginHeader::decode(&data, 0),
            Err(CoreError::UnexpectedKey { .. })
        ));
    }
}
