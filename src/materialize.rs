//! Plugin and adapter materialization
//!
//! Turns filtered registry records plus the shared account buffer into typed
//! plugin slots and adapter arrays by decoding each payload at its recorded offset.

use tracing::warn;

use crate::codec::{to_index, ByteCursor};
use crate::config::{DecoderConfig, DuplicatePluginPolicy};
use crate::errors::{CoreError, Result};
use crate::registry::{ExternalRegistryRecord, RegistryRecord};
use crate::types::{
    AdapterData, AttachedAdapter, ExternalPluginAdapter, ExternalPluginAdapterSchema,
    ExternalPluginAdaptersList, Plugin, PluginsList,
};

/// Re-label a payload decode failure with the plugin key and payload offset
fn payload_error(key: &str, offset: u64, err: CoreError) -> CoreError {
    match err {
        CoreError::Decode {
            what,
            offset: at,
            reason,
        } => CoreError::Decode {
            what: key.to_string(),
            offset: offset as usize,
            reason: format!("{} at {}: {}", what, at, reason),
        },
        other => other,
    }
}

/// Decode every first-party plugin payload into its slot
pub fn materialize_plugins(
    records: &[RegistryRecord],
    data: &[u8],
    config: &DecoderConfig,
) -> Result<PluginsList> {
    let mut plugins = PluginsList::default();

    for record in records {
        let key = record.plugin_type.key_name();
        let index = to_index(record.offset, data, key)?;
        let plugin = Plugin::decode(&mut ByteCursor::new(data, index))
            .map_err(|e| payload_error(key, record.offset, e))?;

        if plugin.plugin_type() != record.plugin_type {
            return Err(CoreError::decode(
                key,
                index,
                format!(
                    "payload holds {} but registry record is {}",
                    plugin.plugin_type().key_name(),
                    key
                ),
            ));
        }

        if let Some(previous) = plugins.insert(record.authority, record.offset, plugin) {
            match config.duplicate_plugins {
                DuplicatePluginPolicy::LastWins => warn!(
                    plugin = key,
                    first = previous,
                    second = record.offset,
                    "Duplicate plugin in registry, keeping the later record"
                ),
                DuplicatePluginPolicy::Reject => {
                    return Err(CoreError::DuplicatePlugin {
                        plugin_type: record.plugin_type,
                        first: previous,
                        second: record.offset,
                    })
                }
            }
        }
    }

    Ok(plugins)
}

/// Decode every external adapter payload and its attached data
pub fn materialize_adapters(
    records: &[ExternalRegistryRecord],
    data: &[u8],
    config: &DecoderConfig,
) -> Result<ExternalPluginAdaptersList> {
    let mut adapters = ExternalPluginAdaptersList::default();

    for record in records {
        let key = record.plugin_type.type_name();
        let index = to_index(record.offset, data, key)?;
        let adapter = ExternalPluginAdapter::decode(&mut ByteCursor::new(data, index))
            .map_err(|e| payload_error(key, record.offset, e))?;

        if adapter.adapter_type() != record.plugin_type {
            return Err(CoreError::decode(
                key,
                index,
                format!(
                    "payload holds {} but registry record is {}",
                    adapter.adapter_type().type_name(),
                    key
                ),
            ));
        }

        let attached_data = match (record.data_offset, record.data_len) {
            (Some(data_offset), Some(data_len)) => {
                let start = usize::try_from(data_offset)
                    .map_err(|e| CoreError::decode(key, index, e))?;
                let len =
                    usize::try_from(data_len).map_err(|e| CoreError::decode(key, start, e))?;
                let bytes = ByteCursor::slice_at(data, start, len, key)?;
                let schema = adapter.schema().unwrap_or(ExternalPluginAdapterSchema::Binary);
                parse_adapter_data(bytes, schema, start, config)?
            }
            _ => None,
        };

        adapters.push(
            AttachedAdapter {
                authority: record.authority,
                offset: record.offset,
                lifecycle_checks: record.lifecycle_checks.clone(),
                data_offset: record.data_offset,
                data_len: record.data_len,
                data: attached_data,
                adapter: (),
            },
            adapter,
        );
    }

    Ok(adapters)
}

/// Decode an adapter data blob under its declared schema
///
/// MsgPack is not supported and always yields the raw bytes. Invalid JSON yields
/// the raw bytes too unless `json_fallback_to_binary` is disabled. An empty JSON
/// blob has not been written yet and yields no data.
pub fn parse_adapter_data(
    bytes: &[u8],
    schema: ExternalPluginAdapterSchema,
    offset: usize,
    config: &DecoderConfig,
) -> Result<Option<AdapterData>> {
    match schema {
        ExternalPluginAdapterSchema::Binary => Ok(Some(AdapterData::Binary(bytes.to_vec()))),
        ExternalPluginAdapterSchema::Json if bytes.is_empty() => Ok(None),
        ExternalPluginAdapterSchema::Json => {
            let parsed = std::str::from_utf8(bytes)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str(text).map_err(|e| e.to_string()));
            match parsed {
                Ok(value) => Ok(Some(AdapterData::Json(value))),
                Err(reason) if config.json_fallback_to_binary => {
                    warn!(offset, reason = %reason, "Adapter JSON data unreadable, keeping raw bytes");
                    Ok(Some(AdapterData::Binary(bytes.to_vec())))
                }
                Err(reason) => Err(CoreError::decode("adapter data", offset, reason)),
            }
        }
        ExternalPluginAdapterSchema::MsgPack => {
            let degraded = CoreError::UnsupportedSchema { schema, offset };
            warn!(error = %degraded, error_type = degraded.error_type(), "Adapter data left undecoded");
            Ok(Some(AdapterData::Binary(bytes.to_vec())))
        }
    }
}
