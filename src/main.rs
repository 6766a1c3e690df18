//! asset-plugins - inspect plugin-bearing asset accounts
//!
//! Decodes an asset account (and optionally its collection) from a base64 or hex
//! dump, derives the effective plugin state and prints a JSON summary. Optionally
//! resolves the extra accounts for a lifecycle event and evaluates the permission
//! predicates for a principal.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_plugins::authority::{can_burn, can_transfer, can_update, check_plugin_authorities};
use asset_plugins::types::HookableLifecycleEvent;
use asset_plugins::{
    collection_address_of, derive_asset_plugins, resolve_lifecycle_extra_accounts,
    AccountDecoder, AssetView, CollectionView, DecoderConfig, LifecycleInputs,
    PluginAuthorityCheck, Pubkey,
};

/// Account dump encoding
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Encoding {
    Base64,
    Hex,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect plugin-bearing asset accounts", long_about = None)]
struct Args {
    /// File holding the asset account data
    #[arg(long)]
    asset: PathBuf,

    /// Address of the asset account
    #[arg(long)]
    asset_address: Option<Pubkey>,

    /// File holding the collection account data
    #[arg(long)]
    collection: Option<PathBuf>,

    /// Address of the collection account (defaults to the asset's collection)
    #[arg(long)]
    collection_address: Option<Pubkey>,

    /// Encoding of the account data files
    #[arg(long, value_enum, default_value = "base64")]
    encoding: Encoding,

    /// Resolve extra accounts for this lifecycle event (create, transfer, burn, update)
    #[arg(long)]
    event: Option<HookableLifecycleEvent>,

    /// Recipient used for extra account resolution
    #[arg(long)]
    recipient: Option<Pubkey>,

    /// Evaluate permissions for this principal
    #[arg(long)]
    principal: Option<Pubkey>,

    /// Path to decoder configuration file
    #[arg(short, long, env = "ASSET_PLUGINS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// JSON document printed on stdout
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    /// Asset with collection plugins and adapters merged in
    asset: &'a AssetView,
    #[serde(skip_serializing_if = "Option::is_none")]
    collection: Option<&'a CollectionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra_accounts: Option<Vec<ExtraAccountMeta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<Permissions>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtraAccountMeta {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Permissions {
    principal: Pubkey,
    can_transfer: bool,
    can_burn: bool,
    can_update: bool,
    /// Plugin key name to whether the principal is that plugin's authority
    plugin_authority: BTreeMap<&'static str, bool>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    let config = load_config(args.config.as_deref())?;
    let decoder = AccountDecoder::new(config);

    let asset_address = args.asset_address.unwrap_or_default();
    let asset_bytes = read_account(&args.asset, args.encoding)?;
    let asset = decoder
        .decode_asset(asset_address, &asset_bytes)
        .with_context(|| format!("Failed to decode asset account {}", args.asset.display()))?;
    info!(asset = %asset.public_key, bytes = asset_bytes.len(), "Asset decoded");

    let collection = match &args.collection {
        Some(path) => {
            let address = args
                .collection_address
                .or_else(|| collection_address_of(&asset))
                .unwrap_or_default();
            let bytes = read_account(path, args.encoding)?;
            let collection = decoder
                .decode_collection(address, &bytes)
                .with_context(|| format!("Failed to decode collection account {}", path.display()))?;
            Some(collection)
        }
        None => {
            if collection_address_of(&asset).is_some() {
                warn!("Asset belongs to a collection but no collection data was given");
            }
            None
        }
    };

    let derived = derive_asset_plugins(&asset, collection.as_ref())
        .context("Failed to derive asset plugins")?;

    let mut summary = Summary {
        asset: &derived,
        collection: collection.as_ref(),
        extra_accounts: None,
        permissions: None,
    };

    if let Some(event) = args.event {
        let mut inputs = LifecycleInputs::new(asset.public_key, asset.owner);
        inputs.collection = collection
            .as_ref()
            .map(|c| c.public_key)
            .or_else(|| collection_address_of(&asset));
        inputs.recipient = args.recipient;

        let accounts =
            resolve_lifecycle_extra_accounts(event, &derived.external_plugin_adapters, &inputs)
                .with_context(|| format!("Failed to resolve extra accounts for {:?}", event))?;
        summary.extra_accounts = Some(
            accounts
                .into_iter()
                .map(|meta| ExtraAccountMeta {
                    pubkey: meta.pubkey,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
        );
    }

    if let Some(principal) = args.principal {
        let plugin_types = derived.plugins.plugin_types();
        let checks = check_plugin_authorities(&PluginAuthorityCheck {
            principal,
            plugin_types: &plugin_types,
            asset: &asset,
            collection: collection.as_ref(),
        })?;

        summary.permissions = Some(Permissions {
            principal,
            can_transfer: can_transfer(&principal, &asset, collection.as_ref())?,
            can_burn: can_burn(&principal, &asset, collection.as_ref())?,
            can_update: can_update(&principal, &asset, collection.as_ref()),
            plugin_authority: plugin_types
                .iter()
                .map(|plugin_type| plugin_type.key_name())
                .zip(checks)
                .collect(),
        });
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Initialize logging on stderr so stdout stays machine readable
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "asset_plugins=debug,info"
    } else {
        "asset_plugins=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}

/// Load configuration from file with fallback to defaults, then apply env overrides
fn load_config(path: Option<&Path>) -> Result<DecoderConfig> {
    let mut config = match path {
        Some(path) => DecoderConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DecoderConfig::default(),
    };
    config.from_env()?;
    Ok(config)
}

fn read_account(path: &Path, encoding: Encoding) -> Result<Vec<u8>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let text = text.trim();
    let bytes = match encoding {
        Encoding::Base64 => base64::engine::general_purpose::STANDARD
            .decode(text)
            .with_context(|| format!("{} is not valid base64", path.display()))?,
        Encoding::Hex => hex::decode(text.trim_start_matches("0x"))
            .with_context(|| format!("{} is not valid hex", path.display()))?,
    };
    Ok(bytes)
}
