//! Lifecycle extra-account resolution
//!
//! Expands the adapters that opted into a lifecycle event into the ordered account
//! list the on-chain program expects: oracles first, then lifecycle hooks, then linked
//! lifecycle hooks, each in registry order. Extra accounts of a hook follow the hook's
//! own program account in declaration order.

use itertools::Itertools;
use smallvec::SmallVec;
use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};
use tracing::debug;

use crate::errors::{CoreError, Result};
use crate::types::{ExternalPluginAdaptersList, ExtraAccount, HookableLifecycleEvent, Seed};

/// Leading seed of every preconfigured extra-account PDA
pub const PRECONFIGURED_SEED: &[u8] = b"mpl-core";

/// Well-known addresses available to extra-account resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleInputs {
    pub asset: Option<Pubkey>,
    pub collection: Option<Pubkey>,
    pub owner: Option<Pubkey>,
    pub recipient: Option<Pubkey>,
}

impl LifecycleInputs {
    pub fn new(asset: Pubkey, owner: Pubkey) -> Self {
        Self {
            asset: Some(asset),
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn with_collection(mut self, collection: Pubkey) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn with_recipient(mut self, recipient: Pubkey) -> Self {
        self.recipient = Some(recipient);
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum WellKnown {
    Asset,
    Collection,
    Owner,
    Recipient,
}

impl WellKnown {
    fn name(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Collection => "collection",
            Self::Owner => "owner",
            Self::Recipient => "recipient",
        }
    }
}

fn account(pubkey: Pubkey, (is_signer, is_writable): (bool, bool)) -> AccountMeta {
    AccountMeta {
        pubkey,
        is_signer,
        is_writable,
    }
}

/// Resolution pass that records every missing input instead of stopping at the first
struct Resolver<'a> {
    inputs: &'a LifecycleInputs,
    missing: Vec<&'static str>,
}

impl<'a> Resolver<'a> {
    fn new(inputs: &'a LifecycleInputs) -> Self {
        Self {
            inputs,
            missing: Vec::new(),
        }
    }

    fn lookup(&mut self, input: WellKnown) -> Option<Pubkey> {
        let value = match input {
            WellKnown::Asset => self.inputs.asset,
            WellKnown::Collection => self.inputs.collection,
            WellKnown::Owner => self.inputs.owner,
            WellKnown::Recipient => self.inputs.recipient,
        };
        if value.is_none() {
            self.missing.push(input.name());
        }
        value
    }

    fn preconfigured(&mut self, input: WellKnown, program: &Pubkey) -> Option<Pubkey> {
        let key = self.lookup(input)?;
        Some(Pubkey::find_program_address(&[PRECONFIGURED_SEED, key.as_ref()], program).0)
    }

    fn custom_pda(&mut self, seeds: &[Seed], program_id: &Pubkey) -> Result<Option<Pubkey>> {
        let mut buffers: SmallVec<[Vec<u8>; 4]> = SmallVec::with_capacity(seeds.len());
        let mut complete = true;

        for seed in seeds {
            let resolved = match seed {
                Seed::Collection => self.lookup(WellKnown::Collection),
                Seed::Owner => self.lookup(WellKnown::Owner),
                Seed::Recipient => self.lookup(WellKnown::Recipient),
                Seed::Asset => self.lookup(WellKnown::Asset),
                Seed::Address(address) => Some(*address),
                Seed::Bytes(bytes) => {
                    buffers.push(bytes.clone());
                    continue;
                }
            };
            match resolved {
                Some(key) => buffers.push(key.to_bytes().to_vec()),
                None => complete = false,
            }
        }

        if !complete {
            return Ok(None);
        }

        let refs: SmallVec<[&[u8]; 4]> = buffers.iter().map(Vec::as_slice).collect();
        Pubkey::try_find_program_address(&refs, program_id)
            .map(|(address, _bump)| Some(address))
            .ok_or_else(|| CoreError::InvalidSeeds {
                program_id: *program_id,
                reason: format!("no valid bump for {} seed(s)", refs.len()),
            })
    }

    /// `Ok(None)` means an input was missing and has been recorded
    fn resolve(&mut self, extra: &ExtraAccount, program: &Pubkey) -> Result<Option<AccountMeta>> {
        let pubkey = match extra {
            ExtraAccount::Address { address, .. } => Some(*address),
            ExtraAccount::PreconfiguredProgram { .. } => Some(
                Pubkey::find_program_address(&[PRECONFIGURED_SEED, program.as_ref()], program).0,
            ),
            ExtraAccount::PreconfiguredCollection { .. } => {
                self.preconfigured(WellKnown::Collection, program)
            }
            ExtraAccount::PreconfiguredOwner { .. } => self.preconfigured(WellKnown::Owner, program),
            ExtraAccount::PreconfiguredRecipient { .. } => {
                self.preconfigured(WellKnown::Recipient, program)
            }
            ExtraAccount::PreconfiguredAsset { .. } => self.preconfigured(WellKnown::Asset, program),
            ExtraAccount::CustomPda {
                seeds,
                custom_program_id,
                ..
            } => self.custom_pda(seeds, custom_program_id.as_ref().unwrap_or(program))?,
        };
        Ok(pubkey.map(|pubkey| account(pubkey, extra.flags())))
    }

    fn missing_error(&self) -> CoreError {
        CoreError::MissingRequiredInput {
            inputs: self.missing.iter().copied().unique().collect(),
        }
    }

    fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(self.missing_error())
        }
    }
}

/// Resolve one extra-account description against `program`
pub fn resolve_extra_account(
    extra: &ExtraAccount,
    program: &Pubkey,
    inputs: &LifecycleInputs,
) -> Result<AccountMeta> {
    let mut resolver = Resolver::new(inputs);
    match resolver.resolve(extra, program)? {
        Some(meta) => Ok(meta),
        None => Err(resolver.missing_error()),
    }
}

/// Resolve the extra accounts every adapter registered for `event` requires
///
/// # Errors
///
/// `MissingRequiredInput` naming every well-known address the adapters reference
/// but `inputs` lacks, and `InvalidSeeds` when a custom seed list has no PDA.
pub fn resolve_lifecycle_extra_accounts(
    event: HookableLifecycleEvent,
    adapters: &ExternalPluginAdaptersList,
    inputs: &LifecycleInputs,
) -> Result<Vec<AccountMeta>> {
    let mut resolver = Resolver::new(inputs);
    let mut accounts = Vec::new();

    for oracle in adapters
        .oracles
        .iter()
        .filter(|oracle| oracle.check_for(event).is_some())
    {
        let base_address = oracle.adapter.base_address;
        match &oracle.adapter.base_address_config {
            Some(config) => accounts.extend(resolver.resolve(config, &base_address)?),
            None => accounts.push(AccountMeta::new_readonly(base_address, false)),
        }
    }

    let hooks = adapters
        .lifecycle_hooks
        .iter()
        .filter(|hook| hook.check_for(event).is_some())
        .map(|hook| (hook.adapter.hooked_program, &hook.adapter.extra_accounts))
        .chain(
            adapters
                .linked_lifecycle_hooks
                .iter()
                .filter(|hook| hook.check_for(event).is_some())
                .map(|hook| (hook.adapter.hooked_program, &hook.adapter.extra_accounts)),
        );

    for (hooked_program, extra_accounts) in hooks {
        accounts.push(AccountMeta::new_readonly(hooked_program, false));
        for extra in extra_accounts.iter().flatten() {
            accounts.extend(resolver.resolve(extra, &hooked_program)?);
        }
    }

    resolver.finish()?;
    debug!(event = ?event, accounts = accounts.len(), "Resolved lifecycle extra accounts");
    Ok(accounts)
}
