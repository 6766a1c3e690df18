//! Typed views of account records, plugins and external plugin adapters

pub mod adapter;
pub mod authority;
pub mod plugin;

pub use adapter::{
    AdapterData, AdapterKind, AppData, AttachedAdapter, DataSection, ExternalCheckResult,
    ExternalPluginAdapter, ExternalPluginAdapterSchema, ExternalPluginAdapterType,
    ExternalPluginAdaptersList, ExtraAccount, HookableLifecycleEvent, LifecycleChecks,
    LifecycleHook, LinkedAppData, LinkedDataKey, LinkedLifecycleHook, Oracle, Seed,
    ValidationResultsOffset,
};
pub use authority::{Key, PluginAuthority, UpdateAuthority};
pub use plugin::{
    AddBlocker, AttachedPlugin, Attribute, Attributes, Autograph, AutographSignature,
    BurnDelegate, Creator, Edition, FreezeDelegate, ImmutableMetadata, MasterEdition,
    PermanentBurnDelegate, PermanentFreezeDelegate, PermanentTransferDelegate, Plugin,
    PluginType, PluginsList, Royalties, RuleSet, TransferDelegate, UpdateDelegate,
    VerifiedCreators, VerifiedCreatorsSignature,
};
