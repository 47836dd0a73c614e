mod bridge;
mod config;
mod context;
mod error;
mod types;

pub use bridge::ScriptBridge;
pub use config::{CONFIG_FILE_NAME, OUTFIT_DIR_NAME, PluginConfig, SCRIPT_CLASS_NAME};
pub use context::PluginContext;
pub use error::{CoreError, CoreErrorCode};
pub use types::{ActorOutfitEntry, GroupEntry, HostMessage, OutfitEntry};
