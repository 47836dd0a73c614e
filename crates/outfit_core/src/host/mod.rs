mod memory;

pub use memory::{ActorManifest, FormManifest, ItemManifest, MemoryHost};
