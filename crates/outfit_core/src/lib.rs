pub mod actor_map;
pub mod core_api;
pub mod cosave;
pub mod form;
pub mod host;
pub mod layout;
pub mod reader;
pub mod registry;
pub mod shuffle;
