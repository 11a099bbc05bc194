//! Configuration system
//!
//! Schemas are declared with [`config_struct!`](crate::config_struct) so every
//! default lives next to its field. `utils` handles loading, environment
//! overrides, validation and global access.

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{
    apply_env_overrides, get_config_clone, init_config, is_config_initialized, load_config,
    load_config_from_path, validate, with_config,
};
