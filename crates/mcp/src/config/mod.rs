//! Server configuration.
//!
//! Settings come from an optional JSON file, then command-line flags and
//! environment variables layered on top (see [`ConfigOverrides`]), and are
//! validated before any server starts.

mod io;
mod model;
mod validation;

pub use io::{CONFIG_PATH_ENV, config_path_from_env, load_config_from_path};
pub use model::{ConfigOverrides, ServerConfig, Transport};
pub use validation::{ConfigError, validate_config};
