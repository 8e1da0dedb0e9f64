//! Threadgrab core: seed validation, media addressing and run settings.
//!
//! Nothing here touches the network; the engine crate builds on these types.
mod config_file;
mod media;
mod seed;
mod settings;

pub use config_file::{load_seed_file, ConfigError, DEFAULT_SEED_FILE};
pub use media::{MediaUrl, TargetPath, TargetPathError};
pub use seed::{is_seed_url, parse_seed_lines, SeedList, SeedUrl};
pub use settings::{ExtractPattern, HarvestSettings, DEFAULT_SITE_ORIGIN, DEFAULT_STICKER_PREFIX};
