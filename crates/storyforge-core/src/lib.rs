#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod bundler;
pub mod codegen;
pub mod compose;
pub mod config;
pub mod dev;
pub mod docgen;
pub mod env;
pub mod error;
pub mod externals;
pub mod paths;
pub mod plugins;
pub mod presets;
pub mod stories;
pub mod version;

pub use bundler::{BuildContext, BuildOptions, BuildOutput, Bundler, Plugin};
pub use compose::{compose_build_options, BuildOverrides, UserBuildConfig};
pub use config::{CatalogOptions, ConfigType};
pub use dev::{DevServer, DevStatus, StartResult};
pub use error::{Error, Result};
pub use presets::{Preset, Presets, ValuePreset};
pub use stories::{list_stories, StoriesEntry};
pub use version::VERSION;
