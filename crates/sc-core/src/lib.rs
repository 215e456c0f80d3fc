pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod id;
pub mod layout;
pub mod model;

pub use catalog::{Catalog, CatalogSeed, EntityProvider, MembershipIndex};
pub use config::CanvasConfig;
pub use error::ConfigError;
pub use filter::{FilterState, expand_tags, resolve_songs};
pub use id::{EntityId, InstanceId};
pub use layout::{GridLayout, GridParams, grid_layout};
pub use model::*;
