//! Domain models for Packsmith
//!
//! Content kinds, marketplaces, versions, items and packs. These types carry
//! the invariants of the pipeline; the components in sibling modules only
//! transform them.

pub mod item;
pub mod kind;
pub mod marketplace;
pub mod pack;
pub mod version;

pub use item::{ContentItem, SidecarKind, SupportLevel};
pub use kind::{ContentKind, Section};
pub use marketplace::Marketplace;
pub use pack::{Pack, PackMetadata, PreparedPack};
pub use version::Version;
