//! # Sitecraft Registry
//!
//! Maps a block's `designId` to the design that can build, render and describe it.
//!
//! ```text
//! designId ──lookup──▶ BlockDesign
//!                        ├─ make_default(ids)   → Block
//!                        ├─ render(block, theme) → RenderNode
//!                        └─ schema()             → SchemaDescriptor
//! ```
//!
//! The catalog itself is supplied by the embedding application through
//! [`RegistryBuilder`]. The `starter` feature ships a small catalog for tests.

mod design;
mod migrate;
mod registry;
mod render;
mod schema;

#[cfg(feature = "starter")]
pub mod starter;

pub use design::BlockDesign;
pub use migrate::{migrate_doc, DefaultDesigns};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use render::RenderNode;
pub use schema::{FieldKind, FormEdit, SchemaDescriptor, SchemaError, SchemaField, SchemaSection, SelectOption};
