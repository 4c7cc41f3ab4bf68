//! # Toolbelt Catalog
//!
//! Data model for schema-described, taggable tools plus the arena that
//! owns them.
//!
//! ## Architecture
//!
//! ```text
//! Tool { name, description, schema, tags, metadata }
//!     │
//!     └──> Catalog (arena)
//!            └─> stable ToolId keys for every index/cache layer
//! ```
//!
//! The catalog hands out dense integer identities so that downstream
//! indices and caches can reference tools without owning them. A `ToolId`
//! stays valid for the lifetime of its registration and is never handed
//! out again after `unregister`.

mod catalog;
mod fields;
mod metadata;
mod schema;
mod tool;

pub use catalog::{Catalog, ToolId};
pub use fields::TextField;
pub use metadata::MetadataValue;
pub use schema::{PropertyType, ToolSchema};
pub use tool::Tool;
