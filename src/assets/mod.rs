//! Asset Module
//!
//! Model and texture import:
//! - [`data_uri`]: base64 `data:` URI decoding
//! - [`texture_loader`]: background image decoding with render-thread upload
//! - [`importer`]: [`GltfImporter`], building nodes, skins and animation states
//!   from documents parsed by the `gltf` crate

pub mod data_uri;
pub mod importer;
pub mod texture_loader;

pub use importer::{GltfImporter, ImportedModel};
pub use texture_loader::{TextureLoadEvent, TextureLoader, TextureSource};
