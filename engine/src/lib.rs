pub mod error;
pub mod blend;
pub mod canvas;
pub mod node;
pub mod decode;
pub mod tree;
pub mod render;
pub mod resources;
pub mod config;
pub mod viewer;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use blend::CompositeOp;
pub use canvas::Canvas;
pub use config::{ExportMode, ViewerConfig};
pub use error::{Result, ViewerError};
pub use node::{Bounds, DocumentInput, Node, NodeKind, NodeRecord};
pub use resources::{ImageHandle, ImageId, ImageStore};
pub use tree::{build, Document};
pub use viewer::{Converter, OutlineEntry, Viewer};
