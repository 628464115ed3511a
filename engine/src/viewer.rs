use crate::config::ViewerConfig;
use crate::decode;
use crate::error::Result;
use crate::node::DocumentInput;
use crate::resources::{ImageHandle, ImageStore};
use crate::tree::{self, Document};
use log::{debug, info};
use serde::Serialize;

/// A loaded document together with every image exported from it.
pub struct Viewer {
    document: Document,
    store: ImageStore,
}

/// One row of the layer listing.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    pub depth: usize,
    pub index: usize,
    pub name: String,
    pub is_group: bool,
    pub visible: bool,
    pub opacity_percent: u32,
    pub blend_mode: String,
}

impl Viewer {
    pub fn from_json(json: &str, config: &ViewerConfig) -> Result<Viewer> {
        let input: DocumentInput = serde_json::from_str(json)?;
        Viewer::from_input(&input, config)
    }

    pub fn from_input(input: &DocumentInput, config: &ViewerConfig) -> Result<Viewer> {
        let nodes = decode::parse_nodes(input)?;
        let document = tree::build(input.width, input.height, nodes)?;
        Ok(Viewer::from_document(document, config))
    }

    pub fn from_document(document: Document, config: &ViewerConfig) -> Viewer {
        Viewer { document, store: ImageStore::new(config) }
    }

    pub fn document(&self) -> &Document { &self.document }
    pub fn store(&self) -> &ImageStore { &self.store }

    pub fn flattened_image(&mut self) -> Result<ImageHandle> {
        let image = self.document.render_full()?;
        self.store.to_exportable(&image)
    }

    /// The subtree at `index`, placed where it sits in the full document.
    pub fn node_image(&mut self, index: usize) -> Result<ImageHandle> {
        let image = self.document.render_region(index)?;
        self.store.to_exportable(&image)
    }

    pub fn image_bytes(&self, handle: &ImageHandle) -> Option<&[u8]> {
        handle.id().and_then(|id| self.store.get(id))
    }

    pub fn data_url(&self, handle: &ImageHandle) -> Option<String> {
        self.store.data_url(handle)
    }

    pub fn release(&mut self, handle: &ImageHandle) -> bool {
        self.store.release(handle)
    }

    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.document
            .walk()
            .into_iter()
            .map(|(depth, node)| OutlineEntry {
                depth,
                index: node.index,
                name: node.name.clone(),
                is_group: node.is_group(),
                visible: node.visible,
                opacity_percent: (node.opacity * 100.0).round() as u32,
                blend_mode: node.blend_mode.clone(),
            })
            .collect()
    }

    /// Releases every exported image and drops the document.
    pub fn clear(&mut self) {
        self.store.clear();
        self.document.clear();
    }
}

/// Runs conversions one after another, releasing the previous viewer first.
pub struct Converter {
    config: ViewerConfig,
    current: Option<Viewer>,
}

impl Converter {
    pub fn new(config: ViewerConfig) -> Self {
        Converter { config, current: None }
    }

    /// Loads `json` and exports its flattened image. On failure nothing from
    /// this attempt stays alive.
    pub fn convert(&mut self, json: &str) -> Result<ImageHandle> {
        self.clear();
        let mut viewer = Viewer::from_json(json, &self.config)?;
        match viewer.flattened_image() {
            Ok(handle) => {
                info!("flattened {}x{} document", viewer.document().width(), viewer.document().height());
                self.current = Some(viewer);
                Ok(handle)
            }
            Err(e) => {
                viewer.clear();
                Err(e)
            }
        }
    }

    pub fn viewer(&self) -> Option<&Viewer> { self.current.as_ref() }

    pub fn clear(&mut self) {
        if let Some(mut prev) = self.current.take() {
            debug!("clearing previous conversion");
            prev.clear();
        }
    }
}

/// File name without its last extension, e.g. `art.psd.json` → `art.psd`.
pub fn image_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < file_name.len() => &file_name[..pos],
        _ => file_name,
    }
}
