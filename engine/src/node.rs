use crate::blend::{self, CompositeOp};
use crate::canvas;
use crate::error::{Result, ViewerError};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiny_skia::Pixmap;

/// The exported document as handed over by the importer.
///
/// Entries stay raw JSON until [`NodeRecord::from_value`] checks them one by
/// one, so a bad field is reported against its node.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DocumentInput {
    pub width: i64,
    pub height: i64,
    pub descendants: Vec<Value>,
}

/// One entry of the flat `descendants` list.
///
/// `opacity` and `parent_index` are kept as raw JSON values and checked by
/// [`Node::new`], which reports them as malformed node and invalid tree.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: Value,
    #[serde(alias = "blendingMode", default = "default_blend_mode")]
    pub blend_mode: String,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub right: i32,
    #[serde(default)]
    pub bottom: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(alias = "parentNodeIndex", default)]
    pub parent_index: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

fn default_visible() -> bool { true }
fn default_opacity() -> Value { Value::from(1.0) }
fn default_blend_mode() -> String { "normal".to_string() }

impl NodeRecord {
    /// Parses one `descendants` entry. Missing fields take their defaults; a
    /// field of the wrong type makes the node malformed.
    pub fn from_value(value: &Value, index: usize) -> Result<NodeRecord> {
        NodeRecord::deserialize(value).map_err(|e| ViewerError::malformed(format!("node {}: {}", index, e)))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Group { children: Vec<usize>, passthrough: bool },
    /// `image` is `None` only when the importer never supplied pixels.
    Layer { image: Option<Pixmap> },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub index: usize,
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub blend_mode: String,
    pub bounds: Bounds,
    pub parent_index: Option<i64>,
    pub kind: NodeKind,
}

impl Node {
    /// Builds a node from its record. Layers premultiply `image`, which
    /// has already been decoded by the caller; groups ignore it.
    pub fn new(record: &NodeRecord, index: usize, image: Option<RgbaImage>) -> Result<Node> {
        let opacity = parse_opacity(&record.opacity)
            .ok_or_else(|| ViewerError::malformed(format!("node {} ({:?}): invalid opacity {}", index, record.name, record.opacity)))?;
        let parent_index = parse_parent_index(&record.parent_index)
            .ok_or_else(|| ViewerError::invalid_tree(format!("node {} ({:?}): parent index {} is not an integer", index, record.name, record.parent_index)))?;
        let kind = match record.node_type.as_str() {
            "group" => NodeKind::Group { children: Vec::new(), passthrough: blend::is_passthrough(&record.blend_mode) },
            "layer" => NodeKind::Layer { image: image.as_ref().map(canvas::to_pixmap).transpose()? },
            other => return Err(ViewerError::malformed(format!("node {} ({:?}): unknown node type {:?}", index, record.name, other))),
        };
        Ok(Node {
            index,
            name: record.name.clone(),
            visible: record.visible,
            opacity,
            blend_mode: record.blend_mode.clone(),
            bounds: Bounds { left: record.left, top: record.top, right: record.right, bottom: record.bottom, width: record.width, height: record.height },
            parent_index,
            kind,
        })
    }

    pub fn is_group(&self) -> bool { matches!(self.kind, NodeKind::Group { .. }) }
    pub fn is_layer(&self) -> bool { matches!(self.kind, NodeKind::Layer { .. }) }

    pub fn children(&self) -> &[usize] {
        match &self.kind {
            NodeKind::Group { children, .. } => children,
            NodeKind::Layer { .. } => &[],
        }
    }

    pub fn image(&self) -> Option<&Pixmap> {
        match &self.kind {
            NodeKind::Layer { image } => image.as_ref(),
            NodeKind::Group { .. } => None,
        }
    }

    pub fn passthrough(&self) -> bool {
        matches!(self.kind, NodeKind::Group { passthrough: true, .. })
    }

    /// Paint operator for this node, with the source-over fallback.
    pub fn composite_op(&self) -> CompositeOp {
        blend::resolve(&self.blend_mode, format_args!("node {} ({:?})", self.index, self.name))
    }
}

fn parse_opacity(value: &Value) -> Option<f32> {
    let v = value.as_f64()?;
    if v.is_finite() && (0.0..=1.0).contains(&v) { Some(v as f32) } else { None }
}

/// `null` means a root. Anything else has to be an integer.
fn parse_parent_index(value: &Value) -> Option<Option<i64>> {
    match value {
        Value::Null => Some(None),
        v => v.as_i64().map(Some),
    }
}
