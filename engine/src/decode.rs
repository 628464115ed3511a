use crate::error::{Result, ViewerError};
use crate::node::{DocumentInput, Node, NodeRecord};
use base64::{engine::general_purpose, Engine as _};
use image::RgbaImage;
use log::debug;

/// A parsed `data:<mime>;base64,<payload>` URL.
#[derive(Debug, PartialEq)]
pub struct DataUrl<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

/// Only base64 data URLs are understood; anything else yields `None`.
pub fn parse_data_url(src: &str) -> Option<DataUrl<'_>> {
    let rest = src.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let params = header.strip_suffix(";base64")?;
    let mime = params.split(';').next().unwrap_or("");
    if payload.is_empty() {
        return None;
    }
    Some(DataUrl { mime, payload })
}

pub fn decode_data_url(src: &str) -> Result<RgbaImage> {
    let url = parse_data_url(src).ok_or_else(|| ViewerError::malformed("invalid image data: layer source is not a base64 data URL"))?;
    let bytes = general_purpose::STANDARD.decode(url.payload)?;
    let image = image::load_from_memory(&bytes)?.to_rgba8();
    debug!("decoded {} layer image {}x{}", url.mime, image.width(), image.height());
    Ok(image)
}

/// Decodes a layer's pixels from its record. Groups carry no image.
pub fn decode_record(record: &NodeRecord, index: usize) -> Result<Option<RgbaImage>> {
    match record.node_type.as_str() {
        "layer" => {
            let src = record.src.as_deref().ok_or_else(|| ViewerError::malformed(format!("layer {} ({:?}) has no image data", index, record.name)))?;
            decode_data_url(src).map(Some)
        }
        _ => Ok(None),
    }
}

/// Checks every record and decodes every layer in declaration order, then
/// builds the matching nodes.
pub fn parse_nodes(input: &DocumentInput) -> Result<Vec<Node>> {
    input
        .descendants
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let record = NodeRecord::from_value(value, i)?;
            Node::new(&record, i, decode_record(&record, i)?)
        })
        .collect()
}
