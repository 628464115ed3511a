use crate::error::Result;
use image::codecs::png::{CompressionType, FilterType};
use serde::{Deserialize, Serialize};

/// How exported images are handed to the consumer.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExportMode {
    /// Encoded bytes are kept in the store until released.
    #[default]
    ObjectUrl,
    /// A self-contained `data:` URL; nothing to release.
    DataUrl,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub enum Compression {
    #[default]
    Default,
    Fast,
    Best,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    None,
    Sub,
    Up,
    Avg,
    Paeth,
    #[default]
    Adaptive,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    pub export_mode: ExportMode,
    pub compression: Compression,
    pub filter: Filter,
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn png_compression(&self) -> CompressionType {
        match self.compression {
            Compression::Default => CompressionType::Default,
            Compression::Fast => CompressionType::Fast,
            Compression::Best => CompressionType::Best,
        }
    }

    pub fn png_filter(&self) -> FilterType {
        match self.filter {
            Filter::None => FilterType::NoFilter,
            Filter::Sub => FilterType::Sub,
            Filter::Up => FilterType::Up,
            Filter::Avg => FilterType::Avg,
            Filter::Paeth => FilterType::Paeth,
            Filter::Adaptive => FilterType::Adaptive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(ViewerConfig::from_json("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn reads_camel_case_fields() {
        let config = ViewerConfig::from_json(r#"{"exportMode": "dataUrl", "compression": "best", "filter": "paeth"}"#).unwrap();
        assert_eq!(config.export_mode, ExportMode::DataUrl);
        assert!(matches!(config.png_compression(), CompressionType::Best));
        assert!(matches!(config.png_filter(), FilterType::Paeth));
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(ViewerConfig::from_json(r#"{"exportMode": "zip"}"#).is_err());
    }
}
