use crate::config::{ExportMode, ViewerConfig};
use crate::error::Result;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ids are unique across every store in the process, so a handle from a
/// cleared store never names an image in another one.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ImageId(u64);

/// An exported image.
///
/// `Stored` handles point into the [`ImageStore`] that issued them and are
/// only meaningful until that store releases them or is cleared; using one
/// afterwards is a caller error. `DataUrl` handles are self-contained.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ImageHandle {
    Stored(ImageId),
    DataUrl(String),
}

impl ImageHandle {
    pub fn id(&self) -> Option<ImageId> {
        match self {
            ImageHandle::Stored(id) => Some(*id),
            ImageHandle::DataUrl(_) => None,
        }
    }
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Tracks every encoded image handed out, so that they can all be released at once.
#[derive(Debug, Default)]
pub struct ImageStore {
    config: ViewerConfig,
    images: HashMap<ImageId, Vec<u8>>,
}

impl ImageStore {
    pub fn new(config: &ViewerConfig) -> Self {
        ImageStore { config: config.clone(), images: HashMap::new() }
    }

    pub fn encode_png(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut bytes, self.config.png_compression(), self.config.png_filter());
        encoder.write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)?;
        Ok(bytes)
    }

    /// Encodes `image` as PNG and returns a handle according to the export mode.
    pub fn to_exportable(&mut self, image: &RgbaImage) -> Result<ImageHandle> {
        let bytes = self.encode_png(image)?;
        match self.config.export_mode {
            ExportMode::ObjectUrl => Ok(ImageHandle::Stored(self.insert(bytes))),
            ExportMode::DataUrl => Ok(ImageHandle::DataUrl(to_data_url("image/png", &bytes))),
        }
    }

    /// Starts tracking already encoded bytes.
    pub fn insert(&mut self, bytes: Vec<u8>) -> ImageId {
        let id = ImageId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        self.images.insert(id, bytes);
        id
    }

    pub fn get(&self, id: ImageId) -> Option<&[u8]> {
        self.images.get(&id).map(Vec::as_slice)
    }

    /// Encoded bytes behind a handle, as a data URL.
    pub fn data_url(&self, handle: &ImageHandle) -> Option<String> {
        match handle {
            ImageHandle::Stored(id) => self.get(*id).map(|b| to_data_url("image/png", b)),
            ImageHandle::DataUrl(url) => Some(url.clone()),
        }
    }

    /// Returns `true` if the handle was live.
    pub fn release(&mut self, handle: &ImageHandle) -> bool {
        match handle {
            ImageHandle::Stored(id) => self.images.remove(id).is_some(),
            ImageHandle::DataUrl(_) => false,
        }
    }

    pub fn clear(&mut self) {
        if !self.images.is_empty() {
            debug!("releasing {} exported images", self.images.len());
        }
        self.images.clear();
    }

    pub fn len(&self) -> usize { self.images.len() }
    pub fn is_empty(&self) -> bool { self.images.is_empty() }
}

impl Drop for ImageStore {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 4, |x, y| if (x + y) % 2 == 0 { image::Rgba([255, 255, 255, 255]) } else { image::Rgba([0, 0, 0, 0]) })
    }

    #[test]
    fn stored_handles_are_tracked_until_released() {
        let mut store = ImageStore::new(&ViewerConfig::default());
        let a = store.to_exportable(&checker()).unwrap();
        let b = store.to_exportable(&checker()).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert!(store.release(&a));
        assert!(!store.release(&a));
        assert_eq!(store.len(), 1);
        assert!(store.get(b.id().unwrap()).is_some());
        store.clear();
        assert!(store.is_empty());
        assert!(store.get(b.id().unwrap()).is_none());
    }

    #[test]
    fn handles_do_not_carry_over_between_stores() {
        let mut first = ImageStore::new(&ViewerConfig::default());
        let stale = first.to_exportable(&checker()).unwrap();
        first.clear();
        let mut second = ImageStore::new(&ViewerConfig::default());
        let fresh = second.to_exportable(&checker()).unwrap();
        assert_ne!(stale, fresh);
        assert!(second.get(stale.id().unwrap()).is_none());
        assert!(!second.release(&stale));
    }

    #[test]
    fn encoded_bytes_decode_back() {
        let mut store = ImageStore::new(&ViewerConfig::default());
        let handle = store.to_exportable(&checker()).unwrap();
        let bytes = store.get(handle.id().unwrap()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(image::load_from_memory(bytes).unwrap().to_rgba8(), checker());
    }

    #[test]
    fn data_url_mode_tracks_nothing() {
        let config = ViewerConfig { export_mode: ExportMode::DataUrl, ..ViewerConfig::default() };
        let mut store = ImageStore::new(&config);
        let handle = store.to_exportable(&checker()).unwrap();
        assert!(store.is_empty());
        assert!(handle.id().is_none());
        let url = store.data_url(&handle).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(crate::decode::decode_data_url(&url).unwrap(), checker());
    }

    #[test]
    fn empty_buffers_fail_to_encode() {
        let mut store = ImageStore::new(&ViewerConfig::default());
        let err = store.to_exportable(&RgbaImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, crate::error::ViewerError::Resource(_)));
        assert!(store.is_empty());
    }
}
