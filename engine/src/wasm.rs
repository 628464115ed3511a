use wasm_bindgen::prelude::*;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::node::DocumentInput;
use crate::resources::ImageHandle;
use crate::viewer::Viewer;
use std::collections::HashSet;
use web_sys::{Blob, BlobPropertyBag, Url};

fn to_js(err: ViewerError) -> JsValue { JsValue::from_str(&err.to_string()) }

/// Object URLs handed to the page; every one of them is revoked on `clear`.
#[derive(Default)]
struct ObjectUrlSet {
    urls: HashSet<String>,
}

impl ObjectUrlSet {
    fn create(&mut self, bytes: &[u8], mime: &str) -> Result<String, JsValue> {
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let bag = BlobPropertyBag::new();
        bag.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &bag)?;
        let url = Url::create_object_url_with_blob(&blob)?;
        self.urls.insert(url.clone());
        Ok(url)
    }

    fn revoke(&mut self, url: &str) {
        if self.urls.remove(url) {
            let _ = Url::revoke_object_url(url);
        }
    }

    fn clear(&mut self) {
        for url in self.urls.drain() { let _ = Url::revoke_object_url(&url); }
    }
}

#[wasm_bindgen]
pub struct JsViewer {
    viewer: Viewer,
    urls: ObjectUrlSet,
}

#[wasm_bindgen]
impl JsViewer {
    /// `input` is the exported document object; `config` may be `undefined`.
    #[wasm_bindgen(constructor)]
    pub fn new(input: JsValue, config: JsValue) -> Result<JsViewer, JsValue> {
        console_error_panic_hook::set_once();
        let config: ViewerConfig = if config.is_undefined() || config.is_null() { ViewerConfig::default() } else { serde_wasm_bindgen::from_value(config)? };
        let input: DocumentInput = serde_wasm_bindgen::from_value(input)?;
        let viewer = Viewer::from_input(&input, &config).map_err(to_js)?;
        Ok(JsViewer { viewer, urls: ObjectUrlSet::default() })
    }

    pub fn from_json(json: &str) -> Result<JsViewer, JsValue> {
        console_error_panic_hook::set_once();
        let viewer = Viewer::from_json(json, &ViewerConfig::default()).map_err(to_js)?;
        Ok(JsViewer { viewer, urls: ObjectUrlSet::default() })
    }

    pub fn width(&self) -> u32 { self.viewer.document().width() }
    pub fn height(&self) -> u32 { self.viewer.document().height() }

    pub fn flattened_image_url(&mut self) -> Result<String, JsValue> {
        let handle = self.viewer.flattened_image().map_err(to_js)?;
        self.url_for(handle)
    }

    pub fn node_image_url(&mut self, index: usize) -> Result<String, JsValue> {
        let handle = self.viewer.node_image(index).map_err(to_js)?;
        self.url_for(handle)
    }

    /// Depth-first layer listing, topmost first.
    pub fn outline(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.viewer.outline())?)
    }

    pub fn revoke(&mut self, url: &str) { self.urls.revoke(url); }

    pub fn clear(&mut self) {
        self.urls.clear();
        self.viewer.clear();
    }

    fn url_for(&mut self, handle: ImageHandle) -> Result<String, JsValue> {
        match &handle {
            ImageHandle::DataUrl(url) => Ok(url.clone()),
            ImageHandle::Stored(_) => {
                // The blob owns the bytes from here on.
                let bytes = self.viewer.image_bytes(&handle).ok_or_else(|| JsValue::from_str("image already released"))?.to_vec();
                self.viewer.release(&handle);
                self.urls.create(&bytes, "image/png")
            }
        }
    }
}
