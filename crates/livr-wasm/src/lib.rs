//! WASM bindings for delivery-note extraction.
//!
//! Documents are passed as text, with pages separated by form feeds, and
//! results come back as plain JS objects.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use livr_core::{
    DeliveryParser, PageSelection, ProfileSet, ProfileStore, SourceDocument, TextDocument,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(js_error)
}

fn compile_profiles(profiles_json: &str) -> Result<ProfileSet, JsValue> {
    let store = ProfileStore::from_json(profiles_json).map_err(js_error)?;
    ProfileSet::compile(&store).map_err(js_error)
}

/// Extract items from text with a JSON profile store.
#[wasm_bindgen]
pub fn extract_from_text(text: &str, profiles_json: &str) -> Result<JsValue, JsValue> {
    DeliveryExtractor::new(profiles_json)?.extract(text)
}

/// Detect the supplier of a text with a JSON profile store.
#[wasm_bindgen]
pub fn detect_supplier(text: &str, profiles_json: &str) -> Result<String, JsValue> {
    DeliveryExtractor::new(profiles_json)?.detect(text)
}

/// Lowercase and strip accents, as done for supplier detection.
#[wasm_bindgen]
pub fn normalize_text(text: &str) -> String {
    livr_core::text::normalize_light(text)
}

/// Lenient integer parse ("2.000" is 2000, "3,5" is 3, garbage is 0).
#[wasm_bindgen]
pub fn to_integer(value: &str) -> i64 {
    livr_core::text::to_integer(value)
}

/// European decimal parse ("1.234,50" is 1234.5, garbage is 0).
#[wasm_bindgen]
pub fn to_float(value: &str) -> f64 {
    livr_core::text::to_float(value)
}

/// Delivery-note extractor holding a compiled profile store.
#[wasm_bindgen]
pub struct DeliveryExtractor {
    parser: DeliveryParser,
}

#[wasm_bindgen]
impl DeliveryExtractor {
    /// Compile a JSON profile store.
    #[wasm_bindgen(constructor)]
    pub fn new(profiles_json: &str) -> Result<DeliveryExtractor, JsValue> {
        Ok(Self {
            parser: DeliveryParser::new(compile_profiles(profiles_json)?),
        })
    }

    /// Supplier names in declaration order.
    #[wasm_bindgen]
    pub fn suppliers(&self) -> Vec<String> {
        self.parser.profiles().iter().map(|p| p.name.clone()).collect()
    }

    /// Extract items from every page.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        self.extract_pages(text, "all")
    }

    /// Extract items from the selected pages ("1-3", "2,4").
    #[wasm_bindgen]
    pub fn extract_pages(&self, text: &str, pages: &str) -> Result<JsValue, JsValue> {
        let pages: PageSelection = pages.parse().map_err(js_error)?;
        let result = self
            .parser
            .process(TextDocument::from_text(text), &pages)
            .map_err(js_error)?;
        to_js(&result)
    }

    /// Detected supplier name, or "unknown".
    #[wasm_bindgen]
    pub fn detect(&self, text: &str) -> Result<String, JsValue> {
        let document = SourceDocument::read(&TextDocument::from_text(text), &PageSelection::All)
            .map_err(js_error)?;
        Ok(self.parser.detect(&document).supplier)
    }
}
