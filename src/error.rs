//! Errors raised at the platform edge
//!
//! The gallery core never fails: inconsistencies are healed or skipped and
//! logged. These errors only surface from DOM lookups, fetches and settings
//! parsing, and callers log and swallow them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("missing DOM element: {0}")]
    MissingElement(String),

    #[error("javascript error: {0}")]
    Js(String),

    #[error("fetch of {path} failed with status {status}")]
    Fetch { path: String, status: u16 },

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for GalleryError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        GalleryError::Js(format!("{value:?}"))
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
