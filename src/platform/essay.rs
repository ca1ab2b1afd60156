//! Essay text loading
//!
//! The body is fetched once into the tile's `.essay-content` element; later
//! activations reuse it.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlElement, Response};

use crate::consts::ESSAY_FALLBACK_TEXT;
use crate::error::{GalleryError, Result};

/// GET `path` and return the body as text
pub async fn fetch_text(path: &str) -> Result<String> {
    let window = web_sys::window().ok_or_else(|| GalleryError::MissingElement("window".into()))?;
    let response: Response = JsFuture::from(window.fetch_with_str(path))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(GalleryError::Fetch {
            path: path.to_string(),
            status: response.status(),
        });
    }
    let text = JsFuture::from(response.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}

/// Fill the tile's text area if it is still empty. Failures leave the
/// fallback text in place instead.
pub async fn ensure_loaded(tile: &HtmlElement, path: &str) {
    let Some(content) = tile.query_selector(".essay-content").ok().flatten() else {
        log::warn!("Essay tile for {path} has no .essay-content");
        return;
    };
    if !content.text_content().unwrap_or_default().is_empty() {
        return;
    }

    let text = match fetch_text(path).await {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Loading essay {path}: {e}");
            ESSAY_FALLBACK_TEXT.to_string()
        }
    };
    content.set_text_content(Some(&text));
}
