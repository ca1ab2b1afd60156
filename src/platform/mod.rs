//! Platform abstraction layer
//!
//! Implementations of the gallery's `Stage` collaborator:
//! - `dom`: the browser stage over the page's markup (wasm only)
//! - `media`: video and HLS playback inside film tiles (wasm only)
//! - `essay`: essay text fetch (wasm only)
//! - `headless`: in-memory stage for native runs and tests

pub mod headless;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod essay;
#[cfg(target_arch = "wasm32")]
pub mod media;
