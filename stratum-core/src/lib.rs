//! Layer compositing and masking.
//!
//! A [`layer::Layer`] stack, bottom to top, is flattened by [`compositor::composite`] into one
//! premultiplied [`buffer::PixelBuffer`].

pub mod adjust;
pub mod blend;
pub mod buffer;
pub mod color;
pub mod compositor;
pub mod effects;
pub mod error;
pub mod layer;
pub mod mask;
pub mod settings;

pub use compositor::{composite, CancelToken, Compositor};
pub use error::CompositeError;
pub use layer::{Layer, LayerStack};
pub use settings::Settings;
