//! # Layers
//!
//! Immutable snapshots of the editable layer stack. Index 0 of any stack is the bottommost layer.
//! Editing happens elsewhere and produces a fresh snapshot for the next composite.

use crate::adjust::AdjustmentRef;
use crate::blend::{Blend, BlendMode};
use crate::buffer::PixelBuffer;
use crate::mask::Mask;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum GroupMode {
    /// Children are grouped for organization only, and the compositor
    /// treats it as if it were simply it's children.
    PassThrough,
    /// Children are composited alone, the output is then blended as a single layer.
    Isolated,
}

#[derive(Clone, Debug)]
pub struct Group {
    pub mode: GroupMode,
    /// Bottom to top.
    pub children: Vec<Layer>,
}

#[derive(Clone, Debug)]
pub enum LayerKind {
    /// Paints its own content.
    Content,
    /// Transforms the composite of everything beneath it.
    /// The layer's content, if any, is handed to the adjustment as extra input.
    Adjustment(AdjustmentRef),
    /// A nested stack. Pass-through groups ignore their own blend and mask.
    Group(Group),
}

#[derive(Clone, Debug)]
pub struct Layer {
    /// For diagnostics only.
    pub name: String,
    pub visible: bool,
    pub blend: Blend,
    /// Canvas position of the content's top-left corner. Content may hang off any edge.
    pub offset: [i32; 2],
    pub content: PixelBuffer,
    pub mask: Option<Mask>,
    pub kind: LayerKind,
}
impl Layer {
    fn new(name: impl Into<String>, content: PixelBuffer, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            visible: true,
            blend: Blend::default(),
            offset: [0, 0],
            content,
            mask: None,
            kind,
        }
    }
    /// A visible, Normal, fully opaque content layer.
    #[must_use]
    pub fn content(name: impl Into<String>, content: PixelBuffer) -> Self {
        Self::new(name, content, LayerKind::Content)
    }
    /// A visible, Normal, fully opaque adjustment layer without content.
    #[must_use]
    pub fn adjustment(name: impl Into<String>, adjustment: AdjustmentRef) -> Self {
        Self::new(name, PixelBuffer::empty(), LayerKind::Adjustment(adjustment))
    }
    #[must_use]
    pub fn group(name: impl Into<String>, mode: GroupMode, children: Vec<Layer>) -> Self {
        Self::new(
            name,
            PixelBuffer::empty(),
            LayerKind::Group(Group { mode, children }),
        )
    }
    #[must_use]
    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }
    #[must_use]
    pub fn with_mode(mut self, mode: BlendMode) -> Self {
        self.blend.mode = mode;
        self
    }
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.blend.opacity = opacity;
        self
    }
    #[must_use]
    pub fn with_alpha_clip(mut self, alpha_clip: bool) -> Self {
        self.blend.alpha_clip = alpha_clip;
        self
    }
    #[must_use]
    pub fn with_offset(mut self, offset: [i32; 2]) -> Self {
        self.offset = offset;
        self
    }
    #[must_use]
    pub fn with_content(mut self, content: PixelBuffer) -> Self {
        self.content = content;
        self
    }
    #[must_use]
    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
    #[must_use]
    pub fn is_adjustment(&self) -> bool {
        matches!(self.kind, LayerKind::Adjustment(_))
    }
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        matches!(
            self.kind,
            LayerKind::Group(Group {
                mode: GroupMode::PassThrough,
                ..
            })
        )
    }
    /// The mask, if present and enabled.
    #[must_use]
    pub fn active_mask(&self) -> Option<&Mask> {
        self.mask.as_ref().filter(|mask| mask.enabled)
    }
}

/// An owned snapshot of a whole layer stack, ready to be handed to a worker.
#[derive(Clone, Debug)]
pub struct LayerStack {
    pub canvas: [u32; 2],
    /// Bottom to top.
    pub layers: Vec<Layer>,
}
impl LayerStack {
    #[must_use]
    pub fn new(canvas: [u32; 2]) -> Self {
        Self {
            canvas,
            layers: Vec::new(),
        }
    }
    /// Add a layer on top of the stack.
    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }
    pub fn composite(
        &self,
        settings: crate::settings::Settings,
    ) -> Result<PixelBuffer, crate::error::CompositeError> {
        crate::compositor::Compositor::new(settings).composite(&self.layers, self.canvas)
    }
}
