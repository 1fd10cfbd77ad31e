//! # Compositor
//!
//! Flattens a bottom-to-top layer stack into one canvas-sized buffer.
//!
//! The bottommost visible layer is always painted as opaque Normal, whatever its blend says:
//! there is nothing beneath it to blend against. An adjustment in that position has nothing
//! to adjust, and is skipped. Everything above blends with its own mode and opacity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::adjust::{Adjustment, AdjustmentContext};
use crate::blend::{self, Blend, BlendMode};
use crate::buffer::PixelBuffer;
use crate::error::{BufferMismatch, CompositeError, InvalidArgument};
use crate::layer::{Group, GroupMode, Layer, LayerKind};
use crate::mask;
use crate::settings::Settings;

/// Opacity this close to one counts as fully opaque for skipping work.
const OPAQUE_EPSILON: f32 = 1e-6;

/// Shared flag to abandon a composite in flight. Checked between layers, never between pixels.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Walks a stack bottom to top, yielding the visible layers that contribute by themselves.
/// Pass-through groups are opened in place, invisible layers and groups are skipped whole.
struct StackWalker<'a> {
    stack: smallvec::SmallVec<[std::slice::Iter<'a, Layer>; 4]>,
}
impl<'a> StackWalker<'a> {
    fn new(layers: &'a [Layer]) -> Self {
        Self {
            stack: smallvec::smallvec![layers.iter()],
        }
    }
}
impl<'a> Iterator for StackWalker<'a> {
    type Item = &'a Layer;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let Some(layer) = top.next() else {
                // Exhausted this level, resume the parent.
                self.stack.pop();
                continue;
            };
            if !layer.visible {
                log::trace!("skipping hidden layer {:?}", layer.name);
                continue;
            }
            match &layer.kind {
                LayerKind::Group(Group { children, .. }) if layer.is_pass_through() => {
                    self.stack.push(children.iter());
                }
                _ => return Some(layer),
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Compositor {
    settings: Settings,
    cancel: Option<CancelToken>,
}
impl Compositor {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cancel: None,
        }
    }
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }
    /// Flatten `layers` (bottom to top) onto a transparent canvas.
    ///
    /// Inputs are never modified. On error nothing is returned, there is no partial result.
    pub fn composite(
        &self,
        layers: &[Layer],
        canvas: [u32; 2],
    ) -> Result<PixelBuffer, CompositeError> {
        let [width, height] = canvas;
        if width == 0 || height == 0 {
            return Err(InvalidArgument::ZeroCanvas { width, height }.into());
        }
        let result = self.composite_stack(layers, canvas)?;
        log::debug!(
            "composited {} top-level layers onto {width}x{height}",
            layers.len()
        );
        Ok(result)
    }
    fn check_cancel(&self) -> Result<(), CompositeError> {
        match &self.cancel {
            Some(cancel) if cancel.is_cancelled() => Err(CompositeError::Cancelled),
            _ => Ok(()),
        }
    }
    /// Validate the layer's blend, clamping opacity if allowed.
    fn effective_blend(&self, layer: &Layer) -> Result<Blend, InvalidArgument> {
        let mut blend = layer.blend;
        let opacity = blend.opacity;
        if (0.0..=1.0).contains(&opacity) {
            return Ok(blend);
        }
        if self.settings.strict_opacity || !opacity.is_finite() {
            return Err(InvalidArgument::Opacity {
                layer: layer.name.clone(),
                opacity,
            });
        }
        blend.opacity = opacity.clamp(0.0, 1.0);
        log::warn!(
            "layer {:?} opacity {opacity} clamped to {}",
            layer.name,
            blend.opacity
        );
        Ok(blend)
    }
    fn composite_stack(
        &self,
        layers: &[Layer],
        canvas: [u32; 2],
    ) -> Result<PixelBuffer, CompositeError> {
        let mut result = PixelBuffer::new(canvas[0], canvas[1]);
        let mut first_visible_seen = false;

        for layer in StackWalker::new(layers) {
            self.check_cancel()?;
            let is_first = !first_visible_seen;
            let blend = self.effective_blend(layer)?;
            if let Some(mask) = layer.active_mask() {
                mask::check_size(&layer.name, &layer.content, mask)?;
            }

            match &layer.kind {
                LayerKind::Adjustment(adjustment) => {
                    if is_first {
                        log::trace!("adjustment {:?} has nothing beneath it", layer.name);
                    } else {
                        apply_adjustment(layer, adjustment.as_ref(), blend, &mut result, canvas)?;
                    }
                }
                LayerKind::Content => {
                    let content = mask::destination_in(
                        &layer.content,
                        layer.offset,
                        layer.active_mask(),
                        layer.offset,
                        canvas,
                    );
                    paint(&mut result, &content, first_or(is_first, blend, layer));
                }
                LayerKind::Group(group) => {
                    // The walker opens pass-through groups, so this is isolated.
                    debug_assert_eq!(group.mode, GroupMode::Isolated);
                    let rendered = self.composite_stack(&group.children, canvas)?;
                    let content = mask::destination_in(
                        &rendered,
                        [0, 0],
                        layer.active_mask(),
                        layer.offset,
                        canvas,
                    );
                    paint(&mut result, &content, first_or(is_first, blend, layer));
                }
            }
            first_visible_seen = true;
        }
        Ok(result)
    }
}

/// The blend a content layer actually paints with.
fn first_or(is_first: bool, blend: Blend, layer: &Layer) -> Blend {
    if is_first {
        if blend != Blend::OPAQUE_NORMAL {
            log::trace!(
                "layer {:?} is bottommost, painting as opaque normal",
                layer.name
            );
        }
        Blend::OPAQUE_NORMAL
    } else {
        blend
    }
}

/// Blend a canvas-sized source onto the result.
fn paint(result: &mut PixelBuffer, src: &PixelBuffer, blend: Blend) {
    debug_assert_eq!(result.size(), src.size());
    for (dst, src) in result.pixels_mut().iter_mut().zip(src.pixels()) {
        *dst = blend::over(
            src.scale(blend.opacity),
            *dst,
            blend.mode,
            blend.alpha_clip,
        );
    }
}

/// Transform the composite so far and fold the transformed copy back in.
///
/// The transformed copy is drawn over the composite like content, at strength `opacity * mask`
/// and with the layer's mode. A full-strength unmasked Normal adjustment simply replaces it.
fn apply_adjustment(
    layer: &Layer,
    adjustment: &dyn Adjustment,
    blend: Blend,
    result: &mut PixelBuffer,
    canvas: [u32; 2],
) -> Result<(), BufferMismatch> {
    let ctx = AdjustmentContext {
        content: &layer.content,
        offset: layer.offset,
        canvas,
    };
    let transformed = adjustment.apply(&ctx, result);
    if transformed.size() != canvas {
        return Err(BufferMismatch::AdjustmentOutput {
            layer: layer.name.clone(),
            expected: canvas,
            actual: transformed.size(),
        });
    }

    let mask = layer.active_mask();
    if blend.mode == BlendMode::Normal
        && !blend.alpha_clip
        && mask.is_none()
        && blend.opacity >= 1.0 - OPAQUE_EPSILON
    {
        *result = transformed;
        return Ok(());
    }

    let width = canvas[0];
    for (i, (dst, src)) in result
        .pixels_mut()
        .iter_mut()
        .zip(transformed.pixels())
        .enumerate()
    {
        // Canvas is at most u32 x u32, so these fit.
        let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
        let strength = blend.opacity * mask::mask_value(mask, layer.offset, x, y);
        *dst = blend::over(src.scale(strength), *dst, blend.mode, blend.alpha_clip);
    }
    Ok(())
}

/// Flatten `layers` (bottom to top) onto a transparent canvas of `canvas` size, with default
/// [`Settings`].
pub fn composite(layers: &[Layer], canvas: [u32; 2]) -> Result<PixelBuffer, CompositeError> {
    Compositor::default().composite(layers, canvas)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::adjust::{ColorBalance, Desaturate, Invert};
    use crate::buffer::MaskBuffer;
    use crate::color::Rgba;
    use crate::layer::LayerStack;
    use crate::mask::Mask;

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);
    const GRAY: Rgba = Rgba::new(0.5, 0.5, 0.5, 1.0);

    fn solid(name: &str, color: Rgba) -> Layer {
        Layer::content(name, PixelBuffer::new_filled(4, 4, color))
    }
    fn strict() -> Compositor {
        Compositor::new(Settings {
            strict_opacity: true,
        })
    }
    /// A 4x4 layer with varied, partially transparent pixels.
    fn gradient(name: &str) -> Layer {
        Layer::content(
            name,
            PixelBuffer::from_fn(4, 4, |x, y| {
                Rgba::from_straight([x as f32 / 3.0, y as f32 / 3.0, 0.25, (x + y) as f32 / 6.0])
            }),
        )
    }

    #[test]
    fn empty_stack_is_transparent() {
        let out = composite(&[], [3, 2]).unwrap();
        assert_eq!(out, PixelBuffer::new(3, 2));
    }
    #[test]
    fn zero_canvas_rejected() {
        assert_eq!(
            composite(&[solid("a", RED)], [0, 4]),
            Err(CompositeError::InvalidArgument(InvalidArgument::ZeroCanvas {
                width: 0,
                height: 4
            }))
        );
        assert!(composite(&[], [4, 0]).is_err());
    }
    #[test]
    fn single_normal_layer_is_identity() {
        let layer = gradient("a");
        let out = composite(std::slice::from_ref(&layer), [4, 4]).unwrap();
        assert_eq!(out, layer.content);
    }
    #[test]
    fn single_layer_sampled_at_offset() {
        // Larger than the canvas, hanging off the top-left.
        let big = PixelBuffer::from_fn(6, 6, |x, y| Rgba::opaque([x as f32 / 8.0, y as f32 / 8.0, 0.0]));
        let layer = Layer::content("big", big.clone()).with_offset([-1, -2]);
        let out = composite(&[layer], [4, 4]).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(out.get(x, y), big.get(x + 1, y + 2));
            }
        }
        // Smaller and pushed right: the rest is transparent.
        let small = Layer::content("small", PixelBuffer::new_filled(2, 2, RED)).with_offset([3, 3]);
        let out = composite(&[small], [4, 4]).unwrap();
        assert_eq!(out.get(3, 3), Some(RED));
        assert_eq!(out.get(2, 3), Some(Rgba::TRANSPARENT));
    }
    #[test]
    fn invisible_layers_are_noops() {
        let base = vec![solid("a", GRAY), gradient("b").with_mode(BlendMode::Screen)];
        let expected = composite(&base, [4, 4]).unwrap();
        for extra in [
            solid("c", RED).hidden(),
            solid("c", RED).with_mode(BlendMode::Difference).hidden(),
            Layer::adjustment("c", std::sync::Arc::new(Invert)).hidden(),
            Layer::group("c", GroupMode::Isolated, vec![solid("d", BLUE)]).hidden(),
            Layer::group("c", GroupMode::PassThrough, vec![solid("d", BLUE)]).hidden(),
        ] {
            let mut stack = base.clone();
            stack.push(extra);
            assert_eq!(composite(&stack, [4, 4]).unwrap(), expected);
        }
        // Hiding the bottom layer makes the next one the bottommost.
        let hidden_bottom = vec![solid("a", GRAY).hidden(), solid("b", RED).with_opacity(0.5)];
        assert_eq!(
            composite(&hidden_bottom, [4, 4]).unwrap(),
            PixelBuffer::new_filled(4, 4, RED)
        );
    }
    #[test]
    fn first_visible_layer_is_opaque_normal() {
        let layer = solid("a", RED)
            .with_opacity(0.3)
            .with_mode(BlendMode::Multiply)
            .with_alpha_clip(true);
        let out = composite(&[layer], [4, 4]).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(4, 4, RED));
    }
    #[test]
    fn red_then_multiply_blue() {
        let layers = [
            solid("a", RED),
            solid("b", BLUE).with_mode(BlendMode::Multiply),
        ];
        let out = composite(&layers, [4, 4]).unwrap();
        let [r, g, b] = BlendMode::Multiply.blend_color([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]);
        for px in out.pixels() {
            assert_eq!(*px, Rgba::new(r, g, b, 1.0));
        }
    }
    #[test]
    fn mask_extremes() {
        let below = solid("a", GRAY);
        let layer = gradient("b").with_mode(BlendMode::Overlay).with_opacity(0.8);

        let hidden = composite(&[below.clone(), layer.clone().hidden()], [4, 4]).unwrap();
        let zero = composite(
            &[
                below.clone(),
                layer.clone().with_mask(Mask::new(MaskBuffer::new_filled(4, 4, 0))),
            ],
            [4, 4],
        )
        .unwrap();
        assert_eq!(zero, hidden);

        let unmasked = composite(&[below.clone(), layer.clone()], [4, 4]).unwrap();
        let full = composite(
            &[
                below.clone(),
                layer
                    .clone()
                    .with_mask(Mask::new(MaskBuffer::new_filled(4, 4, MaskBuffer::MAX_SAMPLE))),
            ],
            [4, 4],
        )
        .unwrap();
        assert_eq!(full, unmasked);

        // A disabled mask is ignored entirely.
        let disabled = Mask {
            buffer: MaskBuffer::new_filled(4, 4, 0),
            enabled: false,
        };
        let out = composite(&[below, layer.with_mask(disabled)], [4, 4]).unwrap();
        assert_eq!(out, unmasked);
    }
    #[test]
    fn partial_mask_scales_alpha() {
        let mut samples = MaskBuffer::new_filled(4, 4, 0);
        *samples.get_mut(1, 1).unwrap() = 255;
        let layers = [
            solid("a", BLUE),
            solid("b", RED).with_mask(Mask::new(samples)),
        ];
        let out = composite(&layers, [4, 4]).unwrap();
        assert_eq!(out.get(1, 1), Some(RED));
        assert_eq!(out.get(0, 0), Some(BLUE));
    }
    #[test]
    fn adjustment_on_empty_is_noop() {
        let adj = Layer::adjustment("inv", std::sync::Arc::new(Invert));
        assert_eq!(composite(&[adj.clone()], [4, 4]).unwrap(), PixelBuffer::new(4, 4));
        // Also when the layers beneath are all hidden.
        let out = composite(&[solid("a", RED).hidden(), adj], [4, 4]).unwrap();
        assert_eq!(out, PixelBuffer::new(4, 4));
    }
    #[test]
    fn adjustment_transforms_composite() {
        let layers = [
            solid("a", RED),
            Layer::adjustment("inv", std::sync::Arc::new(Invert)),
        ];
        let out = composite(&layers, [4, 4]).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(4, 4, Rgba::new(0.0, 1.0, 1.0, 1.0)));

        // Half strength is drawn over, which on an opaque backdrop is an even mix.
        let layers = [
            solid("a", RED),
            Layer::adjustment("inv", std::sync::Arc::new(Invert)).with_opacity(0.5),
        ];
        let out = composite(&layers, [4, 4]).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(4, 4, Rgba::new(0.5, 0.5, 0.5, 1.0)));
    }
    #[test]
    fn adjustment_mask_extremes() {
        let below = vec![solid("a", GRAY), gradient("b")];
        let adj = Layer::adjustment(
            "balance",
            std::sync::Arc::new(ColorBalance {
                shift: [0.2, -0.1, 0.0],
            }),
        )
        .with_opacity(0.7);
        let with = |layer: Layer| {
            let mut stack = below.clone();
            stack.push(layer);
            composite(&stack, [4, 4]).unwrap()
        };
        let hidden = with(adj.clone().hidden());
        let unmasked = with(adj.clone());
        assert_eq!(with(adj.clone().with_mask(Mask::new(MaskBuffer::new_filled(4, 4, 0)))), hidden);
        assert_eq!(
            with(adj.clone().with_mask(Mask::new(MaskBuffer::new_filled(4, 4, 255)))),
            unmasked
        );
        // Same for a non-normal mode.
        let adj = adj.with_mode(BlendMode::Multiply);
        assert_eq!(with(adj.clone().with_mask(Mask::new(MaskBuffer::new_filled(4, 4, 0)))), hidden);
        assert_eq!(
            with(adj.clone().with_mask(Mask::new(MaskBuffer::new_filled(4, 4, 255)))),
            with(adj)
        );
    }
    #[test]
    fn adjustment_replace_matches_opaque_over() {
        // Over an opaque composite, replacing and a full-strength masked over agree exactly.
        let below = vec![solid("a", GRAY), gradient("b").with_mode(BlendMode::Screen)];
        let adj = Layer::adjustment("gray", std::sync::Arc::new(Desaturate));
        let mut replaced = below.clone();
        replaced.push(adj.clone());
        let mut faded = below;
        faded.push(adj.with_mask(Mask::new(MaskBuffer::new_filled(4, 4, 255))));
        assert_eq!(
            composite(&replaced, [4, 4]).unwrap(),
            composite(&faded, [4, 4]).unwrap()
        );
    }
    #[test]
    fn adjustment_over_translucent_composite() {
        // Half-transparent red, premultiplied (0.5, 0, 0, 0.5). Inverted it is (0, 0.5, 0.5, 0.5).
        let base = Layer::content(
            "a",
            PixelBuffer::new_filled(4, 4, Rgba::from_straight([1.0, 0.0, 0.0, 0.5])),
        );
        let adj = Layer::adjustment("inv", std::sync::Arc::new(Invert)).with_opacity(0.5);
        // (0, 0.25, 0.25, 0.25) + (0.5, 0, 0, 0.5) * 0.75
        let drawn = Rgba::new(0.375, 0.25, 0.25, 0.625);

        let out = composite(&[base.clone(), adj.clone()], [4, 4]).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(4, 4, drawn));

        // Masked: revealed on the left half only.
        let mut samples = MaskBuffer::new_filled(4, 4, 0);
        for y in 0..4 {
            for x in 0..2 {
                *samples.get_mut(x, y).unwrap() = 255;
            }
        }
        let out = composite(&[base, adj.with_mask(Mask::new(samples))], [4, 4]).unwrap();
        for y in 0..4 {
            assert_eq!(out.get(0, y), Some(drawn));
            assert_eq!(out.get(1, y), Some(drawn));
            assert_eq!(out.get(2, y), Some(Rgba::new(0.5, 0.0, 0.0, 0.5)));
            assert_eq!(out.get(3, y), Some(Rgba::new(0.5, 0.0, 0.0, 0.5)));
        }
    }
    #[test]
    fn order_sensitivity() {
        let base = solid("base", GRAY);
        let yellow = solid("y", Rgba::opaque([1.0, 1.0, 0.2])).with_mode(BlendMode::Multiply);
        let cyan = solid("c", Rgba::opaque([0.25, 1.0, 1.0])).with_mode(BlendMode::Multiply);
        // Opaque multiplies commute.
        let a = composite(&[base.clone(), yellow.clone(), cyan.clone()], [4, 4]).unwrap();
        let b = composite(&[base.clone(), cyan.clone(), yellow.clone()], [4, 4]).unwrap();
        assert_eq!(a.to_rgba8(), b.to_rgba8());
        // Screen then multiply does not commute.
        let screen = cyan.with_mode(BlendMode::Screen);
        let a = composite(&[base.clone(), yellow.clone(), screen.clone()], [4, 4]).unwrap();
        let b = composite(&[base, screen, yellow], [4, 4]).unwrap();
        assert_ne!(a.to_rgba8(), b.to_rgba8());
    }
    #[test]
    fn strict_opacity() {
        let layers = [solid("a", GRAY), solid("b", RED).with_opacity(1.5)];
        assert_eq!(
            strict().composite(&layers, [4, 4]),
            Err(CompositeError::InvalidArgument(InvalidArgument::Opacity {
                layer: "b".to_owned(),
                opacity: 1.5
            }))
        );
        let lenient = Compositor::new(Settings {
            strict_opacity: false,
        });
        assert_eq!(
            lenient.composite(&layers, [4, 4]).unwrap(),
            PixelBuffer::new_filled(4, 4, RED)
        );
        // NaN can't be clamped.
        let layers = [solid("a", GRAY), solid("b", RED).with_opacity(f32::NAN)];
        assert!(matches!(
            lenient.composite(&layers, [4, 4]),
            Err(CompositeError::InvalidArgument(InvalidArgument::Opacity { .. }))
        ));
    }
    #[test]
    fn zero_opacity_and_empty_content_contribute_nothing() {
        let below = solid("a", GRAY);
        let expected = PixelBuffer::new_filled(4, 4, GRAY);
        let layers = [below.clone(), solid("b", RED).with_opacity(0.0)];
        assert_eq!(composite(&layers, [4, 4]).unwrap(), expected);
        let layers = [below, Layer::content("b", PixelBuffer::empty())];
        assert_eq!(composite(&layers, [4, 4]).unwrap(), expected);
    }
    #[test]
    fn mask_size_mismatch() {
        let layers = [
            solid("a", GRAY),
            solid("b", RED).with_mask(Mask::new(MaskBuffer::new_filled(3, 4, 255))),
        ];
        assert_eq!(
            composite(&layers, [4, 4]),
            Err(CompositeError::BufferMismatch(BufferMismatch::MaskSize {
                layer: "b".to_owned(),
                mask: [3, 4],
                content: [4, 4]
            }))
        );
    }
    #[test]
    fn adjustment_output_size_checked() {
        #[derive(Debug)]
        struct Shrink;
        impl Adjustment for Shrink {
            fn apply(&self, _: &AdjustmentContext<'_>, _: &PixelBuffer) -> PixelBuffer {
                PixelBuffer::new(1, 1)
            }
        }
        let layers = [solid("a", GRAY), Layer::adjustment("s", std::sync::Arc::new(Shrink))];
        assert!(matches!(
            composite(&layers, [4, 4]),
            Err(CompositeError::BufferMismatch(BufferMismatch::AdjustmentOutput { .. }))
        ));
    }
    #[test]
    fn cancelled() {
        let cancel = CancelToken::new();
        let compositor = Compositor::default().with_cancel(cancel.clone());
        let layers = [solid("a", GRAY)];
        assert!(compositor.composite(&layers, [4, 4]).is_ok());
        cancel.cancel();
        assert_eq!(
            compositor.composite(&layers, [4, 4]),
            Err(CompositeError::Cancelled)
        );
        // Nothing to visit, nothing to cancel.
        assert!(compositor.composite(&[], [4, 4]).is_ok());
    }
    #[test]
    fn pass_through_group_is_its_children() {
        let children = vec![
            solid("b", RED).with_opacity(0.5),
            gradient("c").with_mode(BlendMode::Difference),
        ];
        let flat = {
            let mut layers = vec![solid("a", GRAY)];
            layers.extend(children.clone());
            composite(&layers, [4, 4]).unwrap()
        };
        let grouped = composite(
            &[
                solid("a", GRAY),
                // The group's own blend is ignored.
                Layer::group("g", GroupMode::PassThrough, children.clone())
                    .with_mode(BlendMode::Screen)
                    .with_opacity(0.1),
            ],
            [4, 4],
        )
        .unwrap();
        assert_eq!(grouped, flat);

        // A pass-through group's first child is the bottommost visible layer.
        let first = composite(
            &[Layer::group("g", GroupMode::PassThrough, vec![solid("b", RED).with_opacity(0.5)])],
            [4, 4],
        )
        .unwrap();
        assert_eq!(first, PixelBuffer::new_filled(4, 4, RED));
    }
    #[test]
    fn isolated_group_blends_as_one() {
        // Inside the group, the multiply has only the group's own red beneath it.
        let group = Layer::group(
            "g",
            GroupMode::Isolated,
            vec![solid("r", RED), solid("b", BLUE).with_mode(BlendMode::Multiply)],
        )
        .with_opacity(0.5);
        let out = composite(&[solid("a", Rgba::WHITE), group], [4, 4]).unwrap();
        // Red multiply blue is black, half over white is mid gray.
        assert_eq!(out, PixelBuffer::new_filled(4, 4, GRAY));

        // An isolated group's bottom child is opaque-normal within the group.
        let group = Layer::group(
            "g",
            GroupMode::Isolated,
            vec![solid("b", BLUE).with_opacity(0.25)],
        );
        let out = composite(&[solid("a", RED), group], [4, 4]).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(4, 4, BLUE));
    }
    #[test]
    fn isolated_group_mask_uses_group_offset() {
        let group = Layer::group("g", GroupMode::Isolated, vec![solid("b", BLUE)])
            .with_mask(Mask::new(MaskBuffer::new_filled(1, 1, 255)))
            .with_offset([2, 1]);
        let out = composite(&[solid("a", RED), group], [4, 4]).unwrap();
        assert_eq!(out.get(2, 1), Some(BLUE));
        assert_eq!(out.get(0, 0), Some(RED));
        assert_eq!(out.get(3, 3), Some(RED));
    }
    #[test]
    fn stack_snapshot() {
        let mut stack = LayerStack::new([4, 4]);
        stack.push(solid("a", RED));
        stack.push(solid("b", BLUE).with_mode(BlendMode::Multiply));
        let snapshot = stack.clone();
        // Editing the live stack doesn't affect the snapshot.
        stack.layers[1].visible = false;
        let out = snapshot.composite(Settings::default()).unwrap();
        assert_eq!(out, PixelBuffer::new_filled(4, 4, Rgba::BLACK));
        assert_eq!(
            stack.composite(Settings::default()).unwrap(),
            PixelBuffer::new_filled(4, 4, RED)
        );
    }
}
