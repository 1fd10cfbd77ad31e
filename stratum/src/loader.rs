//! Turning a [`Manifest`] into a [`LayerStack`].
//!
//! Every raster is decoded up front, in parallel, so the stack built afterwards is a plain
//! in-memory snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use stratum_core::{
    buffer::{MaskBuffer, PixelBuffer},
    layer::{Layer, LayerStack},
    mask::Mask,
};

use crate::manifest::{EntryKind, LayerEntry, Manifest};

/// Decoded rasters, keyed by their path as written in the manifest.
#[derive(Default)]
pub struct Rasters(HashMap<PathBuf, image::DynamicImage>);
impl Rasters {
    /// Decode every path, relative to `base`. Fails on the first unreadable file, after logging
    /// all of them.
    pub fn decode(base: &Path, paths: &[&Path]) -> anyhow::Result<Self> {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
        let decoded: Vec<(PathBuf, anyhow::Result<image::DynamicImage>)> = paths
            .par_iter()
            .map(|&path| {
                let full = base.join(path);
                let image = image::open(&full)
                    .with_context(|| format!("decoding {}", full.display()));
                (path.to_owned(), image)
            })
            .collect();

        let mut rasters = HashMap::with_capacity(decoded.len());
        let mut first_error = None;
        for (path, image) in decoded {
            match image {
                Ok(image) => {
                    rasters.insert(path, image);
                }
                Err(e) => {
                    log::error!("failed to open file {path:?}: {e:#}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(Self(rasters)),
        }
    }
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: image::DynamicImage) {
        self.0.insert(path.into(), image);
    }
    fn get(&self, path: &Path) -> anyhow::Result<&image::DynamicImage> {
        self.0
            .get(path)
            .ok_or_else(|| anyhow::anyhow!("{} was never decoded", path.display()))
    }
    fn content(&self, path: &Path) -> anyhow::Result<PixelBuffer> {
        let rgba = self.get(path)?.to_rgba8();
        Ok(PixelBuffer::from_rgba8(
            rgba.width(),
            rgba.height(),
            rgba.as_raw(),
        )?)
    }
    fn mask(&self, path: &Path) -> anyhow::Result<MaskBuffer> {
        let luma = self.get(path)?.to_luma8();
        let (width, height) = luma.dimensions();
        Ok(MaskBuffer::from_luma8(width, height, luma.into_raw())?)
    }
}

fn build_layer(entry: &LayerEntry, rasters: &Rasters) -> anyhow::Result<Layer> {
    let layer = match entry.kind()? {
        EntryKind::Content(path) => Layer::content(&entry.name, rasters.content(path)?),
        EntryKind::Adjustment(adjustment, content) => {
            let layer = Layer::adjustment(&entry.name, adjustment.build());
            match content {
                Some(path) => layer.with_content(rasters.content(path)?),
                None => layer,
            }
        }
        EntryKind::Group(mode, children) => {
            let children = children
                .iter()
                .map(|child| build_layer(child, rasters))
                .collect::<anyhow::Result<_>>()?;
            Layer::group(&entry.name, mode.into(), children)
        }
    };
    let mut layer = layer
        .with_mode(entry.blend_mode()?)
        .with_opacity(entry.opacity)
        .with_alpha_clip(entry.alpha_clip)
        .with_offset(entry.offset);
    if let Some(path) = &entry.mask {
        let mut mask = Mask::new(rasters.mask(path)?);
        mask.enabled = entry.mask_enabled;
        layer = layer.with_mask(mask);
    }
    if !entry.visible {
        layer = layer.hidden();
    }
    Ok(layer)
}

/// Build the stack a manifest describes, from already decoded rasters.
pub fn build_stack(manifest: &Manifest, rasters: &Rasters) -> anyhow::Result<LayerStack> {
    let mut stack = LayerStack::new(manifest.canvas);
    for entry in &manifest.layers {
        let layer = build_layer(entry, rasters)
            .with_context(|| format!("building layer {:?}", entry.name))?;
        stack.push(layer);
    }
    Ok(stack)
}
