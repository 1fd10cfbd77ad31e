//! The on-disk description of a layer stack snapshot.
//!
//! ```toml
//! canvas = [640, 480]
//! output = "flat.png"
//!
//! [[layer]]
//! name = "paper"
//! image = "paper.png"
//!
//! [[layer]]
//! name = "ink"
//! image = "ink.png"
//! blend = "multiply"
//! mask = "ink-mask.png"
//! ```
//!
//! Layers are listed bottom to top. Paths are relative to the manifest's directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use stratum_core::{adjust, blend::BlendMode, layer::GroupMode};

#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("layer {layer:?}: unknown blend mode {mode:?}, expected one of {known}")]
    UnknownBlend {
        layer: String,
        mode: String,
        known: String,
    },
    #[error("layer {layer:?}: a group can't also be an adjustment or have an image")]
    GroupWithContent { layer: String },
    #[error("layer {layer:?}: nothing to draw, expected `image`, `adjustment`, or `group`")]
    Empty { layer: String },
    #[error("layer {layer:?}: only groups have children")]
    StrayChildren { layer: String },
}

fn default_true() -> bool {
    true
}
fn default_opacity() -> f32 {
    1.0
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverride {
    pub strict_opacity: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupEntry {
    PassThrough,
    Isolated,
}
impl From<GroupEntry> for GroupMode {
    fn from(value: GroupEntry) -> Self {
        match value {
            GroupEntry::PassThrough => GroupMode::PassThrough,
            GroupEntry::Isolated => GroupMode::Isolated,
        }
    }
}

/// Built-in adjustments. Angles are in degrees.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum AdjustmentEntry {
    Invert,
    Desaturate,
    ColorBalance {
        shift: [f32; 3],
    },
    BumpMap {
        azimuth: Option<f32>,
        elevation: Option<f32>,
        depth: Option<f32>,
    },
}
impl AdjustmentEntry {
    #[must_use]
    pub fn build(self) -> adjust::AdjustmentRef {
        use std::sync::Arc;
        match self {
            Self::Invert => Arc::new(adjust::Invert),
            Self::Desaturate => Arc::new(adjust::Desaturate),
            Self::ColorBalance { shift } => Arc::new(adjust::ColorBalance { shift }),
            Self::BumpMap {
                azimuth,
                elevation,
                depth,
            } => {
                let default = adjust::BumpMap::default();
                Arc::new(adjust::BumpMap {
                    azimuth: azimuth.map_or(default.azimuth, f32::to_radians),
                    elevation: elevation.map_or(default.elevation, f32::to_radians),
                    depth: depth.unwrap_or(default.depth),
                })
            }
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayerEntry {
    #[serde(default)]
    pub name: String,
    pub image: Option<PathBuf>,
    pub adjustment: Option<AdjustmentEntry>,
    pub group: Option<GroupEntry>,
    /// Bottom to top.
    #[serde(default)]
    pub children: Vec<LayerEntry>,
    #[serde(default = "default_true")]
    pub visible: bool,
    pub blend: Option<String>,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub alpha_clip: bool,
    #[serde(default)]
    pub offset: [i32; 2],
    pub mask: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub mask_enabled: bool,
}

/// What a layer entry turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryKind<'a> {
    Content(&'a Path),
    /// With optional content for the adjustment to read.
    Adjustment(AdjustmentEntry, Option<&'a Path>),
    Group(GroupEntry, &'a [LayerEntry]),
}

impl LayerEntry {
    pub fn blend_mode(&self) -> Result<BlendMode, ManifestError> {
        match &self.blend {
            None => Ok(BlendMode::Normal),
            Some(name) => name.parse().map_err(|_| {
                use strum::IntoEnumIterator;
                let known: Vec<String> = BlendMode::iter().map(|mode| mode.to_string()).collect();
                ManifestError::UnknownBlend {
                    layer: self.name.clone(),
                    mode: name.clone(),
                    known: known.join(", "),
                }
            }),
        }
    }
    pub fn kind(&self) -> Result<EntryKind<'_>, ManifestError> {
        let layer = || self.name.clone();
        if !self.children.is_empty() && self.group.is_none() {
            return Err(ManifestError::StrayChildren { layer: layer() });
        }
        match (self.group, self.adjustment, self.image.as_deref()) {
            (Some(group), None, None) => Ok(EntryKind::Group(group, &self.children)),
            (Some(_), _, _) => Err(ManifestError::GroupWithContent { layer: layer() }),
            (None, Some(adjustment), image) => Ok(EntryKind::Adjustment(adjustment, image)),
            (None, None, Some(image)) => Ok(EntryKind::Content(image)),
            (None, None, None) => Err(ManifestError::Empty { layer: layer() }),
        }
    }
    /// Every raster this entry and its children reference.
    pub fn collect_paths<'a>(&'a self, into: &mut Vec<&'a Path>) {
        into.extend(self.image.as_deref());
        into.extend(self.mask.as_deref());
        for child in &self.children {
            child.collect_paths(into);
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub canvas: [u32; 2],
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub settings: SettingsOverride,
    /// Bottom to top.
    #[serde(default, rename = "layer")]
    pub layers: Vec<LayerEntry>,
}
impl Manifest {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing manifest {}", path.display()))
    }
    /// Apply the manifest's overrides on top of `base`.
    #[must_use]
    pub fn settings(&self, base: stratum_core::Settings) -> stratum_core::Settings {
        stratum_core::Settings {
            strict_opacity: self.settings.strict_opacity.unwrap_or(base.strict_opacity),
        }
    }
    /// Every raster referenced anywhere in the stack, deduplicated.
    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths = Vec::new();
        for layer in &self.layers {
            layer.collect_paths(&mut paths);
        }
        paths.sort_unstable();
        paths.dedup();
        paths
    }
}
