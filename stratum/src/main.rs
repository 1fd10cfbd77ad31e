#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod global;
mod loader;
mod manifest;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyResult};

struct Args {
    manifest: PathBuf,
    output: Option<PathBuf>,
}
impl Args {
    const USAGE: &'static str = "usage: stratum <manifest.toml> [-o out.png]";
    /// Paths are OSStrings, let the system handle character encoding restrictions.
    fn parse(mut args: impl Iterator<Item = std::ffi::OsString>) -> AnyResult<Self> {
        let mut manifest = None;
        let mut output = None;
        while let Some(arg) = args.next() {
            if arg == "-o" || arg == "--output" {
                let path = args.next().context(Self::USAGE)?;
                output = Some(path.into());
            } else if manifest.is_none() {
                manifest = Some(arg.into());
            } else {
                anyhow::bail!("unexpected argument {arg:?}\n{}", Self::USAGE);
            }
        }
        Ok(Self {
            manifest: manifest.context(Self::USAGE)?,
            output,
        })
    }
}

fn write_png(path: &Path, flat: &stratum_core::buffer::PixelBuffer) -> AnyResult<()> {
    let image = image::RgbaImage::from_raw(flat.width(), flat.height(), flat.to_rgba8())
        .context("composite has the wrong number of pixels")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    let args = Args::parse(std::env::args_os().skip(1))?;
    let manifest = manifest::Manifest::read(&args.manifest)?;
    let base = args.manifest.parent().unwrap_or_else(|| Path::new(""));

    let preferences = global::preferences::Preferences::get();
    if preferences.should_write_defaults() {
        // Leave a documented default file for the user to edit.
        if let Err(e) = preferences.save() {
            log::warn!("Failed to save settings:\n{e:?}");
        };
    }
    let settings = manifest.settings(preferences.settings());

    let rasters = loader::Rasters::decode(base, &manifest.paths())?;
    let stack = loader::build_stack(&manifest, &rasters)?;
    log::info!(
        "compositing {} layers onto {:?}",
        stack.layers.len(),
        stack.canvas
    );
    let flat = stack
        .composite(settings)
        .with_context(|| format!("compositing {}", args.manifest.display()))?;

    let output = args
        .output
        .or_else(|| manifest.output.as_ref().map(|output| base.join(output)))
        .unwrap_or_else(|| args.manifest.with_extension("png"));
    write_png(&output, &flat)?;
    log::info!("wrote {}", output.display());
    Ok(())
}
