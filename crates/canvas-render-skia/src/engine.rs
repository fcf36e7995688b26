// File: crates/canvas-render-skia/src/engine.rs
// Summary: Skia graphics engine: surface construction per target, hardware budget, typeface and image caches.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use canvas_core::{EngineError, GraphicsEngine, PhysicalSize, ResourceCache};
use log::{debug, info, warn};
use skia_safe as skia;

use crate::options::EngineOptions;
use crate::surface::{SkiaSurface, SkiaTarget};
use crate::text::TextShaper;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// Loaded Skia engine. Share it between surfaces through an `EngineHandle`.
pub struct SkiaEngine {
    options: EngineOptions,
    font_mgr: skia::FontMgr,
    typefaces: ResourceCache<String, skia::Typeface>,
    images: ResourceCache<PathBuf, skia::Image>,
    text: TextShaper,
    hardware_live: Rc<Cell<usize>>,
}

impl SkiaEngine {
    /// Initialize the engine, registering every font found in `options.asset_dir`.
    pub fn load(options: EngineOptions) -> Result<Self, EngineError> {
        let font_mgr = skia::FontMgr::default();
        let typefaces = ResourceCache::new();
        let mut bundled = Vec::new();
        if let Some(dir) = &options.asset_dir {
            for tf in load_typefaces(&font_mgr, dir)? {
                bundled.push(tf.clone());
                typefaces.insert(tf.family_name(), tf);
            }
        }
        let text = TextShaper::with_typefaces(&options.default_family, &bundled);
        info!(
            "skia engine ready ({} bundled typeface(s), hardware {})",
            typefaces.len(),
            if options.hardware { "on" } else { "off" }
        );
        Ok(Self { options, font_mgr, typefaces, images: ResourceCache::new(), text, hardware_live: Rc::new(Cell::new(0)) })
    }

    pub fn options(&self) -> &EngineOptions { &self.options }

    pub fn text(&self) -> &TextShaper { &self.text }

    /// Hardware surfaces currently live across all targets.
    pub fn hardware_surfaces(&self) -> usize { self.hardware_live.get() }

    /// A bundled typeface by family name, falling back to the system font manager.
    /// System lookups are cached too.
    pub fn typeface(&self, family: &str) -> Option<Rc<skia::Typeface>> {
        if let Some(tf) = self.typefaces.get(&family.to_string()) {
            return Some(tf);
        }
        let tf = self.font_mgr.match_family_style(family, skia::FontStyle::normal())?;
        Some(self.typefaces.insert(family.to_string(), tf))
    }

    /// Font in the default family, or Skia's default typeface when it is unavailable.
    pub fn font(&self, size: f32) -> skia::Font {
        match self.typeface(&self.options.default_family) {
            Some(tf) => skia::Font::new((*tf).clone(), size),
            None => {
                let mut font = skia::Font::default();
                font.set_size(size);
                font
            }
        }
    }

    /// Decode an image file once; later calls share the decoded image.
    pub fn image(&self, path: impl AsRef<Path>) -> Result<Rc<skia::Image>, EngineError> {
        let path = path.as_ref();
        self.images.get_or_try_populate(path.to_path_buf(), || {
            let bytes = fs::read(path).map_err(|e| EngineError::Load(format!("{}: {e}", path.display())))?;
            skia::Image::from_encoded(skia::Data::new_copy(&bytes))
                .ok_or_else(|| EngineError::Load(format!("{}: not a decodable image", path.display())))
        })
    }

    pub fn clear_images(&self) { self.images.clear(); }
}

impl GraphicsEngine for SkiaEngine {
    type Target = SkiaTarget;
    type Surface = SkiaSurface;

    #[cfg_attr(not(feature = "gpu-gl"), allow(unused_variables))]
    fn make_hardware_surface(&self, target: &SkiaTarget, size: PhysicalSize) -> Result<Option<SkiaSurface>, EngineError> {
        match target {
            SkiaTarget::Raster(_) => Ok(None),
            #[cfg(feature = "gpu-gl")]
            SkiaTarget::Gl(gl) => {
                if !self.options.hardware {
                    return Ok(None);
                }
                if self.hardware_live.get() >= self.options.max_hardware_surfaces {
                    return Err(EngineError::ContextLimit);
                }
                Ok(gl
                    .make_surface(size)?
                    .map(|s| SkiaSurface::gl(s, size, gl.clone(), self.hardware_live.clone())))
            }
        }
    }

    fn make_software_surface(&self, target: &SkiaTarget, size: PhysicalSize) -> Result<Option<SkiaSurface>, EngineError> {
        let Some(buffer) = target.frame_buffer() else { return Ok(None) };
        Ok(SkiaSurface::raster(size, buffer.clone()))
    }
}

fn load_typefaces(font_mgr: &skia::FontMgr, dir: &Path) -> Result<Vec<skia::Typeface>, EngineError> {
    if !dir.is_dir() {
        return Err(EngineError::Load(format!("asset directory {} not found", dir.display())));
    }
    let entries = fs::read_dir(dir).map_err(|e| EngineError::Load(format!("{}: {e}", dir.display())))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| FONT_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut out = Vec::new();
    for path in paths {
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                warn!("skipping font {}: {e}", path.display());
                continue;
            }
        };
        match font_mgr.new_from_data(&bytes, None) {
            Some(tf) => {
                debug!("loaded typeface {} from {}", tf.family_name(), path.display());
                out.push(tf);
            }
            None => warn!("skipping font {}: not a font file", path.display()),
        }
    }
    Ok(out)
}
