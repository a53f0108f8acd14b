use crate::font::FontManager;
use crate::text::{SimpleShaper, TextShaper};
use crate::types::Pt;
use std::path::PathBuf;
use std::sync::Arc;

pub const FONT_DIR_ENV: &str = "BOXLAYOUT_FONT_DIR";

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub default_font_family: String,
    pub default_font_size: Pt,
    pub font_dirs: Vec<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_font_family: "Serif".to_string(),
            default_font_size: Pt::from_i32(12),
            font_dirs: Vec::new(),
        }
    }
}

impl LayoutConfig {
    /// Defaults plus any directories listed in `BOXLAYOUT_FONT_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(extra) = std::env::var(FONT_DIR_ENV) {
            for path in std::env::split_paths(&extra) {
                if !path.as_os_str().is_empty() {
                    config.font_dirs.push(path);
                }
            }
        }
        config
    }

    pub fn with_default_font_family(mut self, family: impl Into<String>) -> Self {
        self.default_font_family = family.into();
        self
    }

    pub fn with_default_font_size(mut self, size: Pt) -> Self {
        self.default_font_size = size;
        self
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }
}

/// Services shared by every measure and render call.
#[derive(Debug)]
pub struct LayoutContext {
    config: LayoutConfig,
    fonts: FontManager,
    shaper: Arc<dyn TextShaper>,
}

impl LayoutContext {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        let fonts = FontManager::new(config.font_dirs.clone());
        Self {
            config,
            fonts,
            shaper: Arc::new(SimpleShaper),
        }
    }

    pub fn with_shaper(mut self, shaper: Arc<dyn TextShaper>) -> Self {
        self.shaper = shaper;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontManager {
        &mut self.fonts
    }

    pub fn shaper(&self) -> &dyn TextShaper {
        self.shaper.as_ref()
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::new()
    }
}
