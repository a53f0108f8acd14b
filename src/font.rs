use crate::error::{LayoutError, Result};
use crate::types::Pt;
use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const FALLBACK_ADVANCE_EM_MILLI: i64 = 600;
const FALLBACK_ASCENT_EM_MILLI: i64 = 800;
const FALLBACK_LINE_HEIGHT_EM_MILLI: i64 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Plain,
    Bold,
}

impl FontStyle {
    pub fn from_bold(bold: bool) -> Self {
        if bold { FontStyle::Bold } else { FontStyle::Plain }
    }
}

/// A sized font face.
///
/// Without face bytes the typeface still measures, using fixed em-based
/// approximations, so layout works on hosts with no usable fonts.
#[derive(Debug, Clone)]
pub struct Typeface {
    family: String,
    style: FontStyle,
    size: Pt,
    data: Option<Arc<Vec<u8>>>,
}

impl Typeface {
    pub fn new(family: impl Into<String>, style: FontStyle, size: Pt) -> Self {
        Self {
            family: family.into(),
            style,
            size,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Arc<Vec<u8>>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn size(&self) -> Pt {
        self.size
    }

    pub fn data(&self) -> Option<&Arc<Vec<u8>>> {
        self.data.as_ref()
    }

    /// Name recorded in font commands; `FontManager::face_bytes_for_name`
    /// resolves it back to face bytes.
    pub fn font_name(&self) -> String {
        match self.style {
            FontStyle::Plain => self.family.clone(),
            FontStyle::Bold => format!("{} Bold", self.family),
        }
    }

    pub fn measure_text(&self, text: &str) -> Pt {
        if text.is_empty() {
            return Pt::ZERO;
        }
        if let Some(width) = self
            .data
            .as_deref()
            .and_then(|data| shaped_width(data, self.size, text))
        {
            return width;
        }
        let chars = text.chars().count() as i64;
        em_fraction(self.size, FALLBACK_ADVANCE_EM_MILLI * chars)
    }

    pub fn ascent(&self) -> Pt {
        match self.vertical_metrics() {
            Some((ascender, _, _, units_per_em)) => scale_units(self.size, ascender, units_per_em),
            None => em_fraction(self.size, FALLBACK_ASCENT_EM_MILLI),
        }
    }

    pub fn line_height(&self) -> Pt {
        match self.vertical_metrics() {
            Some((ascender, descender, gap, units_per_em)) => {
                let total = ascender - descender + gap;
                scale_units(self.size, total.max(0), units_per_em)
            }
            None => em_fraction(self.size, FALLBACK_LINE_HEIGHT_EM_MILLI),
        }
    }

    fn vertical_metrics(&self) -> Option<(i64, i64, i64, i64)> {
        let data = self.data.as_deref()?;
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        Some((
            face.ascender() as i64,
            face.descender() as i64,
            face.line_gap() as i64,
            face.units_per_em().max(1) as i64,
        ))
    }
}

fn em_fraction(size: Pt, milli_em: i64) -> Pt {
    Pt::from_milli_i64(div_round(size.to_milli_i64() * milli_em, 1000))
}

fn scale_units(size: Pt, units: i64, units_per_em: i64) -> Pt {
    Pt::from_milli_i64(div_round(size.to_milli_i64() * units, units_per_em.max(1)))
}

fn div_round(num: i64, den: i64) -> i64 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

fn shaped_width(data: &[u8], size: Pt, text: &str) -> Option<Pt> {
    let face = HbFace::from_slice(data, 0)?;
    let units_per_em = face.units_per_em().max(1) as i64;

    let mut buffer = UnicodeBuffer::new();
    buffer.set_direction(detect_direction(text));
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);
    let positions = output.glyph_positions();
    if positions.is_empty() {
        return None;
    }
    let total_units: i64 = positions.iter().map(|pos| pos.x_advance as i64).sum();
    if total_units <= 0 {
        return Some(Pt::ZERO);
    }
    Some(scale_units(size, total_units, units_per_em))
}

pub(crate) fn detect_direction(text: &str) -> HbDirection {
    for ch in text.chars() {
        let code = ch as u32;
        let rtl = matches!(
            code,
            0x0590..=0x08FF
                | 0xFB1D..=0xFDFF
                | 0xFE70..=0xFEFF
                | 0x1EE00..=0x1EEFF
        );
        if rtl {
            return HbDirection::RightToLeft;
        }
    }
    HbDirection::LeftToRight
}

type FaceKey = (String, FontStyle);

/// Registered faces plus a lazily filled cache of platform faces.
#[derive(Debug, Default)]
pub struct FontManager {
    dirs: Vec<PathBuf>,
    registered: HashMap<FaceKey, Arc<Vec<u8>>>,
    system_cache: Mutex<HashMap<FaceKey, Option<Arc<Vec<u8>>>>>,
}

impl FontManager {
    /// `extra_dirs` are searched before the platform font directories.
    pub fn new(extra_dirs: Vec<PathBuf>) -> Self {
        let mut dirs = extra_dirs;
        dirs.extend(system_font_dirs());
        Self {
            dirs,
            registered: HashMap::new(),
            system_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Registers face bytes under `family`. The style slot is taken from the
    /// face's own bold flag.
    pub fn register_font(&mut self, family: &str, data: Vec<u8>) -> Result<()> {
        let style = {
            let face = ttf_parser::Face::parse(&data, 0)
                .map_err(|err| LayoutError::resource(family, err.to_string()))?;
            FontStyle::from_bold(face.is_bold())
        };
        let key = (normalize_name(family), style);
        log::debug!("registered font '{}' ({:?})", family, style);
        self.registered.insert(key, Arc::new(data));
        Ok(())
    }

    pub fn is_registered(&self, family: &str) -> bool {
        let name = normalize_name(family);
        self.registered.keys().any(|(registered, _)| *registered == name)
    }

    /// Returns a registered face, else a platform face located by family
    /// name, else `None`.
    pub fn get_font(&self, family: &str, style: FontStyle, size: Pt) -> Option<Typeface> {
        let data = self
            .registered_bytes(family, style)
            .or_else(|| self.system_bytes(family, style))?;
        Some(Typeface::new(family, style, size).with_data(data))
    }

    /// Resolves a name produced by `Typeface::font_name`.
    pub fn face_bytes_for_name(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        let trimmed = name.trim();
        let (family, style) = match trimmed.strip_suffix(" Bold") {
            Some(family) => (family, FontStyle::Bold),
            None => (trimmed, FontStyle::Plain),
        };
        self.registered_bytes(family, style)
            .or_else(|| self.system_bytes(family, style))
    }

    fn registered_bytes(&self, family: &str, style: FontStyle) -> Option<Arc<Vec<u8>>> {
        let name = normalize_name(family);
        self.registered
            .get(&(name.clone(), style))
            .or_else(|| self.registered.get(&(name, FontStyle::Plain)))
            .cloned()
    }

    fn system_bytes(&self, family: &str, style: FontStyle) -> Option<Arc<Vec<u8>>> {
        let key = (normalize_name(family), style);
        if key.0.is_empty() {
            return None;
        }
        if let Ok(cache) = self.system_cache.lock() {
            if let Some(entry) = cache.get(&key) {
                return entry.clone();
            }
        }
        let loaded = load_from_candidates(&self.dirs, &key.0, style);
        if loaded.is_none() {
            log::debug!("no platform face found for '{}' ({:?})", family, style);
        }
        if let Ok(mut cache) = self.system_cache.lock() {
            cache.insert(key, loaded.clone());
        }
        loaded
    }
}

fn load_from_candidates(dirs: &[PathBuf], family: &str, style: FontStyle) -> Option<Arc<Vec<u8>>> {
    let candidates = font_file_candidates(family, style);
    for dir in dirs {
        for search_dir in std::iter::once(dir.clone()).chain(subdirectories(dir)) {
            for file_name in &candidates {
                if let Some(bytes) = read_face(&search_dir.join(file_name)) {
                    return Some(bytes);
                }
            }
        }
    }
    None
}

fn read_face(path: &Path) -> Option<Arc<Vec<u8>>> {
    let bytes = std::fs::read(path).ok()?;
    ttf_parser::Face::parse(&bytes, 0).ok()?;
    Some(Arc::new(bytes))
}

// Linux distributions nest faces one or two levels below the font root.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Ok(nested) = std::fs::read_dir(&path) {
            for child in nested.flatten() {
                let child_path = child.path();
                if child_path.is_dir() {
                    out.push(child_path);
                }
            }
        }
        out.push(path);
    }
    out
}

fn font_file_candidates(family: &str, style: FontStyle) -> Vec<String> {
    let (regular, bold): (&[&str], &[&str]) = match family {
        "serif" | "times" | "times new roman" => (
            &["times.ttf", "LiberationSerif-Regular.ttf", "DejaVuSerif.ttf"],
            &["timesbd.ttf", "LiberationSerif-Bold.ttf", "DejaVuSerif-Bold.ttf"],
        ),
        "sans" | "sans-serif" | "sansserif" | "helvetica" | "arial" => (
            &["arial.ttf", "LiberationSans-Regular.ttf", "DejaVuSans.ttf"],
            &["arialbd.ttf", "LiberationSans-Bold.ttf", "DejaVuSans-Bold.ttf"],
        ),
        "monospace" | "monospaced" | "courier" | "courier new" => (
            &["cour.ttf", "LiberationMono-Regular.ttf", "DejaVuSansMono.ttf"],
            &["courbd.ttf", "LiberationMono-Bold.ttf", "DejaVuSansMono-Bold.ttf"],
        ),
        _ => (&[], &[]),
    };

    let mut out: Vec<String> = Vec::new();
    if style == FontStyle::Bold {
        out.extend(bold.iter().map(|name| name.to_string()));
    }
    out.extend(regular.iter().map(|name| name.to_string()));

    let compact: String = family
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("");
    if !compact.is_empty() {
        if style == FontStyle::Bold {
            out.push(format!("{compact}-Bold.ttf"));
            out.push(format!("{compact}Bold.ttf"));
        }
        out.push(format!("{compact}-Regular.ttf"));
        out.push(format!("{compact}.ttf"));
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    dirs
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_metrics_scale_with_size() {
        let face = Typeface::new("Nowhere", FontStyle::Plain, Pt::from_i32(10));
        assert_eq!(face.measure_text("abc"), Pt::from_i32(18));
        assert_eq!(face.measure_text(""), Pt::ZERO);
        assert_eq!(face.line_height(), Pt::from_i32(12));
        assert_eq!(face.ascent(), Pt::from_i32(8));
    }

    #[test]
    fn bold_font_name_carries_the_trait() {
        let face = Typeface::new("Serif", FontStyle::Bold, Pt::from_i32(12));
        assert_eq!(face.font_name(), "Serif Bold");
        assert_eq!(
            Typeface::new("Serif", FontStyle::Plain, Pt::from_i32(12)).font_name(),
            "Serif"
        );
    }

    #[test]
    fn registering_garbage_is_a_resource_error() {
        let mut fonts = FontManager::default();
        let err = fonts
            .register_font("Broken", vec![0, 1, 2, 3])
            .expect_err("not a font");
        assert!(matches!(err, LayoutError::Resource { ref source_id, .. } if source_id == "Broken"));
        assert!(!fonts.is_registered("Broken"));
    }

    #[test]
    fn unknown_family_without_dirs_is_none() {
        let fonts = FontManager::default();
        assert!(
            fonts
                .get_font("Definitely Not A Font", FontStyle::Plain, Pt::from_i32(12))
                .is_none()
        );
    }

    #[test]
    fn bold_candidates_come_first() {
        let names = font_file_candidates("serif", FontStyle::Bold);
        assert_eq!(names.first().map(String::as_str), Some("timesbd.ttf"));
        assert!(names.iter().any(|n| n == "Serif.ttf"));
    }
}
