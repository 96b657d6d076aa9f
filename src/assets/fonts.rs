use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::FontLoadError;
use crate::text::locale::ScriptFamily;

/// Script-specific font assets, one optional file per script family.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontSet {
    /// Font for Latin-family captions.
    pub latin: Option<PathBuf>,
    /// Font for right-to-left captions (must cover Arabic presentation forms).
    pub rtl: Option<PathBuf>,
    /// Font for CJK captions.
    pub cjk: Option<PathBuf>,
}

impl FontSet {
    /// Conventional asset layout: `{dir}/THEBOLDFONT-FREEVERSION.ttf`,
    /// `{dir}/NotoSansArabic-Bold.ttf`, `{dir}/NotoSansJP-Bold.ttf`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            latin: Some(dir.join("THEBOLDFONT-FREEVERSION.ttf")),
            rtl: Some(dir.join("NotoSansArabic-Bold.ttf")),
            cjk: Some(dir.join("NotoSansJP-Bold.ttf")),
        }
    }

    /// Font path configured for `family`.
    pub fn path_for(&self, family: ScriptFamily) -> Option<&Path> {
        match family {
            ScriptFamily::Latin => self.latin.as_deref(),
            ScriptFamily::RightToLeft => self.rtl.as_deref(),
            ScriptFamily::Cjk => self.cjk.as_deref(),
        }
    }
}

/// Where a resolved outline font came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontOrigin {
    /// The script-specific font asset.
    ScriptAsset(PathBuf),
    /// A generic font from the system font database.
    System(String),
}

/// Raw outline font data validated by the font database.
#[derive(Clone)]
pub struct OutlineFont {
    /// Font file bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection.
    pub index: u32,
    /// Where the bytes came from.
    pub origin: FontOrigin,
}

impl std::fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFont")
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Final outcome of the fallback chain.
#[derive(Clone, Debug)]
pub enum ResolvedFont {
    /// A scalable font (script asset or system font).
    Outline(OutlineFont),
    /// The built-in bitmap font; always available.
    Builtin,
}

impl ResolvedFont {
    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            ResolvedFont::Outline(f) => match &f.origin {
                FontOrigin::ScriptAsset(p) => format!("asset:{}", p.display()),
                FontOrigin::System(name) => format!("system:{name}"),
            },
            ResolvedFont::Builtin => "builtin:8x8".to_string(),
        }
    }
}

/// Resolves a font per script family through the chain
/// script asset → generic system font → built-in bitmap font.
///
/// Results are cached per family; the system font database is loaded lazily, once.
pub struct FontResolver {
    fonts: FontSet,
    use_system_fonts: bool,
    system_db: Option<Arc<usvg::fontdb::Database>>,
    cache: HashMap<ScriptFamily, ResolvedFont>,
}

impl FontResolver {
    /// Create a resolver over the given script font assets.
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts,
            use_system_fonts: true,
            system_db: None,
            cache: HashMap::new(),
        }
    }

    /// Disable the system font stage (deterministic output for tests and previews).
    pub fn without_system_fonts(mut self) -> Self {
        self.use_system_fonts = false;
        self
    }

    /// Resolve a font for `family`. Never fails: the last stage is the built-in font.
    pub fn resolve(&mut self, family: ScriptFamily) -> ResolvedFont {
        if let Some(hit) = self.cache.get(&family) {
            return hit.clone();
        }

        let resolved = match self.load_script_asset(family) {
            Ok(font) => ResolvedFont::Outline(font),
            Err(e) => {
                tracing::debug!(?family, error = %e, "script font unavailable, trying system font");
                match self.load_system_font(family) {
                    Ok(font) => ResolvedFont::Outline(font),
                    Err(e) => {
                        tracing::debug!(?family, error = %e, "system font unavailable, using built-in");
                        ResolvedFont::Builtin
                    }
                }
            }
        };
        tracing::debug!(?family, font = %resolved.describe(), "resolved caption font");
        self.cache.insert(family, resolved.clone());
        resolved
    }

    fn load_script_asset(&self, family: ScriptFamily) -> Result<OutlineFont, FontLoadError> {
        let path = self
            .fonts
            .path_for(family)
            .ok_or_else(|| FontLoadError::Invalid {
                source_name: format!("{family:?}"),
                reason: "no font configured for script".to_string(),
            })?;
        load_font_file(path)
    }

    fn load_system_font(&mut self, family: ScriptFamily) -> Result<OutlineFont, FontLoadError> {
        let families = system_family_names(family);
        if !self.use_system_fonts {
            return Err(FontLoadError::NoSystemFont {
                families: families.iter().map(|s| s.to_string()).collect(),
            });
        }
        let db = self
            .system_db
            .get_or_insert_with(|| {
                let mut db = usvg::fontdb::Database::new();
                db.load_system_fonts();
                Arc::new(db)
            })
            .clone();
        query_system_font(&db, &families)
    }
}

/// Read and validate one font file.
pub fn load_font_file(path: &Path) -> Result<OutlineFont, FontLoadError> {
    if !path.is_file() {
        return Err(FontLoadError::Missing {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| FontLoadError::Invalid {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut probe = usvg::fontdb::Database::new();
    probe.load_font_data(bytes.clone());
    let index = probe
        .faces()
        .next()
        .map(|face| face.index)
        .ok_or_else(|| FontLoadError::Invalid {
            source_name: path.display().to_string(),
            reason: "file contains no parsable font faces".to_string(),
        })?;

    Ok(OutlineFont {
        bytes: Arc::new(bytes),
        index,
        origin: FontOrigin::ScriptAsset(path.to_path_buf()),
    })
}

fn system_family_names(family: ScriptFamily) -> Vec<&'static str> {
    let mut names = match family {
        ScriptFamily::Latin => vec![],
        ScriptFamily::RightToLeft => vec!["Noto Sans Arabic", "DejaVu Sans"],
        ScriptFamily::Cjk => vec!["Noto Sans CJK JP", "Noto Sans JP", "Source Han Sans"],
    };
    names.push("Arial");
    names
}

fn query_system_font(
    db: &usvg::fontdb::Database,
    names: &[&str],
) -> Result<OutlineFont, FontLoadError> {
    let mut families: Vec<usvg::fontdb::Family<'_>> = names
        .iter()
        .map(|n| usvg::fontdb::Family::Name(*n))
        .collect();
    families.push(usvg::fontdb::Family::SansSerif);

    let query = usvg::fontdb::Query {
        families: &families,
        weight: usvg::fontdb::Weight::BOLD,
        ..Default::default()
    };
    let not_found = || FontLoadError::NoSystemFont {
        families: names.iter().map(|s| s.to_string()).collect(),
    };
    let id = db.query(&query).ok_or_else(not_found)?;
    let family_name = db
        .face(id)
        .and_then(|face| face.families.first().map(|(name, _)| name.clone()))
        .unwrap_or_else(|| "sans-serif".to_string());
    let (bytes, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(not_found)?;

    Ok(OutlineFont {
        bytes: Arc::new(bytes),
        index,
        origin: FontOrigin::System(family_name),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
