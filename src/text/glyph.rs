//! Word overlay rasterization.
//!
//! A caption word is laid out as a single line, centered on the canvas, stroked with an
//! eight-direction outline and filled. Scripts are resolved through [`Locale::family`]:
//! right-to-left words are reshaped and reordered first, and each family has its own font
//! asset and size.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::assets::bitmap_font;
use crate::assets::fonts::{FontResolver, OutlineFont, ResolvedFont};
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::text::locale::{Locale, ScriptFamily};
use crate::text::reshape::prepare_display_text;

/// Outline offsets in pixels at a 1080 px wide canvas.
const OUTLINE_OFFSETS: [(f64, f64); 8] = [
    (-4.0, -4.0),
    (-4.0, 4.0),
    (4.0, -4.0),
    (4.0, 4.0),
    (0.0, 5.0),
    (0.0, -5.0),
    (5.0, 0.0),
    (-5.0, 0.0),
];

const REFERENCE_WIDTH: f64 = 1080.0;

/// Words wider than this fraction of the canvas are shrunk to fit.
///
/// The script family's size fraction is the size every word starts at. Only a single word
/// that would otherwise run off the canvas edge is drawn smaller than that.
const MAX_TEXT_WIDTH_FRACTION: f64 = 0.94;

/// Paint settings for word overlays.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GlyphStyle {
    /// Text fill color.
    pub fill: Rgba8,
    /// Outline color; `None` draws no outline.
    pub outline: Option<Rgba8>,
    /// Fixed font size as a fraction of canvas width; `None` uses the script family's size.
    pub size_fraction: Option<f64>,
}

impl GlyphStyle {
    /// Gold words with a black outline.
    pub fn caption() -> Self {
        Self {
            fill: Rgba8::rgb(0xFF, 0xD7, 0x00),
            outline: Some(Rgba8::rgb(0, 0, 0)),
            size_fraction: None,
        }
    }

    /// Small translucent white text without outline.
    pub fn watermark() -> Self {
        Self {
            fill: Rgba8::rgba(255, 255, 255, 140),
            outline: None,
            size_fraction: Some(0.05),
        }
    }

    fn size_px(&self, canvas: Canvas, family: ScriptFamily) -> f64 {
        let fraction = self
            .size_fraction
            .unwrap_or_else(|| f64::from(family.font_size_fraction()));
        (f64::from(canvas.width) * fraction).max(1.0)
    }
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self::caption()
    }
}

/// A canvas-sized overlay with one word drawn on it.
#[derive(Clone, Debug)]
pub struct GlyphBitmap {
    /// Width in pixels (canvas width).
    pub width: u32,
    /// Height in pixels (canvas height).
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl GlyphBitmap {
    /// Bounding box `(x0, y0, x1, y1)` of non-transparent pixels, exclusive on the right and
    /// bottom, or `None` for an empty overlay.
    pub fn ink_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        let w = self.width as usize;
        for (i, px) in self.rgba8_premul.chunks_exact(4).enumerate() {
            if px[3] == 0 {
                continue;
            }
            let (x, y) = ((i % w) as u32, (i / w) as u32);
            bounds = Some(match bounds {
                None => (x, y, x + 1, y + 1),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
            });
        }
        bounds
    }

    /// Whether no pixel is drawn.
    pub fn is_blank(&self) -> bool {
        self.rgba8_premul.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Write the overlay as a straight-alpha PNG.
    pub fn save_png(&self, path: &Path) -> ReelResult<()> {
        let mut straight = self.rgba8_premul.as_ref().clone();
        crate::foundation::math::unpremultiply_rgba8_in_place(&mut straight);
        let img = image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| ReelError::validation("glyph bitmap size mismatch"))?;
        img.save(path).map_err(|e| {
            ReelError::Other(anyhow::anyhow!(
                "failed to write glyph preview '{}': {e}",
                path.display()
            ))
        })
    }
}

/// Stateful helper for building Parley layouts of single caption words.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register font bytes and return the family name the layout engine knows them by.
    fn register(&mut self, font: &OutlineFont) -> ReelResult<String> {
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::validation("no font families registered from font bytes")
        })?;
        Ok(self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string())
    }

    fn layout_line(
        &mut self,
        text: &str,
        family_name: &str,
        size_px: f32,
    ) -> parley::Layout<Rgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name.to_string())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// An outline font ready for layout and rasterization.
struct LoadedFont {
    family_name: String,
    data: vello_cpu::peniko::FontData,
}

/// Rasterizes caption words into canvas-sized overlays.
///
/// One renderer serves one job: fonts are resolved and registered once per script family.
pub struct GlyphRenderer {
    canvas: Canvas,
    style: GlyphStyle,
    resolver: FontResolver,
    engine: TextLayoutEngine,
    loaded: HashMap<ScriptFamily, Option<LoadedFont>>,
}

impl GlyphRenderer {
    /// Create a renderer for `canvas` with the given fonts and style.
    pub fn new(canvas: Canvas, resolver: FontResolver, style: GlyphStyle) -> ReelResult<Self> {
        canvas.validate()?;
        Ok(Self {
            canvas,
            style,
            resolver,
            engine: TextLayoutEngine::new(),
            loaded: HashMap::new(),
        })
    }

    /// Target canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Font stage used for `family`, for logging.
    pub fn font_label(&mut self, family: ScriptFamily) -> String {
        self.resolver.resolve(family).describe()
    }

    /// Render `text` under `locale`'s script rules.
    ///
    /// Whitespace-only text yields a blank overlay.
    #[tracing::instrument(skip(self), fields(lang = %locale))]
    pub fn render(&mut self, text: &str, locale: &Locale) -> ReelResult<GlyphBitmap> {
        let (w16, h16) = self.canvas.as_u16()?;
        let family = locale.family();
        let display = prepare_display_text(text, family);
        let size_px = self.style.size_px(self.canvas, family);

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        if !text.trim().is_empty() {
            self.ensure_loaded(family);
            match self.loaded.get(&family).and_then(Option::as_ref) {
                Some(font) => {
                    draw_outline_text(
                        &mut ctx,
                        &mut self.engine,
                        font,
                        &display.text,
                        size_px,
                        self.canvas,
                        &self.style,
                    );
                }
                None => {
                    draw_bitmap_text(&mut ctx, &display.text, size_px, self.canvas, &self.style);
                }
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(GlyphBitmap {
            width: self.canvas.width,
            height: self.canvas.height,
            rgba8_premul: Arc::new(pixmap.data_as_u8_slice().to_vec()),
        })
    }

    fn ensure_loaded(&mut self, family: ScriptFamily) {
        if self.loaded.contains_key(&family) {
            return;
        }
        let loaded = match self.resolver.resolve(family) {
            ResolvedFont::Outline(font) => match self.engine.register(&font) {
                Ok(family_name) => Some(LoadedFont {
                    family_name,
                    data: vello_cpu::peniko::FontData::new(
                        vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
                        font.index,
                    ),
                }),
                Err(e) => {
                    tracing::warn!(?family, error = %e, "font rejected by layout engine, using built-in");
                    None
                }
            },
            ResolvedFont::Builtin => None,
        };
        self.loaded.insert(family, loaded);
    }
}

fn outline_offsets(canvas: Canvas) -> impl Iterator<Item = (f64, f64)> {
    let k = f64::from(canvas.width) / REFERENCE_WIDTH;
    OUTLINE_OFFSETS.iter().map(move |(dx, dy)| (dx * k, dy * k))
}

fn draw_outline_text(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextLayoutEngine,
    font: &LoadedFont,
    text: &str,
    size_px: f64,
    canvas: Canvas,
    style: &GlyphStyle,
) {
    let max_w = f64::from(canvas.width) * MAX_TEXT_WIDTH_FRACTION;
    let mut layout = engine.layout_line(text, &font.family_name, size_px as f32);
    let natural_w = f64::from(layout.width());
    if natural_w > max_w {
        let shrunk = (size_px * max_w / natural_w).max(1.0);
        layout = engine.layout_line(text, &font.family_name, shrunk as f32);
    }

    let (w, h) = (f64::from(layout.width()), f64::from(layout.height()));
    let x0 = (f64::from(canvas.width) - w) / 2.0;
    let y0 = (f64::from(canvas.height) - h) / 2.0;

    if let Some(outline) = style.outline {
        ctx.set_paint(outline.to_peniko());
        for (dx, dy) in outline_offsets(canvas) {
            paint_layout(ctx, &layout, font, x0 + dx, y0 + dy);
        }
    }
    ctx.set_paint(style.fill.to_peniko());
    paint_layout(ctx, &layout, font, x0, y0);
}

fn paint_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<Rgba8>,
    font: &LoadedFont,
    x: f64,
    y: f64,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let mut pen_x = run.offset();
            let baseline = run.baseline();
            let glyphs = run.glyphs().map(|g| {
                let glyph = vello_cpu::Glyph {
                    id: g.id,
                    x: pen_x + g.x,
                    y: baseline - g.y,
                };
                pen_x += g.advance;
                glyph
            });
            ctx.glyph_run(&font.data)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn draw_bitmap_text(
    ctx: &mut vello_cpu::RenderContext,
    text: &str,
    size_px: f64,
    canvas: Canvas,
    style: &GlyphStyle,
) {
    let max_w = f64::from(canvas.width) * MAX_TEXT_WIDTH_FRACTION;
    let mut scale = (size_px / f64::from(bitmap_font::CELL)).floor().max(1.0);
    let (natural_w, _) = bitmap_font::measure(text, scale);
    if natural_w > max_w {
        scale = (scale * max_w / natural_w).floor().max(1.0);
    }

    let (w, h) = bitmap_font::measure(text, scale);
    let x0 = ((f64::from(canvas.width) - w) / 2.0).round();
    let y0 = ((f64::from(canvas.height) - h) / 2.0).round();
    let cells = bitmap_font::lit_cells(text);

    let fill_cells = |ctx: &mut vello_cpu::RenderContext, ox: f64, oy: f64| {
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((ox, oy)));
        for &(cx, cy) in &cells {
            let x = f64::from(cx) * scale;
            let y = f64::from(cy) * scale;
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x, y, x + scale, y + scale));
        }
    };

    if let Some(outline) = style.outline {
        ctx.set_paint(outline.to_peniko());
        for (dx, dy) in outline_offsets(canvas) {
            fill_cells(ctx, x0 + dx.round(), y0 + dy.round());
        }
    }
    ctx.set_paint(style.fill.to_peniko());
    fill_cells(ctx, x0, y0);
}

#[cfg(test)]
#[path = "../../tests/unit/text/glyph.rs"]
mod tests;
