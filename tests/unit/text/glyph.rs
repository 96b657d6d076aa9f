use super::*;
use crate::assets::fonts::FontSet;

fn small_canvas() -> Canvas {
    Canvas {
        width: 360,
        height: 640,
    }
}

fn builtin_renderer(style: GlyphStyle) -> GlyphRenderer {
    let resolver = FontResolver::new(FontSet::default()).without_system_fonts();
    GlyphRenderer::new(small_canvas(), resolver, style).unwrap()
}

fn center_of(bounds: (u32, u32, u32, u32)) -> (f64, f64) {
    let (x0, y0, x1, y1) = bounds;
    (
        (f64::from(x0) + f64::from(x1)) / 2.0,
        (f64::from(y0) + f64::from(y1)) / 2.0,
    )
}

#[test]
fn overlay_is_canvas_sized_and_mostly_transparent() {
    let mut r = builtin_renderer(GlyphStyle::caption());
    let bmp = r.render("HELLO", &Locale::english()).unwrap();
    assert_eq!((bmp.width, bmp.height), (360, 640));
    assert_eq!(bmp.rgba8_premul.len(), 360 * 640 * 4);
    assert!(!bmp.is_blank());
    // corners stay transparent
    assert_eq!(&bmp.rgba8_premul[0..4], &[0, 0, 0, 0]);
}

#[test]
fn word_is_centered() {
    let mut r = builtin_renderer(GlyphStyle::caption());
    let bmp = r.render("WORD", &Locale::english()).unwrap();
    let (cx, cy) = center_of(bmp.ink_bounds().unwrap());
    assert!((cx - 180.0).abs() <= 6.0, "cx = {cx}");
    assert!((cy - 320.0).abs() <= 6.0, "cy = {cy}");
}

#[test]
fn rtl_changes_ordering_but_not_geometry() {
    let word = "\u{0645}\u{0631}\u{062D}\u{0628}\u{0627}";
    let mut r = builtin_renderer(GlyphStyle {
        size_fraction: Some(0.10),
        ..GlyphStyle::caption()
    });
    let ltr = r.render(word, &Locale::english()).unwrap();
    let rtl = r.render(word, &Locale::new("ar").unwrap()).unwrap();

    assert_eq!((ltr.width, ltr.height), (rtl.width, rtl.height));
    let a = ltr.ink_bounds().unwrap();
    let b = rtl.ink_bounds().unwrap();
    let (ca, cb) = (center_of(a), center_of(b));
    assert!((ca.0 - cb.0).abs() <= 1.0 && (ca.1 - cb.1).abs() <= 1.0);
}

#[test]
fn blank_text_renders_nothing() {
    let mut r = builtin_renderer(GlyphStyle::caption());
    let bmp = r.render("   ", &Locale::english()).unwrap();
    assert!(bmp.is_blank());
    assert!(bmp.ink_bounds().is_none());
}

#[test]
fn caption_fill_is_gold_and_outline_black() {
    let mut r = builtin_renderer(GlyphStyle::caption());
    let bmp = r.render("I", &Locale::english()).unwrap();
    let px: Vec<&[u8]> = bmp.rgba8_premul.chunks_exact(4).collect();
    assert!(px.iter().any(|p| *p == [0xFF, 0xD7, 0x00, 0xFF]));
    assert!(px.iter().any(|p| *p == [0, 0, 0, 0xFF]));
}

#[test]
fn watermark_is_smaller_and_translucent() {
    let mut caption = builtin_renderer(GlyphStyle::caption());
    let mut mark = builtin_renderer(GlyphStyle::watermark());
    let big = caption.render("BRAND", &Locale::english()).unwrap();
    let small = mark.render("BRAND", &Locale::english()).unwrap();

    let (bx0, _, bx1, _) = big.ink_bounds().unwrap();
    let (sx0, _, sx1, _) = small.ink_bounds().unwrap();
    assert!(sx1 - sx0 < bx1 - bx0);
    assert!(small.rgba8_premul.chunks_exact(4).all(|p| p[3] == 0 || (130..=150).contains(&p[3])));
}

#[test]
fn long_words_are_shrunk_to_fit() {
    let mut r = builtin_renderer(GlyphStyle::caption());
    let bmp = r
        .render("INTERNATIONALIZATION", &Locale::english())
        .unwrap();
    let (x0, _, x1, _) = bmp.ink_bounds().unwrap();
    assert!(x0 > 0 && x1 < 360);
}

#[test]
fn rendering_is_deterministic() {
    let mut r = builtin_renderer(GlyphStyle::caption());
    let a = r.render("SAME", &Locale::english()).unwrap();
    let b = r.render("SAME", &Locale::english()).unwrap();
    assert_eq!(a.rgba8_premul, b.rgba8_premul);
}

#[test]
fn png_preview_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glyph.png");
    let mut r = builtin_renderer(GlyphStyle::caption());
    r.render("OK", &Locale::english())
        .unwrap()
        .save_png(&path)
        .unwrap();
    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), (360, 640));
}

const SYSTEM_TTF_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
];

fn outline_canvas() -> Canvas {
    Canvas {
        width: 540,
        height: 960,
    }
}

/// Renderer backed by an outline font for Latin and RTL words, or `None` when no
/// suitable system TTF is installed.
fn outline_renderer(style: GlyphStyle) -> Option<GlyphRenderer> {
    let path = SYSTEM_TTF_CANDIDATES
        .iter()
        .map(std::path::PathBuf::from)
        .find(|p| p.is_file())?;
    let fonts = FontSet {
        latin: Some(path.clone()),
        rtl: Some(path),
        cjk: None,
    };
    let resolver = FontResolver::new(fonts).without_system_fonts();
    let mut r = GlyphRenderer::new(outline_canvas(), resolver, style).unwrap();
    assert!(r.font_label(ScriptFamily::Latin).starts_with("asset:"));
    Some(r)
}

#[test]
fn outline_font_word_is_centered() {
    let Some(mut r) = outline_renderer(GlyphStyle::caption()) else {
        eprintln!("skipping: no DejaVuSans.ttf installed");
        return;
    };
    let bmp = r.render("WORD", &Locale::english()).unwrap();
    let (cx, cy) = center_of(bmp.ink_bounds().unwrap());
    assert!((cx - 270.0).abs() <= 8.0, "cx = {cx}");
    assert!((cy - 480.0).abs() <= 12.0, "cy = {cy}");
}

#[test]
fn outline_font_rtl_word_is_centered() {
    let Some(mut r) = outline_renderer(GlyphStyle::caption()) else {
        eprintln!("skipping: no DejaVuSans.ttf installed");
        return;
    };
    let bmp = r
        .render("\u{0645}\u{0631}\u{062D}\u{0628}\u{0627}", &Locale::new("ar").unwrap())
        .unwrap();
    let (cx, cy) = center_of(bmp.ink_bounds().unwrap());
    assert!((cx - 270.0).abs() <= 8.0, "cx = {cx}");
    assert!((cy - 480.0).abs() <= 24.0, "cy = {cy}");
}

#[test]
fn outline_font_fill_is_gold_and_outline_black() {
    let Some(mut r) = outline_renderer(GlyphStyle::caption()) else {
        eprintln!("skipping: no DejaVuSans.ttf installed");
        return;
    };
    let bmp = r.render("HELLO", &Locale::english()).unwrap();
    let px: Vec<&[u8]> = bmp.rgba8_premul.chunks_exact(4).collect();
    let gold = px.iter().filter(|p| **p == [0xFF, 0xD7, 0x00, 0xFF]).count();
    let black = px.iter().filter(|p| **p == [0, 0, 0, 0xFF]).count();
    assert!(gold > 100, "gold pixels = {gold}");
    assert!(black > 100, "black pixels = {black}");
    assert_eq!(&bmp.rgba8_premul[0..4], &[0, 0, 0, 0]);
}

#[test]
fn outline_font_long_word_is_shrunk_to_fit() {
    let Some(mut r) = outline_renderer(GlyphStyle::caption()) else {
        eprintln!("skipping: no DejaVuSans.ttf installed");
        return;
    };
    let bmp = r
        .render("INTERNATIONALIZATION", &Locale::english())
        .unwrap();
    let (x0, _, x1, _) = bmp.ink_bounds().unwrap();
    let ink_w = f64::from(x1 - x0);
    let max_w = 540.0 * MAX_TEXT_WIDTH_FRACTION;
    assert!(x0 > 0 && x1 < 540);
    assert!(ink_w <= max_w + 8.0, "ink width = {ink_w}");
    assert!(ink_w >= 0.8 * 540.0, "ink width = {ink_w}");
}
