pub(crate) mod bitmap_font;
pub(crate) mod fonts;
pub(crate) mod media;
