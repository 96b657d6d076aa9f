pub(crate) mod glyph;
pub(crate) mod locale;
pub(crate) mod reshape;
