use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// One composited output frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame for `canvas`.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.frame_len()],
            premultiplied: true,
        }
    }
}

/// Wrap premultiplied RGBA8 bytes in a `vello_cpu` pixmap.
pub(crate) fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::validation(format!(
            "image byte length {} does not match {width}x{height}",
            rgba8_premul.len()
        )));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

/// Image paint over premultiplied RGBA8 bytes.
pub(crate) fn image_paint(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Image> {
    let pixmap = premul_bytes_to_pixmap(rgba8_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Premultiply straight-alpha bytes decoded from `ffmpeg`.
///
/// Decoded video is opaque, so this is a no-op for almost every frame.
pub(crate) fn premultiply_decoded(rgba: &mut [u8]) {
    if rgba.chunks_exact(4).all(|px| px[3] == 255) {
        return;
    }
    crate::foundation::math::premultiply_rgba8_in_place(rgba);
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
