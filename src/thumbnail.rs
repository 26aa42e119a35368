use anyhow::{Context, Result};
use fast_image_resize::{images::Image, ResizeOptions, Resizer};
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

/// Bounding box for picker grid thumbnails
pub const THUMB_WIDTH: u32 = 280;
pub const THUMB_HEIGHT: u32 = 200;

/// Decoded, scaled image plus bookkeeping for the thumbnail cache.
#[derive(Debug, Clone)]
pub struct CachedThumbnail {
    pub image: Arc<RgbaImage>,
    /// Creation time, ms since the epoch
    pub timestamp: u64,
    /// Updated on every cache hit
    pub last_accessed: u64,
}

impl CachedThumbnail {
    pub fn new(image: RgbaImage, now: u64) -> Self {
        Self {
            image: Arc::new(image),
            timestamp: now,
            last_accessed: now,
        }
    }
}

/// Calculate dimensions that fit within bounds while maintaining aspect ratio
pub fn fit_dimensions(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (max_w.max(1), max_h.max(1));
    }
    let ratio_w = max_w as f32 / src_w as f32;
    let ratio_h = max_h as f32 / src_h as f32;
    let ratio = ratio_w.min(ratio_h);

    let dst_w = (src_w as f32 * ratio).round() as u32;
    let dst_h = (src_h as f32 * ratio).round() as u32;

    (dst_w.max(1), dst_h.max(1))
}

/// Decode `source_path` and scale it into the thumbnail box. Blocking.
pub fn build_thumbnail(source_path: &Path) -> Result<RgbaImage> {
    let src_image = image::open(source_path)
        .with_context(|| format!("Failed to open image: {}", source_path.display()))?;

    let src_rgba = src_image.to_rgba8();
    let (src_width, src_height) = (src_rgba.width(), src_rgba.height());
    let (dst_width, dst_height) =
        fit_dimensions(src_width, src_height, THUMB_WIDTH, THUMB_HEIGHT);

    if (dst_width, dst_height) == (src_width, src_height) {
        return Ok(src_rgba);
    }

    let src_fir = Image::from_vec_u8(
        src_width,
        src_height,
        src_rgba.into_raw(),
        fast_image_resize::PixelType::U8x4,
    )?;

    let mut dst_fir = Image::new(dst_width, dst_height, fast_image_resize::PixelType::U8x4);

    let mut resizer = Resizer::new();
    resizer.resize(
        &src_fir,
        &mut dst_fir,
        &ResizeOptions::new().resize_alg(fast_image_resize::ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        )),
    )?;

    RgbaImage::from_raw(dst_width, dst_height, dst_fir.into_vec())
        .context("Failed to create output image")
}

/// [`build_thumbnail`] on the blocking pool.
pub async fn load_thumbnail(source_path: &Path) -> Result<RgbaImage> {
    let path = source_path.to_path_buf();
    tokio::task::spawn_blocking(move || build_thumbnail(&path))
        .await
        .context("Thumbnail task panicked")?
}
