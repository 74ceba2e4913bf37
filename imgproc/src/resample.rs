//! Applies a coordinate map to a raster with bilinear interpolation.

use image::{ImageBuffer, Pixel};
use rayon::prelude::*;

use defish_core::CoordinateMap;

use crate::{Error, Result};

/// Value written to every channel of an invalid output pixel.
const BACKGROUND: u8 = 0;

/// Resample `src` through `map`, producing the corrected raster.
///
/// Output dimensions are the map's canvas size. Valid map entries are
/// sampled with bilinear interpolation, each channel independently;
/// invalid entries (lens field overrun, padded border) become background.
/// Fails with `DimensionMismatch` if `src` is not the raster size the map
/// was built for.
pub fn remap_with_map<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    map: &CoordinateMap,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    if (src.width(), src.height()) != (map.src_width(), map.src_height()) {
        return Err(Error::DimensionMismatch {
            expected: (map.src_width(), map.src_height()),
            actual: (src.width(), src.height()),
        });
    }

    let channels = P::CHANNEL_COUNT as usize;
    let out_w = map.width() as usize;
    let src_raw: &[u8] = src.as_raw();
    let src_w = src.width() as usize;
    let src_h = src.height() as usize;
    let (map_x, map_y) = map.planes();

    let mut dst: ImageBuffer<P, Vec<u8>> = ImageBuffer::new(map.width(), map.height());
    let dst_raw: &mut [u8] = &mut dst;

    dst_raw
        .par_chunks_mut(out_w * channels)
        .enumerate()
        .for_each(|(y, row)| {
            let base = y * out_w;
            for x in 0..out_w {
                let sx = map_x[base + x];
                let px = &mut row[x * channels..(x + 1) * channels];
                if sx.is_nan() {
                    px.fill(BACKGROUND);
                    continue;
                }
                let sy = map_y[base + x];
                sample_bilinear(src_raw, src_w, src_h, channels, sx, sy, px);
            }
        });

    Ok(dst)
}

/// Bilinear interpolation of the four nearest source pixels, one channel
/// at a time. Map entries are in-bounds by construction; the +1 neighbor
/// clamps at the far edge.
fn sample_bilinear(src: &[u8], width: usize, height: usize, channels: usize, x: f32, y: f32, out: &mut [u8]) {
    let x0 = (x.floor() as usize).min(width - 1);
    let y0 = (y.floor() as usize).min(height - 1);
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let i00 = (y0 * width + x0) * channels;
    let i10 = (y0 * width + x1) * channels;
    let i01 = (y1 * width + x0) * channels;
    let i11 = (y1 * width + x1) * channels;

    for c in 0..channels {
        let v00 = src[i00 + c] as f32;
        let v10 = src[i10 + c] as f32;
        let v01 = src[i01 + c] as f32;
        let v11 = src[i11 + c] as f32;

        let v0 = v00 * (1.0 - fx) + v10 * fx;
        let v1 = v01 * (1.0 - fx) + v11 * fx;

        out[c] = (v0 * (1.0 - fy) + v1 * fy).clamp(0.0, 255.0) as u8;
    }
}
