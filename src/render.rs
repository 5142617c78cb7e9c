//! Heatmap rendering: upsample, colorize, blend, encode
//!
//! Takes the low-resolution activation map, bilinearly upsamples it to the
//! input image's resolution, maps intensity through a jet-style cool→hot
//! gradient, alpha-blends it over the original, and encodes the result as
//! PNG bytes.

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array2;
use serde::{Serialize, Serializer};

use crate::cam::ActivationMap;
use crate::error::{ExplainError, Result};
use crate::network::ImageTensor;

/// Default overlay transparency, matching the service's historical setting.
pub const DEFAULT_ALPHA: f32 = 0.6;

/// Encoded overlay image, same extent as the original input.
///
/// Owned solely by the caller after return; serializes as a base64 string
/// for embedding in JSON payloads and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heatmap {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl Heatmap {
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Serialize for Heatmap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(&self.png))
    }
}

/// Renders activation maps onto their source images.
pub struct HeatmapRenderer;

impl HeatmapRenderer {
    /// Overlay `map` onto `original` with transparency `alpha`.
    ///
    /// `alpha = 0` reproduces the original image (within encoding
    /// rounding); `alpha = 1` shows the colorized map alone.
    pub fn render(map: &ActivationMap, original: &ImageTensor, alpha: f32) -> Result<Heatmap> {
        let alpha = alpha.clamp(0.0, 1.0);
        let (height, width) = (original.height(), original.width());
        let upsampled = resize_bilinear(map.data(), height, width);

        let mut img = RgbImage::new(width as u32, height as u32);
        for y in 0..height {
            for x in 0..width {
                let [hr, hg, hb] = jet(upsampled[[y, x]]);
                let [or, og, ob] = original_rgb(original, y, x);
                img.put_pixel(
                    x as u32,
                    y as u32,
                    Rgb([
                        blend(or, hr, alpha),
                        blend(og, hg, alpha),
                        blend(ob, hb, alpha),
                    ]),
                );
            }
        }

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExplainError::HeatmapEncoding(e.to_string()))?;

        Ok(Heatmap { png, width: width as u32, height: height as u32 })
    }
}

fn blend(original: u8, colorized: u8, alpha: f32) -> u8 {
    ((1.0 - alpha) * original as f32 + alpha * colorized as f32).round() as u8
}

/// Original pixel as RGB bytes; grayscale inputs are replicated across
/// channels, as the source service did.
fn original_rgb(original: &ImageTensor, y: usize, x: usize) -> [u8; 3] {
    let channels = original.channels();
    let base = (y * original.width() + x) * channels;
    let data = original.data();
    let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    if channels >= 3 {
        [to_byte(data[base]), to_byte(data[base + 1]), to_byte(data[base + 2])]
    } else {
        let v = to_byte(data[base]);
        [v, v, v]
    }
}

/// Jet-style colormap: blue through green to red over `[0, 1]`.
fn jet(v: f32) -> [u8; 3] {
    let v = v.clamp(0.0, 1.0);
    let r = (1.5 - (4.0 * v - 3.0).abs()).clamp(0.0, 1.0);
    let g = (1.5 - (4.0 * v - 2.0).abs()).clamp(0.0, 1.0);
    let b = (1.5 - (4.0 * v - 1.0).abs()).clamp(0.0, 1.0);
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}

/// Bilinear upsample of a 2D map to `(out_h, out_w)`.
fn resize_bilinear(map: &Array2<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
    let (in_h, in_w) = map.dim();
    let mut out = Array2::zeros((out_h, out_w));

    let scale_y = if out_h > 1 { (in_h - 1) as f32 / (out_h - 1) as f32 } else { 0.0 };
    let scale_x = if out_w > 1 { (in_w - 1) as f32 / (out_w - 1) as f32 } else { 0.0 };

    for y in 0..out_h {
        let fy = y as f32 * scale_y;
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(in_h - 1);
        let ty = fy - y0 as f32;

        for x in 0..out_w {
            let fx = x as f32 * scale_x;
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(in_w - 1);
            let tx = fx - x0 as f32;

            let top = map[[y0, x0]] * (1.0 - tx) + map[[y0, x1]] * tx;
            let bottom = map[[y1, x0]] * (1.0 - tx) + map[[y1, x1]] * tx;
            out[[y, x]] = top * (1.0 - ty) + bottom * ty;
        }
    }

    out
}
