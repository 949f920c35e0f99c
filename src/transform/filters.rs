// 画像フィルターの実装

use crate::core::TransformError;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 適用可能なフィルターの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Sepia,
    Noir,
    Vignette,
    Bloom,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [Self::Sepia, Self::Noir, Self::Vignette, Self::Bloom];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sepia => "sepia",
            Self::Noir => "noir",
            Self::Vignette => "vignette",
            Self::Bloom => "bloom",
        }
    }

    /// フィルターを適用した新しい画像を返す
    ///
    /// `intensity` は Sepia と Vignette の強さ（0.0〜1.0）。
    pub fn apply(&self, image: &DynamicImage, intensity: f32) -> Result<DynamicImage, TransformError> {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(TransformError::filter_failed(format!(
                "{}: intensity {intensity} は 0.0〜1.0 の範囲外です",
                self.as_str()
            )));
        }

        let rgba = image.to_rgba8();
        let output = match self {
            Self::Sepia => sepia(rgba, intensity),
            Self::Noir => noir(image),
            Self::Vignette => vignette(rgba, intensity),
            Self::Bloom => bloom(rgba),
        };
        Ok(DynamicImage::ImageRgba8(output))
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn sepia(mut rgba: RgbaImage, intensity: f32) -> RgbaImage {
    for pixel in rgba.pixels_mut() {
        let [r, g, b, a] = pixel.0.map(f32::from);
        let tone = [
            0.393 * r + 0.769 * g + 0.189 * b,
            0.349 * r + 0.686 * g + 0.168 * b,
            0.272 * r + 0.534 * g + 0.131 * b,
        ];
        let mix = |source: f32, toned: f32| clamp_channel(source + (toned - source) * intensity);
        *pixel = Rgba([mix(r, tone[0]), mix(g, tone[1]), mix(b, tone[2]), a as u8]);
    }
    rgba
}

// グレースケール化してコントラストを強める
fn noir(image: &DynamicImage) -> RgbaImage {
    let gray = image.grayscale();
    imageops::contrast(&gray.to_rgba8(), 25.0)
}

// 中心からの距離に応じて周辺を暗くする
fn vignette(mut rgba: RgbaImage, intensity: f32) -> RgbaImage {
    let (width, height) = rgba.dimensions();
    let center_x = (width as f32 - 1.0) / 2.0;
    let center_y = (height as f32 - 1.0) / 2.0;
    let max_distance = (center_x * center_x + center_y * center_y).sqrt().max(1.0);

    for (x, y, pixel) in rgba.enumerate_pixels_mut() {
        let dx = x as f32 - center_x;
        let dy = y as f32 - center_y;
        let falloff = ((dx * dx + dy * dy).sqrt() / max_distance).powi(2);
        let factor = 1.0 - intensity * falloff;
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([
            clamp_channel(f32::from(r) * factor),
            clamp_channel(f32::from(g) * factor),
            clamp_channel(f32::from(b) * factor),
            a,
        ]);
    }
    rgba
}

// ぼかした画像をスクリーン合成して明部をにじませる
fn bloom(rgba: RgbaImage) -> RgbaImage {
    let sigma = (rgba.width().min(rgba.height()) as f32 / 50.0).max(1.0);
    let glow = imageops::blur(&rgba, sigma);
    let mut output = rgba;

    for (pixel, halo) in output.pixels_mut().zip(glow.pixels()) {
        let screen = |base: u8, light: u8| {
            let base = f32::from(base) / 255.0;
            let light = f32::from(light) / 255.0 * 0.6;
            clamp_channel((1.0 - (1.0 - base) * (1.0 - light)) * 255.0)
        };
        let [r, g, b, a] = pixel.0;
        let [hr, hg, hb, _] = halo.0;
        *pixel = Rgba([screen(r, hr), screen(g, hg), screen(b, hb), a]);
    }
    output
}
