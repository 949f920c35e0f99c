// 変換層 - アイテムごとにランダムなフィルターを適用する

pub mod filters;

pub use filters::FilterKind;

use crate::core::{ImageTransform, TransformError};
use image::DynamicImage;
use rand::seq::SliceRandom;
use std::time::Duration;

pub const DEFAULT_TRANSFORM_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_INTENSITY: f32 = 1.0;

/// 呼び出しごとにフィルターを1つランダムに選んで適用する変換
///
/// 低速な処理を模擬するため、適用前に固定時間スリープする。
#[derive(Debug, Clone)]
pub struct RandomFilterTransform {
    filters: Vec<FilterKind>,
    delay: Duration,
    intensity: f32,
}

impl Default for RandomFilterTransform {
    fn default() -> Self {
        Self {
            filters: FilterKind::ALL.to_vec(),
            delay: DEFAULT_TRANSFORM_DELAY,
            intensity: DEFAULT_INTENSITY,
        }
    }
}

impl RandomFilterTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: Vec<FilterKind>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn filters(&self) -> &[FilterKind] {
        &self.filters
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl ImageTransform for RandomFilterTransform {
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(TransformError::EmptyImage { width, height });
        }

        let filter = self
            .filters
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or(TransformError::NoFilterAvailable)?;
        tracing::trace!(%filter, width, height, "applying filter");
        filter.apply(image, self.intensity)
    }

    fn name(&self) -> &'static str {
        "random-filter"
    }
}
