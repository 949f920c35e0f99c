use super::{ImageLoaderBackend, LoadResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::DynamicImage;

/// `image` クレートによる標準ローダー
///
/// 最大辺を指定すると、それを超える画像はアスペクト比を保って縮小する。
#[derive(Clone, Debug, Default)]
pub struct StandardImageLoader {
    max_dimension: Option<u32>,
}

impl StandardImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: Some(max_dimension),
        }
    }

    fn fit(&self, image: DynamicImage) -> (DynamicImage, bool) {
        match self.max_dimension {
            Some(max) if image.width() > max || image.height() > max => {
                // resize は縦横比を保ったまま枠内に収める
                (image.resize(max, max, FilterType::Triangle), true)
            }
            _ => (image, false),
        }
    }
}

#[async_trait]
impl ImageLoaderBackend for StandardImageLoader {
    async fn load_from_bytes(&self, data: Vec<u8>) -> Result<LoadResult> {
        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&data))
            .await
            .context("画像デコードタスクが失敗しました")?
            .context("画像をデコードできません")?;

        let original_dimensions = (image.width(), image.height());
        let (image, was_resized) = self.fit(image);

        Ok(LoadResult {
            image,
            original_dimensions,
            was_resized,
        })
    }

    fn strategy_name(&self) -> &'static str {
        if self.max_dimension.is_some() {
            "Standard with size limit"
        } else {
            "Standard"
        }
    }
}
