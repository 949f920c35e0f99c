use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;

pub mod standard;

/// デコード結果
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub image: DynamicImage,
    /// 縮小前のサイズ
    pub original_dimensions: (u32, u32),
    pub was_resized: bool,
}

/// 画像デコードのバックエンド
#[async_trait]
pub trait ImageLoaderBackend: Send + Sync {
    /// エンコード済みのバイト列から画像をデコードする
    async fn load_from_bytes(&self, data: Vec<u8>) -> Result<LoadResult>;

    fn strategy_name(&self) -> &'static str;
}
