// バッチ実行の設定

use crate::core::{BatchError, BatchResult, Strategy};
use crate::transform::{FilterKind, RandomFilterTransform, DEFAULT_INTENSITY, DEFAULT_TRANSFORM_DELAY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 設定ファイル（JSON）と CLI 引数から組み立てる実行設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub strategy: Strategy,
    /// 変換1回あたりの擬似遅延（ミリ秒）
    pub transform_delay_ms: u64,
    pub filters: Vec<FilterKind>,
    pub intensity: f32,
    /// 読み込み時の最大辺（超える画像は縮小）
    pub max_dimension: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            transform_delay_ms: DEFAULT_TRANSFORM_DELAY.as_millis() as u64,
            filters: FilterKind::ALL.to_vec(),
            intensity: DEFAULT_INTENSITY,
            max_dimension: None,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> BatchResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BatchError::configuration(format!("設定を解析できません: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> BatchResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            BatchError::configuration(format!("設定ファイルを読み込めません: {} - {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_transform_delay(mut self, delay: Duration) -> Self {
        self.transform_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_filters(mut self, filters: Vec<FilterKind>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    pub fn transform_delay(&self) -> Duration {
        Duration::from_millis(self.transform_delay_ms)
    }

    pub fn validate(&self) -> BatchResult<()> {
        if self.filters.is_empty() {
            return Err(BatchError::configuration("フィルターが1つも指定されていません"));
        }
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(BatchError::configuration(format!(
                "intensity は 0.0〜1.0 で指定してください: {}",
                self.intensity
            )));
        }
        if self.max_dimension == Some(0) {
            return Err(BatchError::configuration("max_dimension には 1 以上を指定してください"));
        }
        Ok(())
    }

    /// 設定に従った変換を作成
    pub fn build_transform(&self) -> RandomFilterTransform {
        RandomFilterTransform::new()
            .with_filters(self.filters.clone())
            .with_delay(self.transform_delay())
            .with_intensity(self.intensity)
    }
}
