// バッチ処理に関連するデータ型定義

use super::error::BatchError;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// アイテムの処理状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Idle,
    Processing,
    Done,
    Cancelled,
}

/// 1枚の画像とその処理結果
///
/// `processed` は `status == Done` の場合にのみ存在する。
/// 状態遷移はクレート内部（実行戦略）からのみ行える。
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    name: String,
    original: Arc<DynamicImage>,
    processed: Option<Arc<DynamicImage>>,
    status: ItemStatus,
}

impl ItemRecord {
    pub fn new(name: impl Into<String>, original: DynamicImage) -> Self {
        Self {
            name: name.into(),
            original: Arc::new(original),
            processed: None,
            status: ItemStatus::Idle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original(&self) -> &Arc<DynamicImage> {
        &self.original
    }

    pub fn processed(&self) -> Option<&Arc<DynamicImage>> {
        self.processed.as_ref()
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub(crate) fn mark_processing(&mut self) {
        self.processed = None;
        self.status = ItemStatus::Processing;
    }

    pub(crate) fn mark_done(&mut self, processed: Arc<DynamicImage>) {
        self.processed = Some(processed);
        self.status = ItemStatus::Done;
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.processed = None;
        self.status = ItemStatus::Cancelled;
    }

    pub(crate) fn reset(&mut self) {
        self.processed = None;
        self.status = ItemStatus::Idle;
    }
}

/// 実行戦略の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Concurrent,
    Sequential,
}

impl Strategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Concurrent => "concurrent",
            Self::Sequential => "sequential",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = BatchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "concurrent" | "parallel" => Ok(Self::Concurrent),
            "sequential" => Ok(Self::Sequential),
            other => Err(BatchError::configuration(format!(
                "不明な実行戦略です: {other} (concurrent / sequential)"
            ))),
        }
    }
}

/// ランの世代番号
///
/// ストアの派生フィールドがリセットされるたびに単調増加する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 進捗の通知内容
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub count: usize,
    pub total: usize,
    pub fraction: f64,
    pub status: String,
}

/// 状態ごとのアイテム数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub idle: usize,
    pub processing: usize,
    pub done: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Idle => self.idle += 1,
            ItemStatus::Processing => self.processing += 1,
            ItemStatus::Done => self.done += 1,
            ItemStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.idle + self.processing + self.done + self.cancelled
    }
}

/// ラン全体のサマリー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub generation: Generation,
    pub strategy: Strategy,
    pub total_items: usize,
    pub completed: usize,
    pub transform_errors: usize,
    pub was_cancelled: bool,
    pub statuses: StatusCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
