// ProgressAggregator - 完了イベントから進捗率とステータス文字列を生成

use crate::core::ProgressUpdate;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const STATUS_IDLE: &str = "Processing results";
pub const STATUS_STARTED: &str = "Processing started...";
pub const STATUS_FINISHED: &str = "Processing complete";
pub const STATUS_STOPPED: &str = "Processing stopped";

/// 処理済み件数のステータス文字列
pub fn processed_status(count: usize, total: usize) -> String {
    format!("Processed {count} of {total}")
}

/// 進捗率（`count == total` で厳密に 1.0）
pub fn fraction_of(count: usize, total: usize) -> f64 {
    if total == 0 || count >= total {
        1.0
    } else {
        count as f64 / total as f64
    }
}

#[derive(Debug)]
pub struct ProgressAggregator {
    completed: AtomicUsize,
    total: usize,
}

impl ProgressAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total
    }

    /// 完了を1件記録し、新しい件数と進捗率を返す
    pub fn record_completion(&self) -> ProgressUpdate {
        let count = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        ProgressUpdate {
            count,
            total: self.total,
            fraction: fraction_of(count, self.total),
            status: processed_status(count, self.total),
        }
    }

    /// ラン開始時の進捗
    pub fn started(&self) -> ProgressUpdate {
        ProgressUpdate {
            count: 0,
            total: self.total,
            fraction: 0.0,
            status: STATUS_STARTED.to_string(),
        }
    }
}

/// 戦略切り替え後の初期進捗
pub fn reset_update(total: usize) -> ProgressUpdate {
    ProgressUpdate {
        count: 0,
        total,
        fraction: 0.0,
        status: STATUS_IDLE.to_string(),
    }
}
