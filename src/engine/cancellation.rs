// CancellationToken - ラン単位の協調的キャンセル
//
// 一度だけシグナルされ、ワーカーからはロックなしで何度でも観測できる。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// キャンセルをシグナルする
    ///
    /// この呼び出しで初めてキャンセルされた場合のみ `true` を返す。
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
