// エンジン層 - バッチ実行とオーケストレーション
// アイテムストア・キャンセル・進捗集計を組み合わせてランを駆動する

pub mod cancellation;
pub mod concurrent;
pub mod controller;
pub mod dispatcher;
pub mod item_store;
pub mod progress;
pub mod sequential;
pub mod worker;

#[cfg(test)]
pub mod test_mocks;

pub use cancellation::CancellationToken;
pub use concurrent::ConcurrentExecution;
pub use controller::RunController;
pub use dispatcher::{EventDispatcher, EventSender, UiEvent, COORDINATOR_THREAD_NAME};
pub use item_store::ItemStore;
pub use progress::ProgressAggregator;
pub use sequential::SequentialExecution;
pub use worker::{process_item, ItemOutcome, RunContext};

use crate::core::{BatchResult, Strategy};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// アイテムの投入方法を決める実行戦略
///
/// `launch` はワーカーを投入して即座に戻り、全ワーカーの終了を待つタスクを返す。
pub trait ExecutionStrategy: Send + Sync {
    fn kind(&self) -> Strategy;

    fn launch(&self, run: Arc<RunContext>, runtime: &Handle) -> JoinHandle<BatchResult<()>>;
}

pub fn strategy_for(strategy: Strategy) -> Box<dyn ExecutionStrategy> {
    match strategy {
        Strategy::Concurrent => Box::new(ConcurrentExecution::new()),
        Strategy::Sequential => Box::new(SequentialExecution::new()),
    }
}
