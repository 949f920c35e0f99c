// SequentialExecution - 単一ワーカーがインデックス順に1件ずつ処理する戦略

use super::worker::{process_item, ItemOutcome, RunContext};
use super::ExecutionStrategy;
use crate::core::{BatchError, BatchResult, Strategy};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecution;

impl SequentialExecution {
    pub fn new() -> Self {
        Self
    }
}

/// 次のアイテムを投入する前に毎回キャンセルを確認する
fn run_in_order(run: &RunContext) {
    for index in 0..run.total() {
        if run.token().is_cancelled() {
            tracing::debug!(index, "sequential run stopped before dispatch");
            break;
        }
        match process_item(run, index) {
            ItemOutcome::Done | ItemOutcome::Recovered => {}
            ItemOutcome::Cancelled | ItemOutcome::NotStarted => break,
            ItemOutcome::Superseded => {
                tracing::debug!(generation = %run.generation(), "sequential run superseded");
                break;
            }
        }
    }
}

impl ExecutionStrategy for SequentialExecution {
    fn kind(&self) -> Strategy {
        Strategy::Sequential
    }

    fn launch(&self, run: Arc<RunContext>, runtime: &Handle) -> JoinHandle<BatchResult<()>> {
        let worker = {
            let run = run.clone();
            runtime.spawn_blocking(move || run_in_order(&run))
        };

        runtime.spawn(async move {
            let result = worker.await;
            run.mark_settled();
            result.map_err(|error| {
                tracing::error!(%error, "sequential worker failed");
                BatchError::task(error)
            })
        })
    }
}
