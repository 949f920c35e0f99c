// ConcurrentExecution - アイテムごとに1タスクを同時に投入する戦略

use super::worker::{process_item, ItemOutcome, RunContext};
use super::ExecutionStrategy;
use crate::core::{BatchError, BatchResult, Strategy};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Default, Clone, Copy)]
pub struct ConcurrentExecution;

impl ConcurrentExecution {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionStrategy for ConcurrentExecution {
    fn kind(&self) -> Strategy {
        Strategy::Concurrent
    }

    fn launch(&self, run: Arc<RunContext>, runtime: &Handle) -> JoinHandle<BatchResult<()>> {
        // 全アイテムを一度に投入する。完了順は保証しない
        let workers: Vec<JoinHandle<ItemOutcome>> = (0..run.total())
            .map(|index| {
                let run = run.clone();
                runtime.spawn_blocking(move || process_item(&run, index))
            })
            .collect();

        tracing::debug!(
            generation = %run.generation(),
            workers = workers.len(),
            "concurrent workers submitted"
        );

        runtime.spawn(async move {
            let mut first_error = None;
            for (index, worker) in workers.into_iter().enumerate() {
                match worker.await {
                    Ok(outcome) => {
                        tracing::trace!(index, ?outcome, "worker finished");
                    }
                    Err(error) => {
                        tracing::error!(index, %error, "worker task failed");
                        first_error.get_or_insert(BatchError::task(error));
                    }
                }
            }
            run.mark_settled();

            match first_error {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })
    }
}
