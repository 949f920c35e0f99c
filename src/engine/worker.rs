// Worker - 1アイテム分の処理プロトコル
//
// 両方の実行戦略がこのプロトコルを共有する。
// 1. キャンセル済みなら何もせず終了
// 2. Processing に遷移して通知
// 3. ロックを持たずに変換を実行
// 4. キャンセルを再確認し、されていれば Cancelled に遷移
// 5. 結果を書き込んで Done に遷移
// 6. 進捗を記録し、全件完了ならラン終了を通知

use super::cancellation::CancellationToken;
use super::dispatcher::{EventSender, UiEvent};
use super::item_store::ItemStore;
use super::progress::ProgressAggregator;
use crate::core::{Generation, ImageTransform, Strategy, TransformError};
use image::DynamicImage;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// 1回のランでワーカーが共有するコンテキスト
pub struct RunContext {
    generation: Generation,
    strategy: Strategy,
    store: Arc<ItemStore>,
    transform: Arc<dyn ImageTransform>,
    token: CancellationToken,
    progress: ProgressAggregator,
    events: EventSender,
    transform_errors: AtomicUsize,
    settled: AtomicBool,
}

impl RunContext {
    pub fn new(
        generation: Generation,
        strategy: Strategy,
        store: Arc<ItemStore>,
        transform: Arc<dyn ImageTransform>,
        events: EventSender,
    ) -> Self {
        let total = store.len();
        Self {
            generation,
            strategy,
            store,
            transform,
            token: CancellationToken::new(),
            progress: ProgressAggregator::new(total),
            events,
            transform_errors: AtomicUsize::new(0),
            settled: AtomicBool::new(false),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn total(&self) -> usize {
        self.progress.total()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    pub fn transform_errors(&self) -> usize {
        self.transform_errors.load(Ordering::SeqCst)
    }

    /// 全ワーカーの終了を記録
    pub fn mark_settled(&self) {
        self.settled.store(true, Ordering::SeqCst);
    }

    /// キャンセルも完了もされておらず、ワーカーが残っている
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
            && !self.progress.is_complete()
            && !self.settled.load(Ordering::SeqCst)
    }

    fn notify_item(&self, index: usize, record: crate::core::ItemRecord) {
        self.events
            .send_for(self.generation, UiEvent::ItemChanged { index, record });
    }
}

/// 1アイテムの処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// 変換に成功して Done
    Done,
    /// 変換に失敗したが元画像で Done
    Recovered,
    /// 変換後にキャンセルを観測
    Cancelled,
    /// 開始前にキャンセルを観測
    NotStarted,
    /// 新しい世代に置き換えられた
    Superseded,
}

/// 変換を実行する。パニックは変換失敗として扱い、アイテムを Processing のまま残さない
fn run_transform(
    transform: &dyn ImageTransform,
    image: &DynamicImage,
) -> Result<DynamicImage, TransformError> {
    catch_unwind(AssertUnwindSafe(|| transform.transform(image))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| text.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        Err(TransformError::filter_failed(format!(
            "{} panicked: {message}",
            transform.name()
        )))
    })
}

pub fn process_item(run: &RunContext, index: usize) -> ItemOutcome {
    if run.token.is_cancelled() {
        return ItemOutcome::NotStarted;
    }

    let started = run.store.mutate_in(run.generation, index, |record| {
        record.mark_processing();
        (record.original().clone(), record.clone())
    });
    let Some((original, snapshot)) = started else {
        tracing::debug!(index, generation = %run.generation, "run superseded before start");
        return ItemOutcome::Superseded;
    };
    run.notify_item(index, snapshot);
    tracing::debug!(index, strategy = %run.strategy, "processing item");

    let result = run_transform(run.transform.as_ref(), &original);

    if run.token.is_cancelled() {
        if let Some(snapshot) = run.store.mutate_in(run.generation, index, |record| {
            record.mark_cancelled();
            record.clone()
        }) {
            run.notify_item(index, snapshot);
        }
        tracing::debug!(index, "cancellation observed after transform");
        return ItemOutcome::Cancelled;
    }

    let (processed, failure) = match result {
        Ok(image) => (Arc::new(image), None),
        Err(error) => (original, Some(error)),
    };

    let finished = run.store.mutate_in(run.generation, index, |record| {
        record.mark_done(processed);
        record.clone()
    });
    let Some(snapshot) = finished else {
        tracing::debug!(index, generation = %run.generation, "dropping stale result");
        return ItemOutcome::Superseded;
    };

    let outcome = match failure {
        Some(error) => {
            run.transform_errors.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(index, item = snapshot.name(), %error, "transform failed, keeping original");
            run.events.send_for(
                run.generation,
                UiEvent::Error {
                    message: format!("{}: {error}", snapshot.name()),
                },
            );
            ItemOutcome::Recovered
        }
        None => ItemOutcome::Done,
    };
    run.notify_item(index, snapshot);

    let update = run.progress.record_completion();
    let complete = update.count == update.total;
    run.events
        .send_for(run.generation, UiEvent::Progress(update));
    if complete {
        tracing::info!(generation = %run.generation, strategy = %run.strategy, "run finished");
        run.events.send_for(run.generation, UiEvent::RunFinished);
    }

    outcome
}
