// RunController - ランの開始・キャンセル・戦略切り替えを管理
//
// 同時に有効なランは最大1つ。ランごとに新しいトークンと世代番号を割り当てる。

use super::dispatcher::{EventSender, UiEvent};
use super::item_store::ItemStore;
use super::progress::reset_update;
use super::strategy_for;
use super::worker::RunContext;
use crate::core::{
    BatchError, BatchResult, ImageTransform, ItemRecord, RunSummary, Strategy,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

struct ActiveRun {
    context: Arc<RunContext>,
    task: Option<JoinHandle<BatchResult<()>>>,
    started_at: DateTime<Utc>,
}

struct ControllerState {
    strategy: Strategy,
    current: Option<ActiveRun>,
}

pub struct RunController {
    store: Arc<ItemStore>,
    transform: Arc<dyn ImageTransform>,
    events: EventSender,
    runtime: Handle,
    state: Mutex<ControllerState>,
}

impl RunController {
    pub fn new(
        store: Arc<ItemStore>,
        transform: Arc<dyn ImageTransform>,
        events: EventSender,
        runtime: Handle,
        strategy: Strategy,
    ) -> Self {
        Self {
            store,
            transform,
            events,
            runtime,
            state: Mutex::new(ControllerState {
                strategy,
                current: None,
            }),
        }
    }

    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }

    pub fn strategy(&self) -> Strategy {
        self.state.lock().strategy
    }

    /// 現在のランが完了もキャンセルもされていない
    pub fn is_active(&self) -> bool {
        self.state
            .lock()
            .current
            .as_ref()
            .is_some_and(|run| run.context.is_active())
    }

    pub fn snapshot(&self) -> Vec<ItemRecord> {
        self.store.snapshot()
    }

    /// 選択中の戦略で新しいランを開始する
    ///
    /// 有効なランがある場合は何も変更せずにエラーを返す。
    /// キャンセル済みランのワーカーが残っていても開始できる（世代番号で隔離される）。
    pub fn start(&self) -> BatchResult<()> {
        let mut state = self.state.lock();

        if let Some(run) = state.current.as_ref() {
            if run.context.is_active() {
                let generation = run.context.generation();
                tracing::warn!(%generation, "start ignored: run already active");
                return Err(BatchError::run_already_active(generation));
            }
        }

        let strategy = state.strategy;
        let generation = self.store.reset_derived();
        let context = Arc::new(RunContext::new(
            generation,
            strategy,
            self.store.clone(),
            self.transform.clone(),
            self.events.clone(),
        ));
        let total = context.total();

        tracing::info!(%generation, %strategy, total, transform = self.transform.name(), "run started");

        self.events
            .send_for(generation, UiEvent::RunStarted { strategy, total });
        for (index, record) in self.store.snapshot().into_iter().enumerate() {
            self.events
                .send_for(generation, UiEvent::ItemChanged { index, record });
        }
        self.events
            .send_for(generation, UiEvent::Progress(context.progress().started()));
        if total == 0 {
            self.events.send_for(generation, UiEvent::RunFinished);
        }

        let task = strategy_for(strategy).launch(context.clone(), &self.runtime);
        state.current = Some(ActiveRun {
            context,
            task: Some(task),
            started_at: Utc::now(),
        });
        Ok(())
    }

    /// 現在のランにキャンセルをシグナルする
    ///
    /// 有効なランがなければ何もせず `false` を返す。
    pub fn cancel(&self) -> bool {
        let state = self.state.lock();
        let Some(run) = state.current.as_ref() else {
            return false;
        };
        if !run.context.is_active() || !run.context.token().cancel() {
            return false;
        }

        tracing::info!(
            generation = %run.context.generation(),
            completed = run.context.progress().completed(),
            "run cancelled"
        );
        self.events.send(UiEvent::RunStopped);
        true
    }

    /// 実行戦略を切り替え、全アイテムを初期状態に戻す
    ///
    /// 有効なランがあれば先にキャンセルする。
    pub fn switch_strategy(&self, strategy: Strategy) {
        let mut state = self.state.lock();

        if let Some(run) = state.current.take() {
            if run.context.is_active() && run.context.token().cancel() {
                tracing::info!(generation = %run.context.generation(), "active run cancelled by strategy switch");
                self.events.send(UiEvent::RunStopped);
            }
        }

        let previous = state.strategy;
        state.strategy = strategy;
        let generation = self.store.reset_derived();
        tracing::info!(from = %previous, to = %strategy, %generation, "strategy switched");

        for (index, record) in self.store.snapshot().into_iter().enumerate() {
            self.events.send(UiEvent::ItemChanged { index, record });
        }
        self.events
            .send(UiEvent::Progress(reset_update(self.store.len())));
    }

    /// 現在のランのワーカーがすべて終了するまで待ち、サマリーを返す
    ///
    /// ランがなければ `None`。
    pub async fn wait(&self) -> BatchResult<Option<RunSummary>> {
        let (context, task, started_at) = {
            let mut state = self.state.lock();
            match state.current.as_mut() {
                Some(run) => (run.context.clone(), run.task.take(), run.started_at),
                None => return Ok(None),
            }
        };

        if let Some(task) = task {
            task.await.map_err(BatchError::task)??;
        }

        let summary = RunSummary {
            generation: context.generation(),
            strategy: context.strategy(),
            total_items: context.total(),
            completed: context.progress().completed(),
            transform_errors: context.transform_errors(),
            was_cancelled: context.token().is_cancelled(),
            statuses: self.store.status_counts(),
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            generation = %summary.generation,
            completed = summary.completed,
            total = summary.total_items,
            cancelled = summary.was_cancelled,
            elapsed_ms = summary.elapsed_ms(),
            "run settled"
        );
        Ok(Some(summary))
    }
}
