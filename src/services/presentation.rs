// 表示層 - コーディネータースレッドで受け取ったイベントを画面状態へ反映

use crate::core::{ItemRecord, ItemStatus, PresentationSink, ProgressUpdate, Strategy};
use crate::engine::progress::{STATUS_FINISHED, STATUS_IDLE, STATUS_STOPPED};
use crate::engine::UiEvent;
use parking_lot::Mutex;
use std::sync::Arc;

/// 画面に表示する状態（ビューモデル）
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub items: Vec<Option<ItemRecord>>,
    pub strategy: Option<Strategy>,
    pub completed: usize,
    pub total: usize,
    pub fraction: f64,
    pub status: String,
    pub start_enabled: bool,
    pub stop_visible: bool,
    pub last_error: Option<String>,
    pub error_count: usize,
    stopped: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            strategy: None,
            completed: 0,
            total: 0,
            fraction: 0.0,
            status: STATUS_IDLE.to_string(),
            start_enabled: true,
            stop_visible: false,
            last_error: None,
            error_count: 0,
            stopped: false,
        }
    }
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_status(&self, index: usize) -> Option<ItemStatus> {
        self.items
            .get(index)
            .and_then(|item| item.as_ref())
            .map(ItemRecord::status)
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::RunStarted { strategy, total } => {
                self.strategy = Some(strategy);
                self.total = total;
                self.completed = 0;
                self.fraction = 0.0;
                self.items.resize(total, None);
                self.start_enabled = false;
                self.stop_visible = true;
                self.last_error = None;
                self.error_count = 0;
                self.stopped = false;
            }
            UiEvent::ItemChanged { index, record } => {
                if index >= self.items.len() {
                    self.items.resize(index + 1, None);
                }
                self.items[index] = Some(record);
            }
            UiEvent::Progress(update) => self.apply_progress(update),
            UiEvent::RunFinished => {
                // 停止後に届いた完了通知では停止表示を維持する
                if !self.stopped {
                    self.fraction = 1.0;
                    self.status = STATUS_FINISHED.to_string();
                }
                self.start_enabled = true;
                self.stop_visible = false;
            }
            UiEvent::RunStopped => {
                self.status = STATUS_STOPPED.to_string();
                self.start_enabled = true;
                self.stop_visible = false;
                self.stopped = true;
            }
            UiEvent::Error { message } => {
                self.last_error = Some(message);
                self.error_count += 1;
            }
        }
    }

    fn apply_progress(&mut self, update: ProgressUpdate) {
        // 件数0の通知（開始・リセット）は停止表示を解除する
        if self.stopped && update.count > 0 {
            return;
        }
        if update.count == 0 {
            self.stopped = false;
        }
        self.completed = update.count;
        self.total = update.total;
        self.fraction = update.fraction;
        self.status = update.status;
    }
}

impl PresentationSink for PanelState {
    fn on_run_started(&mut self, strategy: Strategy, total: usize) {
        self.apply(UiEvent::RunStarted { strategy, total });
    }

    fn on_item_changed(&mut self, index: usize, record: ItemRecord) {
        self.apply(UiEvent::ItemChanged { index, record });
    }

    fn on_progress(&mut self, update: ProgressUpdate) {
        self.apply(UiEvent::Progress(update));
    }

    fn on_run_finished(&mut self) {
        self.apply(UiEvent::RunFinished);
    }

    fn on_run_stopped(&mut self) {
        self.apply(UiEvent::RunStopped);
    }

    fn on_error(&mut self, message: String) {
        self.apply(UiEvent::Error { message });
    }
}

/// 画面状態を更新しつつコンソールへ進捗を出力するシンク
#[derive(Debug, Clone, Default)]
pub struct ConsolePresenter {
    panel: Arc<Mutex<PanelState>>,
    quiet: bool,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// 画面状態の共有ハンドル（別スレッドから読み取り可能）
    pub fn panel(&self) -> Arc<Mutex<PanelState>> {
        self.panel.clone()
    }

    /// コンソールに出す1行。画面状態が無視するイベントには何も出さない
    fn console_line(event: &UiEvent, panel: &PanelState) -> Option<String> {
        match event {
            UiEvent::RunStarted { strategy, total } => {
                Some(format!("🚀 Starting {strategy} run over {total} images..."))
            }
            UiEvent::ItemChanged { index, record } if record.status() == ItemStatus::Cancelled => {
                Some(format!("⏹  #{index} {} cancelled", record.name()))
            }
            UiEvent::ItemChanged { .. } => None,
            UiEvent::Progress(update) if panel.stopped && update.count > 0 => None,
            UiEvent::Progress(update) => Some(format!(
                "📊 {} ({:.1}%)",
                update.status,
                update.fraction * 100.0
            )),
            UiEvent::RunFinished if panel.stopped => None,
            UiEvent::RunFinished => Some(format!("✅ {STATUS_FINISHED}")),
            UiEvent::RunStopped => Some(format!("🛑 {STATUS_STOPPED}")),
            UiEvent::Error { message } => Some(format!("❌ {message}")),
        }
    }

    fn handle(&mut self, event: UiEvent) {
        let mut panel = self.panel.lock();
        if !self.quiet {
            match Self::console_line(&event, &panel) {
                Some(line) if matches!(event, UiEvent::Error { .. }) => eprintln!("{line}"),
                Some(line) => println!("{line}"),
                None => {}
            }
        }
        panel.apply(event);
    }
}

impl PresentationSink for ConsolePresenter {
    fn on_run_started(&mut self, strategy: Strategy, total: usize) {
        self.handle(UiEvent::RunStarted { strategy, total });
    }

    fn on_item_changed(&mut self, index: usize, record: ItemRecord) {
        self.handle(UiEvent::ItemChanged { index, record });
    }

    fn on_progress(&mut self, update: ProgressUpdate) {
        self.handle(UiEvent::Progress(update));
    }

    fn on_run_finished(&mut self) {
        self.handle(UiEvent::RunFinished);
    }

    fn on_run_stopped(&mut self) {
        self.handle(UiEvent::RunStopped);
    }

    fn on_error(&mut self, message: String) {
        self.handle(UiEvent::Error { message });
    }
}
