// EventDispatcher - 表示層への通知を単一のコーディネータースレッドで配送
//
// ワーカーはどのスレッドからでもイベントを送信できる。配送は専用スレッドが
// 受信順に行い、古い世代のワーカーが送ったイベントはそこで破棄する。
// ワーカーの進捗は追い越しが起きうるため、同じ世代で件数が後退する通知も破棄する。

use super::item_store::ItemStore;
use crate::core::{Generation, ItemRecord, PresentationSink, ProgressUpdate, Strategy};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

pub const COORDINATOR_THREAD_NAME: &str = "batch-coordinator";

/// 表示層へ届けるイベント
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    RunStarted { strategy: Strategy, total: usize },
    ItemChanged { index: usize, record: ItemRecord },
    Progress(ProgressUpdate),
    RunFinished,
    RunStopped,
    Error { message: String },
}

enum Envelope {
    Event {
        generation: Option<Generation>,
        event: UiEvent,
    },
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// イベント送信ハンドル（複製してワーカーへ渡す）
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSender {
    /// 世代に関係なく必ず配送されるイベント
    pub fn send(&self, event: UiEvent) {
        self.post(Envelope::Event {
            generation: None,
            event,
        });
    }

    /// 指定世代のワーカーからのイベント（世代が古ければ配送時に破棄）
    pub fn send_for(&self, generation: Generation, event: UiEvent) {
        self.post(Envelope::Event {
            generation: Some(generation),
            event,
        });
    }

    /// それまでに送信された全イベントの配送完了を待つ
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.post(Envelope::Flush(ack_tx));
        if ack_rx.await.is_err() {
            tracing::debug!("coordinator stopped before flush completed");
        }
    }

    fn post(&self, envelope: Envelope) {
        if self.tx.send(envelope).is_err() {
            tracing::debug!("coordinator thread is gone, dropping event");
        }
    }
}

pub struct EventDispatcher {
    sender: EventSender,
    thread: Option<JoinHandle<()>>,
}

impl EventDispatcher {
    /// コーディネータースレッドを起動し、シンクの所有権を移す
    pub fn spawn<S>(sink: S, store: Arc<ItemStore>) -> std::io::Result<Self>
    where
        S: PresentationSink + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let thread = std::thread::Builder::new()
            .name(COORDINATOR_THREAD_NAME.to_string())
            .spawn(move || run_coordinator(sink, store, rx))?;

        Ok(Self {
            sender: EventSender { tx },
            thread: Some(thread),
        })
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// 残りのイベントを配送してからスレッドを停止する（ブロッキング）
    ///
    /// シンクがパニックしていた場合はそのペイロードを返す。
    pub fn shutdown(mut self) -> std::thread::Result<()> {
        self.sender.post(Envelope::Shutdown);
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

fn run_coordinator<S: PresentationSink>(
    mut sink: S,
    store: Arc<ItemStore>,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
) {
    let mut high_water: Option<(Generation, usize)> = None;

    while let Some(envelope) = rx.blocking_recv() {
        match envelope {
            Envelope::Event { generation, event } => {
                if let Some(generation) = generation {
                    let current = store.generation();
                    if generation != current {
                        tracing::trace!(%generation, %current, "dropping stale worker event");
                        continue;
                    }
                    if let UiEvent::Progress(update) = &event {
                        match high_water {
                            Some((seen, count)) if seen == generation && update.count <= count => {
                                tracing::trace!(count = update.count, "dropping overtaken progress");
                                continue;
                            }
                            _ => high_water = Some((generation, update.count)),
                        }
                    }
                }
                deliver(&mut sink, event);
            }
            Envelope::Flush(ack) => {
                let _ = ack.send(());
            }
            Envelope::Shutdown => break,
        }
    }
}

fn deliver<S: PresentationSink>(sink: &mut S, event: UiEvent) {
    match event {
        UiEvent::RunStarted { strategy, total } => sink.on_run_started(strategy, total),
        UiEvent::ItemChanged { index, record } => sink.on_item_changed(index, record),
        UiEvent::Progress(update) => sink.on_progress(update),
        UiEvent::RunFinished => sink.on_run_finished(),
        UiEvent::RunStopped => sink.on_run_stopped(),
        UiEvent::Error { message } => sink.on_error(message),
    }
}
