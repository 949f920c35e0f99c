// 統合テスト用のシンク・変換とハーネス

use image::DynamicImage;
use image_batch::{
    EventDispatcher, ImageTransform, ItemRecord, ItemStatus, ItemStore, PanelState,
    PresentationSink, ProgressUpdate, RunController, Strategy, TransformError, UiEvent,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::runtime::Handle;

/// `count` 枚の 2x2 画像。`odd_one` を指定するとその位置だけ 3x3 にする
pub fn sample_records(count: usize, odd_one: Option<usize>) -> Vec<ItemRecord> {
    (0..count)
        .map(|i| {
            let size = if Some(i) == odd_one { 3 } else { 2 };
            ItemRecord::new(format!("image {}", i + 1), DynamicImage::new_rgba8(size, size))
        })
        .collect()
}

/// 受け取ったイベントと配送スレッド名を記録し、画面状態にも反映するシンク
#[derive(Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<(String, UiEvent)>>>,
    panel: Arc<Mutex<PanelState>>,
}

impl RecordingSink {
    pub fn panel(&self) -> PanelState {
        self.panel.lock().clone()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.log.lock().iter().map(|(_, event)| event.clone()).collect()
    }

    pub fn thread_names(&self) -> Vec<String> {
        self.log.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn progress(&self) -> Vec<ProgressUpdate> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Progress(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    /// Processing へ遷移した順のインデックス
    pub fn processing_order(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::ItemChanged { index, record } if record.status() == ItemStatus::Processing => {
                    Some(index)
                }
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &UiEvent) -> usize {
        self.events().iter().filter(|event| *event == wanted).count()
    }

    fn push(&self, event: UiEvent) {
        let name = std::thread::current().name().unwrap_or_default().to_string();
        self.panel.lock().apply(event.clone());
        self.log.lock().push((name, event));
    }
}

impl PresentationSink for RecordingSink {
    fn on_run_started(&mut self, strategy: Strategy, total: usize) {
        self.push(UiEvent::RunStarted { strategy, total });
    }

    fn on_item_changed(&mut self, index: usize, record: ItemRecord) {
        self.push(UiEvent::ItemChanged { index, record });
    }

    fn on_progress(&mut self, update: ProgressUpdate) {
        self.push(UiEvent::Progress(update));
    }

    fn on_run_finished(&mut self) {
        self.push(UiEvent::RunFinished);
    }

    fn on_run_stopped(&mut self) {
        self.push(UiEvent::RunStopped);
    }

    fn on_error(&mut self, message: String) {
        self.push(UiEvent::Error { message });
    }
}

/// 反転変換。幅3の画像では失敗し、同時実行数を記録する
#[derive(Default)]
pub struct InvertTransform {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InvertTransform {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ImageTransform for InvertTransform {
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if image.width() == 3 {
            return Err(TransformError::filter_failed("unsupported size"));
        }
        let mut output = image.clone();
        output.invert();
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "invert"
    }
}

/// 幅3の画像でパニックする変換
pub struct PanickingTransform;

impl ImageTransform for PanickingTransform {
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        if image.width() == 3 {
            panic!("filter exploded");
        }
        Ok(image.grayscale())
    }

    fn name(&self) -> &'static str {
        "exploding"
    }
}

/// `gate_at` 回目（0始まり）の呼び出しで開始を通知し、解放までブロックする変換
pub struct GatedTransform {
    gate_at: usize,
    calls: AtomicUsize,
    started: Mutex<mpsc::Sender<usize>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedTransform {
    pub fn new(gate_at: usize) -> (Self, mpsc::Receiver<usize>, mpsc::Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let transform = Self {
            gate_at,
            calls: AtomicUsize::new(0),
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        (transform, started_rx, release_tx)
    }
}

impl ImageTransform for GatedTransform {
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.gate_at {
            let _ = self.started.lock().send(call);
            let _ = self.release.lock().recv();
        }
        Ok(image.grayscale())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// ストア・ディスパッチャ・コントローラをまとめたハーネス
pub struct Harness {
    pub store: Arc<ItemStore>,
    pub sink: RecordingSink,
    pub controller: RunController,
    dispatcher: Option<EventDispatcher>,
}

impl Harness {
    pub fn new(records: Vec<ItemRecord>, transform: Arc<dyn ImageTransform>, strategy: Strategy) -> Self {
        let store = Arc::new(ItemStore::new(records));
        let sink = RecordingSink::default();
        let dispatcher = EventDispatcher::spawn(sink.clone(), store.clone()).unwrap();
        let controller = RunController::new(
            store.clone(),
            transform,
            dispatcher.sender(),
            Handle::current(),
            strategy,
        );
        Self {
            store,
            sink,
            controller,
            dispatcher: Some(dispatcher),
        }
    }

    /// それまでに送信されたイベントの配送を待つ
    pub async fn flush(&self) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.sender().flush().await;
        }
    }

    pub async fn shutdown(mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            let joined = tokio::task::spawn_blocking(move || dispatcher.shutdown())
                .await
                .unwrap();
            assert!(joined.is_ok(), "presentation sink panicked");
        }
    }

    pub fn statuses(&self) -> Vec<ItemStatus> {
        self.store.snapshot().iter().map(ItemRecord::status).collect()
    }
}

/// ブロッキングの受信を非同期に待つ
pub async fn recv_blocking<T: Send + 'static>(receiver: mpsc::Receiver<T>) -> (T, mpsc::Receiver<T>) {
    tokio::task::spawn_blocking(move || {
        let value = receiver.recv().unwrap();
        (value, receiver)
    })
    .await
    .unwrap()
}
