// テスト用のシンクと変換の実装

use super::dispatcher::UiEvent;
use super::item_store::ItemStore;
use crate::core::{
    ImageTransform, ItemRecord, PresentationSink, ProgressUpdate, Strategy, TransformError,
};
use image::DynamicImage;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

pub fn sample_store(count: usize) -> ItemStore {
    ItemStore::new(
        (0..count)
            .map(|i| ItemRecord::new(format!("image {}", i + 1), DynamicImage::new_rgba8(2, 2)))
            .collect(),
    )
}

/// 受け取ったイベントと配送スレッド名を記録するシンク
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<UiEvent>>>,
    threads: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    pub fn thread_names(&self) -> Vec<String> {
        self.threads.lock().clone()
    }

    pub fn progress_updates(&self) -> Vec<ProgressUpdate> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Progress(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        let name = std::thread::current()
            .name()
            .unwrap_or_default()
            .to_string();
        self.threads.lock().push(name);
        self.events.lock().push(event);
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

/// 色を反転し、同時実行数の最大値を記録する変換
#[derive(Default)]
pub struct InvertTransform {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
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

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageTransform for InvertTransform {
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        std::thread::sleep(self.delay);
        let mut output = image.clone();
        output.invert();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "invert"
    }
}

/// 指定回目の呼び出しで開始を通知し、解放されるまでブロックする変換
pub struct GatedTransform {
    gate_at: usize,
    calls: AtomicUsize,
    started: Mutex<mpsc::Sender<usize>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedTransform {
    /// 変換と、(開始通知の受信側, 解放の送信側) を返す
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

/// 指定した幅の画像でパニックし、それ以外は元画像を返す変換
pub struct PanickingTransform {
    pub panic_width: u32,
}

impl ImageTransform for PanickingTransform {
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError> {
        if image.width() == self.panic_width {
            panic!("filter exploded");
        }
        Ok(image.clone())
    }

    fn name(&self) -> &'static str {
        "exploding"
    }
}
