// バッチ処理システムのトレイト定義
// 外部コラボレーター（変換関数・表示層）との境界

use super::error::TransformError;
use super::types::{ItemRecord, ProgressUpdate, Strategy};
use image::DynamicImage;
use mockall::automock;

/// 画像変換関数の抽象化トレイト
///
/// 入力のみに依存する純粋関数として扱う。時間がかかる可能性があり、
/// 必ずブロッキング可能なスレッドから呼び出される。
#[automock]
pub trait ImageTransform: Send + Sync {
    /// 画像を変換する
    fn transform(&self, image: &DynamicImage) -> Result<DynamicImage, TransformError>;

    /// 変換の名前を取得
    fn name(&self) -> &'static str;
}

/// 表示層への通知を抽象化するトレイト
///
/// 全てのメソッドは単一のコーディネータースレッド上で呼び出される。
#[automock]
pub trait PresentationSink: Send {
    /// ラン開始時の通知
    fn on_run_started(&mut self, strategy: Strategy, total: usize);

    /// アイテムの状態変化
    fn on_item_changed(&mut self, index: usize, record: ItemRecord);

    /// 進捗とステータス文字列の更新
    fn on_progress(&mut self, update: ProgressUpdate);

    /// 全アイテムの処理完了
    fn on_run_finished(&mut self);

    /// キャンセルによる停止
    fn on_run_stopped(&mut self);

    /// 変換エラーなどの通知
    fn on_error(&mut self, message: String);
}

impl PresentationSink for Box<dyn PresentationSink> {
    fn on_run_started(&mut self, strategy: Strategy, total: usize) {
        self.as_mut().on_run_started(strategy, total)
    }

    fn on_item_changed(&mut self, index: usize, record: ItemRecord) {
        self.as_mut().on_item_changed(index, record)
    }

    fn on_progress(&mut self, update: ProgressUpdate) {
        self.as_mut().on_progress(update)
    }

    fn on_run_finished(&mut self) {
        self.as_mut().on_run_finished()
    }

    fn on_run_stopped(&mut self) {
        self.as_mut().on_run_stopped()
    }

    fn on_error(&mut self, message: String) {
        self.as_mut().on_error(message)
    }
}
