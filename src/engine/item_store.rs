// ItemStore - アイテムごとのロックを持つ共有コレクション
//
// 各レコードは個別の RwLock で保護され、異なるインデックスへの更新は並行に進む。
// ストア全体のゲートはレコード単位の操作では共有ロック、
// リセットとスナップショットでは排他ロックとして取得する。

use crate::core::{Generation, ItemRecord, StatusCounts};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct ItemStore {
    gate: RwLock<()>,
    records: Vec<RwLock<ItemRecord>>,
    generation: AtomicU64,
}

impl ItemStore {
    pub fn new(records: Vec<ItemRecord>) -> Self {
        Self {
            gate: RwLock::new(()),
            records: records.into_iter().map(RwLock::new).collect(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 現在の世代番号
    pub fn generation(&self) -> Generation {
        Generation::new(self.generation.load(Ordering::SeqCst))
    }

    /// レコードの一貫したコピーを取得
    ///
    /// 範囲外のインデックスは契約違反としてパニックする。
    pub fn read(&self, index: usize) -> ItemRecord {
        let _gate = self.gate.read();
        self.slot(index).read().clone()
    }

    /// レコードをアトミックに更新
    ///
    /// クロージャ内からストアのメソッドを呼び出してはならない。
    pub fn mutate<R>(&self, index: usize, update: impl FnOnce(&mut ItemRecord) -> R) -> R {
        let _gate = self.gate.read();
        let mut record = self.slot(index).write();
        update(&mut record)
    }

    /// 指定世代がまだ有効な場合のみレコードを更新
    ///
    /// 世代が古ければ何もせず `None` を返す。
    pub fn mutate_in<R>(
        &self,
        generation: Generation,
        index: usize,
        update: impl FnOnce(&mut ItemRecord) -> R,
    ) -> Option<R> {
        let _gate = self.gate.read();
        if self.generation() != generation {
            return None;
        }
        let mut record = self.slot(index).write();
        Some(update(&mut record))
    }

    /// 全レコードの派生フィールドをリセットし、新しい世代番号を返す
    pub fn reset_derived(&self) -> Generation {
        let _gate = self.gate.write();
        for record in &self.records {
            record.write().reset();
        }
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Generation::new(next)
    }

    /// 全レコードの一貫したスナップショット
    pub fn snapshot(&self) -> Vec<ItemRecord> {
        let _gate = self.gate.write();
        self.records
            .iter()
            .map(|record| record.read().clone())
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let _gate = self.gate.write();
        let mut counts = StatusCounts::default();
        for record in &self.records {
            counts.record(record.read().status());
        }
        counts
    }

    fn slot(&self, index: usize) -> &RwLock<ItemRecord> {
        assert!(
            index < self.records.len(),
            "item index {index} out of range ({} items)",
            self.records.len()
        );
        &self.records[index]
    }
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemStore")
            .field("len", &self.records.len())
            .field("generation", &self.generation())
            .finish()
    }
}
