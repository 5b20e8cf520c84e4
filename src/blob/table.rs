//! Blob Table.
use super::{BlobId, BlobRecord};
use crate::{ErrorKind, Result};

/// `BlobTable::allocate()`による割当結果.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// 既存のblobが割り当てられた.
    Reused(BlobId),

    /// 新しく追加されたblobが割り当てられた.
    Created(BlobId),
}
impl Allocation {
    /// 割り当てられたblobの識別子を返す.
    pub fn blob_id(self) -> BlobId {
        match self {
            Allocation::Reused(id) | Allocation::Created(id) => id,
        }
    }
}

/// 各blobのロック状態と書き込み位置を保持するテーブル.
///
/// 完全にメモリ上のデータ構造であり、状態は永続化されない.
/// また、内部で排他制御は行わないので、複数スレッドから利用する場合には`BlobManager`を経由する必要がある.
///
/// # 割当戦略
///
/// テーブルは探索カーソルを保持しており、割当要求の度にカーソルを一つ進めて、
/// その位置から(末尾に達したら先頭に戻りつつ)「ロックされておらず、かつ満杯ではない」blobを線形に探索する.
/// カーソルは呼び出しを跨いで保持されるので、割当先はラウンドロビンで分散される.
///
/// 条件を満たすblobが一つも存在しない場合には、上限数に達していなければ新しいblobを末尾に追加して、それを割り当てる.
///
/// 探索の計算量は、最悪でblob数に比例する.
#[derive(Debug)]
pub struct BlobTable {
    blobs: Vec<BlobRecord>,
    max_blob_size: u64,
    max_blobs: usize,
    cursor: usize,
}
impl BlobTable {
    /// テーブルを構築する.
    ///
    /// `blobs`には、初期状態のblob群が列挙されている.
    /// 一つ以上、かつ`max_blobs`以下の要素が含まれている必要がある.
    pub fn new(blobs: Vec<BlobRecord>, max_blob_size: u64, max_blobs: usize) -> Result<Self> {
        track_assert!(
            !blobs.is_empty(),
            ErrorKind::InvalidArgument,
            "The initial number of blobs must be >= 1"
        );
        track_assert!(
            blobs.len() <= max_blobs,
            ErrorKind::InvalidArgument,
            "Too many initial blobs: {} (max_blobs={})",
            blobs.len(),
            max_blobs
        );
        track_assert!(
            blobs.iter().all(|b| !b.locked),
            ErrorKind::InvalidArgument,
            "Initial blobs must be unlocked"
        );
        Ok(BlobTable {
            blobs,
            max_blob_size,
            max_blobs,
            cursor: 0,
        })
    }

    /// 書き込み可能なblobを探索し、それをロックした上で返す.
    ///
    /// 既存のblobが全てロック中か満杯であり、かつblob数が上限に達している場合には`None`が返される.
    /// その場合、テーブル内のロック状態は変化しない(探索カーソルは進む).
    pub fn allocate(&mut self) -> Option<Allocation> {
        self.advance_cursor();
        if self.blobs[self.cursor].is_available(self.max_blob_size) {
            return Some(Allocation::Reused(self.lock(self.cursor)));
        }

        let start = self.cursor;
        self.advance_cursor();
        while self.cursor != start {
            if self.blobs[self.cursor].is_available(self.max_blob_size) {
                return Some(Allocation::Reused(self.lock(self.cursor)));
            }
            self.advance_cursor();
        }

        if self.blobs.len() < self.max_blobs {
            self.blobs.push(BlobRecord::new(0));
            let index = self.blobs.len() - 1;
            Some(Allocation::Created(self.lock(index)))
        } else {
            None
        }
    }

    /// ロック中のblobの書き込み位置を更新した上で、ロックを解放する.
    ///
    /// 成功した場合には、更新前の書き込み位置が返される.
    ///
    /// `id`が「存在しない」あるいは「ロックされていない」blobを指している場合には、
    /// 何も行わずに`None`が返される.
    pub fn release(&mut self, id: BlobId, write_cursor: u64) -> Option<u64> {
        let blob = self.blobs.get_mut(id.as_usize())?;
        if !blob.locked {
            return None;
        }
        let old = blob.write_cursor;
        blob.write_cursor = write_cursor;
        blob.locked = false;
        Some(old)
    }

    /// 現在のblob群を返す.
    pub fn blobs(&self) -> &[BlobRecord] {
        &self.blobs
    }

    /// blobの容量(バイト単位)を返す.
    pub fn max_blob_size(&self) -> u64 {
        self.max_blob_size
    }

    /// blob数の上限を返す.
    pub fn max_blobs(&self) -> usize {
        self.max_blobs
    }

    fn lock(&mut self, index: usize) -> BlobId {
        debug_assert!(!self.blobs[index].locked);
        self.blobs[index].locked = true;
        BlobId::new(index)
    }

    fn advance_cursor(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.blobs.len() {
            self.cursor = 0;
        }
    }
}
