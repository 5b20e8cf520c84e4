use slog::Logger;
use std::sync::{Mutex, MutexGuard};

use super::{Allocation, BlobId, BlobManagerBuilder, BlobRecord, BlobTable};
use crate::metrics::BlobManagerMetrics;
use crate::{Error, ErrorKind, Result};

/// 複数のライタに対して、blobへの排他的な書き込み権を払い出すための構造体.
///
/// 全ての操作は、内部の単一のmutexによって直列化される.
/// そのため`Arc`経由で複数スレッドから共有して利用することができる.
///
/// # 使用例
///
/// ```
/// # extern crate plateblob;
/// use plateblob::blob::BlobManager;
///
/// # fn run() -> plateblob::Result<()> {
/// let manager = BlobManager::new(1, 1, 2)?;
///
/// // 書き込み先のblobをロックする
/// let id = manager.request_lock(512)?;
///
/// // ... ここでI/O層が`id`に対応するblobファイルにデータを追記する ...
///
/// // 新しい書き込み位置を報告して、ロックを解放する(コミット)
/// manager.release_lock(id, 512)?;
/// # Ok(())
/// # }
/// # fn main() {
/// #     run().unwrap();
/// # }
/// ```
///
/// # 注意
///
/// 空きblobが存在しない場合に、`request_lock`が他のライタによるロック解放を待機することはない.
/// 即座に`ErrorKind::CapacityExceeded`エラーが返されるので、リトライの要否は利用者側で判断する必要がある.
#[derive(Debug)]
pub struct BlobManager {
    table: Mutex<BlobTable>,
    max_blob_size: u64,
    max_blobs: usize,
    metrics: BlobManagerMetrics,
    logger: Logger,
}
impl BlobManager {
    /// 新しい`BlobManager`インスタンスを生成する.
    ///
    /// `max_blob_size_mb`は各blobの容量(メガバイト単位)で、
    /// `initial_blobs`個の空のblobを保持した状態で構築される.
    /// blob数は、必要に応じて`max_blobs`まで増加する.
    ///
    /// `initial_blobs`が`0`の場合には`ErrorKind::InvalidArgument`エラーが返される.
    ///
    /// より細かい設定を行いたい場合には`BlobManagerBuilder`を使用すること.
    pub fn new(max_blob_size_mb: u64, initial_blobs: usize, max_blobs: usize) -> Result<Self> {
        track!(BlobManagerBuilder::new()
            .max_blob_size_mb(max_blob_size_mb)
            .initial_blobs(initial_blobs)
            .max_blobs(max_blobs)
            .finish())
    }

    pub(crate) fn new_with_table(
        table: BlobTable,
        metrics: BlobManagerMetrics,
        logger: Logger,
    ) -> Self {
        let max_blob_size = table.max_blob_size();
        let max_blobs = table.max_blobs();
        BlobManager {
            table: Mutex::new(table),
            max_blob_size,
            max_blobs,
            metrics,
            logger,
        }
    }

    /// 現在のblob数を返す.
    pub fn blob_count(&self) -> Result<usize> {
        let table = track!(self.lock_table())?;
        Ok(table.blobs().len())
    }

    /// blob数の上限を返す.
    pub fn max_blobs(&self) -> usize {
        self.max_blobs
    }

    /// 各blobの容量(バイト単位)を返す.
    pub fn max_blob_size(&self) -> u64 {
        self.max_blob_size
    }

    /// 全てのblobの現在の状態を返す.
    ///
    /// 返り値のベクタの`i`番目の要素が、識別子`i`のblobに対応する.
    pub fn blobs(&self) -> Result<Vec<BlobRecord>> {
        let table = track!(self.lock_table())?;
        Ok(table.blobs().to_vec())
    }

    /// 指定されたblobの現在の状態を返す.
    ///
    /// 存在しないblobが指定された場合には`None`が返される.
    pub fn blob(&self, id: BlobId) -> Result<Option<BlobRecord>> {
        let table = track!(self.lock_table())?;
        Ok(table.blobs().get(id.as_usize()).cloned())
    }

    /// 少なくとも`size`バイトを書き込むためのblobを選択し、そのロックを取得する.
    ///
    /// 返されたblobへの書き込み権は、対応する`release_lock`が呼ばれるまで、呼び出し元が専有する.
    ///
    /// `size`は参考値であり、選択されたblobの残り容量との比較は行われない.
    /// blobは「満杯かどうか」のみによって選択対象から外される.
    ///
    /// 全てのblobがロック中あるいは満杯であり、かつblob数が上限に達している場合には、
    /// `ErrorKind::CapacityExceeded`エラーが返される.
    pub fn request_lock(&self, size: u64) -> Result<BlobId> {
        self.metrics.lock_requests.increment();
        let (allocation, blobs) = {
            let mut table = track!(self.lock_table())?;
            let allocation = table.allocate();
            (allocation, table.blobs().len())
        };
        let allocation = match allocation {
            Some(allocation) => allocation,
            None => {
                self.metrics.capacity_exceeded_failures.increment();
                warn!(
                    self.logger,
                    "No available blob";
                    "blobs" => blobs,
                    "size" => size
                );
                track_panic!(
                    ErrorKind::CapacityExceeded,
                    "Unable to create more blobs: the blob limit has been reached (max_blobs={})",
                    blobs
                );
            }
        };
        match allocation {
            Allocation::Reused(_) => {
                self.metrics.locked_blobs_by_reuse.increment();
            }
            Allocation::Created(id) => {
                self.metrics.locked_blobs_by_growth.increment();
                self.metrics.blobs.set(blobs as f64);
                info!(self.logger, "New blob is created"; "blob_id" => id.as_usize(), "blobs" => blobs);
            }
        }

        let id = allocation.blob_id();
        debug!(self.logger, "Blob is locked"; "blob_id" => id.as_usize(), "size" => size);
        Ok(id)
    }

    /// blobの書き込み位置を`offset`に更新した上で、ロックを解放する.
    ///
    /// これにより、blobへの書き込みがコミットされたことになる.
    /// 以後、そのblobが満杯でなければ、再び`request_lock`の選択対象となる.
    ///
    /// # 事前条件
    ///
    /// - `id`は`request_lock`で取得済み、かつ未解放のblobである
    /// - `offset`は、そのblobの以前の書き込み位置以上である
    ///
    /// 前者が満たされていない場合はパニックする.
    /// 後者の検証は行わない.
    pub fn release_lock(&self, id: BlobId, offset: u64) -> Result<()> {
        let released = {
            let mut table = track!(self.lock_table())?;
            table.release(id, offset)
        };

        // NOTE: mutexを汚染しないように、ガードを解放してからパニックさせる
        let old_offset = released.unwrap_or_else(|| panic!("Blob {} is not locked", id));
        self.metrics.count_release(old_offset, offset);
        debug!(
            self.logger,
            "Blob is released";
            "blob_id" => id.as_usize(),
            "old_offset" => old_offset,
            "offset" => offset
        );
        Ok(())
    }

    /// `BlobManager`のメトリクスを返す.
    pub fn metrics(&self) -> &BlobManagerMetrics {
        &self.metrics
    }

    fn lock_table(&self) -> Result<MutexGuard<BlobTable>> {
        self.table.lock().map_err(|e| track!(Error::from(e)))
    }
}
