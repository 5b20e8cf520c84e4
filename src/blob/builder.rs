use prometrics::metrics::MetricBuilder;
use slog::{Discard, Logger};
use std::cmp;

use super::{BlobManager, BlobRecord, BlobTable, MEGABYTE};
use crate::metrics::BlobManagerMetrics;
use crate::{ErrorKind, Result};

/// `BlobManager`のビルダ.
#[derive(Debug, Clone)]
pub struct BlobManagerBuilder {
    max_blob_size_mb: u64,
    initial_blobs: usize,
    max_blobs: usize,
    blob_offsets: Vec<u64>,
    metrics: MetricBuilder,
    logger: Logger,
}
impl BlobManagerBuilder {
    /// デフォルト設定で`BlobManagerBuilder`インスタンスを生成する.
    pub fn new() -> Self {
        BlobManagerBuilder {
            max_blob_size_mb: 2048,
            initial_blobs: 1,
            max_blobs: 4096,
            blob_offsets: Vec::new(),
            metrics: MetricBuilder::new(),
            logger: Logger::root(Discard, o!()),
        }
    }

    /// 各blobの容量を、メガバイト単位で設定する.
    ///
    /// 書き込み位置がこの値(をバイトに換算したもの)以上となったblobは、満杯とみなされ、
    /// 以後は書き込み先として選択されなくなる.
    ///
    /// デフォルト値は`2048`.
    pub fn max_blob_size_mb(&mut self, size: u64) -> &mut Self {
        self.max_blob_size_mb = size;
        self
    }

    /// 初期状態のblob数を設定する.
    ///
    /// `1`以上、かつ`max_blobs`以下の値を指定する必要がある.
    /// この範囲外の値が指定された場合には、`finish()`呼び出し時にエラーが返される.
    ///
    /// デフォルト値は`1`.
    pub fn initial_blobs(&mut self, n: usize) -> &mut Self {
        self.initial_blobs = n;
        self
    }

    /// blob数の上限を設定する.
    ///
    /// 書き込み可能なblobが存在しない場合には、この上限に達するまで新しいblobが追加される.
    ///
    /// デフォルト値は`4096`.
    pub fn max_blobs(&mut self, n: usize) -> &mut Self {
        self.max_blobs = n;
        self
    }

    /// 既存のblob群の書き込み位置を設定する.
    ///
    /// `BlobManager`自体は状態を永続化しないため、再起動時には、
    /// 利用者(I/O層)が物理的なblobファイル等から復元した書き込み位置を、ここで与える必要がある.
    ///
    /// `offsets`の`i`番目の要素が、識別子`i`のblobの書き込み位置となる.
    /// 初期状態のblob数は`max(initial_blobs, offsets.len())`となり、
    /// `offsets`に含まれないblobの書き込み位置は`0`となる.
    ///
    /// デフォルトでは、全てのblobの書き込み位置は`0`.
    pub fn blob_offsets<I>(&mut self, offsets: I) -> &mut Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.blob_offsets = offsets.into_iter().collect();
        self
    }

    /// メトリクス用の共通設定を登録する.
    ///
    /// デフォルト値は`MetricBuilder::new()`.
    pub fn metrics(&mut self, metrics: MetricBuilder) -> &mut Self {
        self.metrics = metrics;
        self
    }

    /// `BlobManager`用の logger を登録する
    pub fn logger(&mut self, logger: Logger) -> &mut Self {
        self.logger = logger;
        self
    }

    /// 指定された設定で`BlobManager`を構築する.
    pub fn finish(&self) -> Result<BlobManager> {
        let max_blob_size = track_assert_some!(
            self.max_blob_size_mb.checked_mul(MEGABYTE),
            ErrorKind::InvalidArgument,
            "Too large blob size: {} MB",
            self.max_blob_size_mb
        );
        track_assert!(
            self.initial_blobs >= 1,
            ErrorKind::InvalidArgument,
            "The initial number of blobs must be >= 1: {}",
            self.initial_blobs
        );

        let count = cmp::max(self.initial_blobs, self.blob_offsets.len());
        let mut blobs = self
            .blob_offsets
            .iter()
            .map(|&offset| BlobRecord::new(offset))
            .collect::<Vec<_>>();
        blobs.resize(count, BlobRecord::new(0));
        let table = track!(BlobTable::new(blobs, max_blob_size, self.max_blobs))?;

        let metrics = BlobManagerMetrics::new(&self.metrics);
        metrics.blobs.set(count as f64);
        metrics.max_blobs.set(self.max_blobs as f64);
        metrics.max_blob_size_bytes.set(max_blob_size as f64);

        info!(
            self.logger,
            "Blob manager is initialized";
            "blobs" => count,
            "max_blobs" => self.max_blobs,
            "max_blob_size" => max_blob_size
        );
        Ok(BlobManager::new_with_table(
            table,
            metrics,
            self.logger.clone(),
        ))
    }
}
impl Default for BlobManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;
    use crate::blob::BlobId;

    #[test]
    fn default_settings_work() -> TestResult {
        let manager = track!(BlobManagerBuilder::new().finish())?;
        assert_eq!(manager.max_blob_size(), 2048 * MEGABYTE);
        assert_eq!(track!(manager.blob_count())?, 1);
        assert_eq!(manager.metrics().max_blobs(), 4096);
        Ok(())
    }

    #[test]
    fn zero_initial_blobs_is_rejected() {
        let e = BlobManagerBuilder::new()
            .initial_blobs(0)
            .finish()
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn initial_blobs_over_max_blobs_is_rejected() {
        let e = BlobManagerBuilder::new()
            .initial_blobs(5)
            .max_blobs(4)
            .finish()
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn too_large_blob_size_is_rejected() {
        let e = BlobManagerBuilder::new()
            .max_blob_size_mb(u64::max_value())
            .finish()
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn blob_offsets_work() -> TestResult {
        let manager = track!(BlobManagerBuilder::new()
            .max_blob_size_mb(1)
            .initial_blobs(4)
            .max_blobs(4)
            .blob_offsets(vec![MEGABYTE, 10])
            .finish())?;
        let blobs = track!(manager.blobs())?;
        assert_eq!(blobs.len(), 4);
        assert_eq!(blobs[0], BlobRecord::new(MEGABYTE));
        assert_eq!(blobs[1], BlobRecord::new(10));
        assert_eq!(blobs[2], BlobRecord::new(0));
        assert_eq!(blobs[3], BlobRecord::new(0));

        assert_eq!(track!(manager.request_lock(1))?, BlobId::new(1));
        assert_eq!(track!(manager.request_lock(1))?, BlobId::new(2));
        assert_eq!(track!(manager.request_lock(1))?, BlobId::new(3));

        // blob 0 は満杯
        let e = manager.request_lock(1).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::CapacityExceeded);
        Ok(())
    }

    #[test]
    fn blob_offsets_extend_initial_blobs() -> TestResult {
        let manager = track!(BlobManagerBuilder::new()
            .initial_blobs(1)
            .max_blobs(3)
            .blob_offsets(vec![1, 2, 3])
            .finish())?;
        assert_eq!(track!(manager.blob_count())?, 3);
        assert_eq!(manager.metrics().blobs(), 3);

        let e = BlobManagerBuilder::new()
            .initial_blobs(1)
            .max_blobs(2)
            .blob_offsets(vec![1, 2, 3])
            .finish()
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::InvalidArgument);
        Ok(())
    }
}
