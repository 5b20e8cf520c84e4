//! [Prometheus][prometheus]用のメトリクス.
//!
//! [prometheus]: https://prometheus.io/
use prometrics::metrics::{Counter, Gauge, MetricBuilder};

/// `BlobManager`のメトリクス.
#[derive(Debug, Clone)]
pub struct BlobManagerMetrics {
    pub(crate) lock_requests: Counter,
    pub(crate) locked_blobs_by_reuse: Counter,
    pub(crate) locked_blobs_by_growth: Counter,
    pub(crate) released_blobs: Counter,
    pub(crate) committed_bytes: Counter,
    pub(crate) capacity_exceeded_failures: Counter,
    pub(crate) blobs: Gauge,
    pub(crate) max_blobs: Gauge,
    pub(crate) max_blob_size_bytes: Gauge,
}
impl BlobManagerMetrics {
    /// `request_lock`の呼び出し回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_lock_requests_total <COUNTER>
    /// ```
    pub fn lock_requests(&self) -> u64 {
        self.lock_requests.value() as u64
    }

    /// ロックを払い出したblobの数.
    ///
    /// 返り値のタプルの第一要素は`reason="reuse"`ラベルを持ち、第二要素は`reason="growth"`ラベルを持つ.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_locked_blobs_total { reason="reuse|growth" } <COUNTER>
    /// ```
    pub fn locked_blobs(&self) -> (u64, u64) {
        (
            self.locked_blobs_by_reuse.value() as u64,
            self.locked_blobs_by_growth.value() as u64,
        )
    }

    /// ロックが解放されたblobの数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_released_blobs_total <COUNTER>
    /// ```
    pub fn released_blobs(&self) -> u64 {
        self.released_blobs.value() as u64
    }

    /// 現在ロック中のblobの数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// sum(plateblob_blob_manager_locked_blobs_total) - plateblob_blob_manager_released_blobs_total
    /// ```
    pub fn locking_blobs(&self) -> u64 {
        // NOTE: 以下の順番で値を取得しないとアンダーフローする可能性がある
        let dec = self.released_blobs();
        let (reuse, growth) = self.locked_blobs();
        reuse + growth - dec
    }

    /// ロック解放時に報告された、書き込み位置の増分の合計.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_committed_bytes_total <COUNTER>
    /// ```
    pub fn committed_bytes(&self) -> u64 {
        self.committed_bytes.value() as u64
    }

    /// 空きblobが存在せず、blob数も上限に達していたために、ロックの取得に失敗した回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_capacity_exceeded_failures_total <COUNTER>
    /// ```
    pub fn capacity_exceeded_failures(&self) -> u64 {
        self.capacity_exceeded_failures.value() as u64
    }

    /// 現在のblob数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_blobs <GAUGE>
    /// ```
    pub fn blobs(&self) -> u64 {
        self.blobs.value() as u64
    }

    /// blob数の上限.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_max_blobs <GAUGE>
    /// ```
    pub fn max_blobs(&self) -> u64 {
        self.max_blobs.value() as u64
    }

    /// 各blobの容量.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// plateblob_blob_manager_max_blob_size_bytes <GAUGE>
    /// ```
    pub fn max_blob_size_bytes(&self) -> u64 {
        self.max_blob_size_bytes.value() as u64
    }

    pub(crate) fn new(builder: &MetricBuilder) -> Self {
        let mut builder = builder.clone();
        builder.namespace("plateblob").subsystem("blob_manager");
        BlobManagerMetrics {
            lock_requests: builder
                .counter("lock_requests_total")
                .help("Number of lock requests")
                .finish()
                .expect("Never fails"),
            locked_blobs_by_reuse: builder
                .counter("locked_blobs_total")
                .help("Number of locked blobs")
                .label("reason", "reuse")
                .finish()
                .expect("Never fails"),
            locked_blobs_by_growth: builder
                .counter("locked_blobs_total")
                .help("Number of locked blobs")
                .label("reason", "growth")
                .finish()
                .expect("Never fails"),
            released_blobs: builder
                .counter("released_blobs_total")
                .help("Number of released blobs")
                .finish()
                .expect("Never fails"),
            committed_bytes: builder
                .counter("committed_bytes_total")
                .help("Number of bytes committed to blobs")
                .finish()
                .expect("Never fails"),
            capacity_exceeded_failures: builder
                .counter("capacity_exceeded_failures_total")
                .help("Number of lock failures caused by no available blob")
                .finish()
                .expect("Never fails"),
            blobs: builder
                .gauge("blobs")
                .help("Number of blobs")
                .finish()
                .expect("Never fails"),
            max_blobs: builder
                .gauge("max_blobs")
                .help("Maximum number of blobs")
                .finish()
                .expect("Never fails"),
            max_blob_size_bytes: builder
                .gauge("max_blob_size_bytes")
                .help("Capacity of each blob")
                .finish()
                .expect("Never fails"),
        }
    }

    pub(crate) fn count_release(&self, old_write_cursor: u64, new_write_cursor: u64) {
        self.released_blobs.increment();
        if let Some(delta) = new_write_cursor.checked_sub(old_write_cursor) {
            self.committed_bytes.add_u64(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use prometrics::metrics::MetricBuilder;

    use super::*;

    #[test]
    fn it_works() {
        let metrics = BlobManagerMetrics::new(&MetricBuilder::new());
        metrics.locked_blobs_by_reuse.increment();
        metrics.locked_blobs_by_growth.increment();
        metrics.locked_blobs_by_growth.increment();
        assert_eq!(metrics.locked_blobs(), (1, 2));
        assert_eq!(metrics.locking_blobs(), 3);

        metrics.count_release(0, 100);
        metrics.count_release(100, 150);
        assert_eq!(metrics.released_blobs(), 2);
        assert_eq!(metrics.locking_blobs(), 1);
        assert_eq!(metrics.committed_bytes(), 150);

        // 書き込み位置が後退した場合は、増分として数えない
        metrics.count_release(150, 120);
        assert_eq!(metrics.committed_bytes(), 150);
    }
}
