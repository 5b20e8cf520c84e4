//! Blobの書き込み権を管理するためのモジュール.
//!
//! このモジュールが担当するのは、各blobのロック状態と書き込み位置の管理のみで、
//! 実際のデータの読み書き等を、この中で行うことは無い.
use std::fmt;

pub use self::builder::BlobManagerBuilder;
pub use self::manager::BlobManager;

pub(crate) use self::table::{Allocation, BlobTable};

mod builder;
mod manager;
mod table;

/// 1MBのバイト数.
pub const MEGABYTE: u64 = 1024 * 1024;

/// Blobの識別子.
///
/// `BlobManager`内でのblobの位置(インデックス)そのものであり、
/// 一度割り当てられたblobの識別子が変わることはない.
///
/// 利用者(I/O層)は、この値を用いて物理的なblobファイルを特定する.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct BlobId(usize);
impl BlobId {
    /// 指定された値を持つ`BlobId`を生成する.
    pub fn new(id: usize) -> Self {
        BlobId(id)
    }

    /// 識別子の値を返す.
    pub fn as_usize(self) -> usize {
        self.0
    }
}
impl From<usize> for BlobId {
    fn from(from: usize) -> Self {
        BlobId(from)
    }
}
impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 個々のblobの状態.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobRecord {
    /// ライタがこのblobへの書き込み権を保持しているかどうか.
    pub locked: bool,

    /// コミット済みのデータの終端位置(バイト単位).
    ///
    /// この値が`BlobManager::max_blob_size()`以上の場合には、blobは満杯であるとみなされる.
    pub write_cursor: u64,
}
impl BlobRecord {
    /// 指定された書き込み位置を持つ、ロックされていない`BlobRecord`を生成する.
    pub fn new(write_cursor: u64) -> Self {
        BlobRecord {
            locked: false,
            write_cursor,
        }
    }

    /// 容量が`max_blob_size`のblobとして、満杯かどうかを判定する.
    pub fn is_full(&self, max_blob_size: u64) -> bool {
        self.write_cursor >= max_blob_size
    }

    /// 新たに書き込み権を払い出すことができるかどうかを判定する.
    pub fn is_available(&self, max_blob_size: u64) -> bool {
        !self.locked && !self.is_full(max_blob_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_id_works() {
        let id = BlobId::new(3);
        assert_eq!(id.as_usize(), 3);
        assert_eq!(BlobId::from(3), id);
        assert_eq!(id.to_string(), "3");
        assert!(BlobId::new(2) < id);
    }

    #[test]
    fn blob_record_availability() {
        let mut record = BlobRecord::new(0);
        assert!(record.is_available(10));

        record.locked = true;
        assert!(!record.is_available(10));

        record.locked = false;
        record.write_cursor = 9;
        assert!(!record.is_full(10));
        assert!(record.is_available(10));

        record.write_cursor = 10;
        assert!(record.is_full(10));
        assert!(!record.is_available(10));

        record.write_cursor = 11;
        assert!(!record.is_available(10));
    }
}
