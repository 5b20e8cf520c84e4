//! Plate Blob Manager.
//!
//! `plateblob`は、追記専用のblob(ファイル)群への書き込み権を、並行に動作する複数のライタに払い出すためのcrate.
//!
//! タイルベースのストレージエンジンにおける書き込み受付部分に相当し、
//! 利用者は「blobのロックを取得 => データを追記 => 新しい書き込み位置を報告してロックを解放」
//! という手順でデータをコミットする.
//!
//! # 特徴
//!
//! - 一つのblobに同時に書き込めるライタは、高々一つ
//! - blobはラウンドロビンで選択されるため、書き込みが特定のblobに偏らない
//! - 満杯のblobは選択対象外となり、必要に応じて新しいblobが(上限数まで)追加される
//! - 空きがない場合は待機せずに、即座に`ErrorKind::CapacityExceeded`エラーが返される
//! - 実際のデータの読み書きや、状態の永続化は行わない
//!   - 再起動時の書き込み位置の復元は、利用者側(I/O層)の責務
//!
//! # モジュール構成
//!
//! - [blob]モジュール:
//!   - 主に[BlobManager]構造体を提供
//!   - `plateblob`の利用者が直接触るのはこの構造体
//! - [metrics]モジュール:
//!   - [Prometheus]用のメトリクスを提供
//!
//! [blob]: ./blob/index.html
//! [BlobManager]: ./blob/struct.BlobManager.html
//! [metrics]: ./metrics/index.html
//! [Prometheus]: https://prometheus.io/
#![warn(missing_docs)]
extern crate prometrics;
#[macro_use]
extern crate trackable;
#[macro_use]
extern crate slog;

pub use crate::error::{Error, ErrorKind};

pub mod blob;
pub mod metrics;

mod error;

/// crate固有の`Result`型.
pub type Result<T> = std::result::Result<T, Error>;
