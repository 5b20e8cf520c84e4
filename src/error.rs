use trackable::error::ErrorKindExt;

/// crate固有のエラー型.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(trackable::error::TrackableError<ErrorKind>);
impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ErrorKind::Other.cause(e.to_string()).into()
    }
}

/// 発生し得るエラーの種別.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 引数が不正.
    ///
    /// `BlobManager`の構築時に、不正なパラメータが指定された場合に返される.
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者側のプログラムを修正して入力を正しくする
    InvalidArgument,

    /// 書き込み可能なblobが存在せず、blob数も上限に達している.
    ///
    /// 全てのblobがロック中か満杯であり、かつ新しいblobを追加する余地がない場合に返される.
    /// このエラーが返された場合でも、ロックされたblobは一つも存在しない.
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者が時間をおいてリトライする
    /// - blob数の上限を引き上げた上で、再構築を行う
    CapacityExceeded,

    /// その他エラー.
    ///
    /// E.g., 内部のmutexが(パニックにより)汚染されている
    ///
    /// # 典型的な対応策
    ///
    /// - `BlobManager`を作り直す
    Other,
}
impl trackable::error::ErrorKind for ErrorKind {}
