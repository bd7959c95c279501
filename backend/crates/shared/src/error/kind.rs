//! Failure Kind - Classification of pipeline failures
//!
//! Defines the [`FailureKind`] enum reported to the host application.

use serde::Serialize;

/// 失敗種別の列挙体
///
/// アテステーション実行が失敗した原因の分類を定義します。
/// ホスト側はこの分類と失敗回数をもとに再試行や表示を判断します。
///
/// ## Notes
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::FailureKind;
///
/// let kind = FailureKind::Transport;
/// assert!(kind.is_retryable());
/// assert_eq!(kind.as_str(), "transport");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FailureKind {
    /// 接続失敗・タイムアウト・名前解決失敗
    Transport,
    /// 2xx 以外の HTTP ステータス
    HttpStatus,
    /// JSON の不整合、必須フィールドの欠落
    Decode,
    /// 端末インテグリティサービス自体の失敗
    IntegrityService,
    /// 永続化ストアへの読み書き失敗
    Storage,
    /// 設定値の不備
    Config,
}

impl FailureKind {
    /// 後続の実行で再試行する価値があるかどうか
    ///
    /// 通信系の失敗のみ `true` を返します。それ以外はその実行に対して終端です。
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::FailureKind;
    /// assert!(FailureKind::Transport.is_retryable());
    /// assert!(!FailureKind::HttpStatus.is_retryable());
    /// ```
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Transport)
    }

    /// ログ出力向けの文字列表現を取得
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::HttpStatus => "http_status",
            FailureKind::Decode => "decode",
            FailureKind::IntegrityService => "integrity_service",
            FailureKind::Storage => "storage",
            FailureKind::Config => "config",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
