//! # Planroom ドメイン層
//!
//! 入札招待メール配信のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **不変な値**: デコード済みの [`invitation::BatchRequest`] は変更しない
//! - **I/O なし**: S3・SMTP・KMS には一切依存しない（インフラ層が実装する）
//! - **明示的な集約**: 宛先ごとの送信結果は [`notification::BatchResult`] に
//!   `(宛先, 原因)` の列として保持し、失敗を隠さない
//!
//! ## 依存関係の方向
//!
//! ```text
//! notifier → infra → domain
//!     ↘               ↑
//!       ──────────────
//! ```
//!
//! ## モジュール構成
//!
//! - [`invitation`] - S3 に置かれる招待ペイロード（JSON）
//! - [`notification`] - メールメッセージと送信結果
//! - [`record`] - ストレージイベントレコードの参照先と処理結果

pub mod invitation;
pub mod notification;
pub mod record;
