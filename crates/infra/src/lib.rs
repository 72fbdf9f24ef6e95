//! # Planroom インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはコーディネーターが依存するインターフェース（トレイト）と、
//! その具体的な実装を提供する。外部システムの詳細をカプセル化し、
//! ユースケース層をインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **オブジェクトストア**: S3 からのペイロード取得と削除
//! - **シークレット解決**: KMS で暗号化された設定値の復号
//! - **メール送信**: SMTP セッションの確立と送信
//!
//! ## 依存関係
//!
//! ```text
//! notifier → infra → domain
//!     ↘                ↑
//!       ───────────────
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - インフラ層エラー定義
//! - [`s3`] - S3 オブジェクトストア
//! - [`secret`] - シークレット解決
//! - [`notification`] - SMTP メール送信
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use planroom_infra::{s3, secret};
//!
//! async fn setup() {
//!     let store = s3::AwsS3ObjectStore::new(s3::create_client(None).await);
//!     let resolver = secret::KmsSecretResolver::new(
//!         secret::create_kms_client().await,
//!         "planroom-notifier".to_string(),
//!     );
//! }
//! ```

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod s3;
pub mod secret;

pub use error::InfraError;
pub use notification::{MailSession, MailTransport};
pub use s3::ObjectStore;
pub use secret::SecretResolver;
