//! # ユースケース層
//!
//! 招待ペイロードの取得から送信、後片付けまでを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: オブジェクトストアとメール送信を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: Lambda ハンドラはイベントの変換だけを行い、ロジックはここに集約
//! - **逐次処理**: レコードも宛先も順に 1 件ずつ処理する
//!
//! ## モジュール構成
//!
//! - `template_renderer`: 件名と本文の生成
//! - `dispatcher`: 1 バッチ分の送信
//! - `coordinator`: レコード単位の取得・送信・削除
//! - `operator`: 運用者アラート

pub mod coordinator;
pub mod dispatcher;
pub mod operator;
pub mod template_renderer;

pub use coordinator::{
    BatchCoordinator,
    InvocationFailure,
    RecordError,
    RecordFailure,
    RecordReport,
    StorageRecord,
};
pub use dispatcher::{DispatchError, MailDispatcher};
pub use operator::OperatorNotifier;
pub use template_renderer::InvitationRenderer;
