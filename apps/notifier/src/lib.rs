//! # Planroom Notifier ライブラリ
//!
//! 入札招待メール送信 Lambda のユースケースとハンドラを公開する。
//! 統合テスト用に内部モジュールへのアクセスを提供する。

pub mod config;
pub mod handler;
pub mod usecase;
