//! # Planroom 共有ユーティリティ
//!
//! ドメイン層・インフラ層・Lambda アプリから共通で使うユーティリティ。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は tracing 系に限定する

pub mod event_log;
pub mod observability;
