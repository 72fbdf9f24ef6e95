//! # ストレージイベントレコード
//!
//! S3 イベントの 1 レコードが指すオブジェクトと、そのレコードの処理結果。
//!
//! オブジェクトストアが未処理作業の唯一の永続記録であり、
//! オブジェクトの削除がシステムの認識する唯一の状態遷移である。

use derive_more::Display;

/// ペイロードオブジェクトの所在
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("s3://{bucket}/{key}")]
pub struct ObjectLocator {
    pub bucket: String,
    /// URL デコード済みのオブジェクトキー
    pub key:    String,
}

impl ObjectLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key:    key.into(),
        }
    }
}

/// レコードの終端状態
///
/// - `Deleted`: 取得・デコード・全宛先への送信・削除がすべて成功した
/// - `Retained`: いずれかの段階で失敗し、オブジェクトを残した（手動調査・再処理用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RecordOutcome {
    Deleted,
    Retained,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_locatorはs3のuri形式で表示される() {
        let locator = ObjectLocator::new("planroom-invitations", "2025/03/job 42.json");

        assert_eq!(
            locator.to_string(),
            "s3://planroom-invitations/2025/03/job 42.json"
        );
    }

    #[test]
    fn record_outcomeはスネークケースで表示される() {
        assert_eq!(RecordOutcome::Deleted.to_string(), "deleted");
        assert_eq!(RecordOutcome::Retained.to_string(), "retained");
    }
}
