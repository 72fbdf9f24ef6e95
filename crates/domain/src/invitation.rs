//! # 入札招待ペイロード
//!
//! プランルーム側が S3 に書き込む JSON ペイロードのドメインモデル。
//! 1 オブジェクトが 1 バッチ（共通の案件情報 + 宛先の列）に対応する。
//!
//! ## ワイヤーフォーマット
//!
//! ```json
//! {
//!   "jobName": "Riverside Medical Office",
//!   "expiration": "on March 3, 2025",
//!   "message": "<p>Pre-bid meeting on site.</p>",
//!   "recipients": [ { "to": "estimator@example.com", "link": "https://..." } ]
//! }
//! ```
//!
//! - `message` は省略可能（省略時は空文字列）。HTML を含んでよい
//! - `jobName` / `expiration` / `recipients` は必須。欠けている場合はデコードエラー
//! - 未知のフィールドは無視する

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// ペイロードのデコードエラー
///
/// JSON として不正、または形が合わない場合に返す。
/// 同一起動内での再試行は行わない。
#[derive(Debug, Error)]
#[error("招待ペイロードのデコードに失敗: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// 宛先
///
/// 1 宛先につきちょうど 1 通のメールを送信する。
/// アドレス・リンクともにここでは検証しない（送信時に SMTP 側で失敗する）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    to:   String,
    link: String,
}

impl Recipient {
    pub fn new(to: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            to:   to.into(),
            link: link.into(),
        }
    }

    /// 送信先メールアドレス
    pub fn to(&self) -> &str {
        &self.to
    }

    /// 入札資料へのリンク（宛先ごとに異なる）
    pub fn link(&self) -> &str {
        &self.link
    }
}

/// 招待バッチ
///
/// 1 件のストレージイベントレコードからデコードされ、処理完了後に破棄される。
/// `job_name` と `expiration` は加工せずにそのまま本文へ埋め込む。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    job_name:   String,
    /// 表示用に整形済みの有効期限（パースしない）
    expiration: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    message:    String,
    recipients: Vec<Recipient>,
}

impl BatchRequest {
    pub fn new(
        job_name: impl Into<String>,
        expiration: impl Into<String>,
        message: impl Into<String>,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            expiration: expiration.into(),
            message: message.into(),
            recipients,
        }
    }

    /// JSON バイト列からデコードする
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// ワイヤーフォーマットの JSON にエンコードする
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    /// 自由記述メッセージ（空文字列の場合あり）
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 宛先（ペイロード内の順序を保持）
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }
}

/// `null` を空文字列として読む
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 前後の空白を除いて空かどうか
///
/// メール本文でメッセージブロックを出すかどうかの判定に使う。
pub fn is_blank(message: &str) -> bool {
    message.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn recipients(count: usize) -> Vec<Recipient> {
        (1..=count)
            .map(|i| {
                Recipient::new(
                    format!("estimator{i}@example.com"),
                    format!("https://planroom.example.com/bid/{i}"),
                )
            })
            .collect()
    }

    #[rstest]
    #[case::メッセージなし_宛先0件("", 0)]
    #[case::メッセージなし_宛先1件("", 1)]
    #[case::メッセージなし_宛先複数("", 5)]
    #[case::メッセージあり_宛先0件("<p>Pre-bid meeting at 10am.</p>", 0)]
    #[case::メッセージあり_宛先1件("<p>Pre-bid meeting at 10am.</p>", 1)]
    #[case::メッセージあり_宛先複数("Bring your own hard hat.", 5)]
    fn エンコードしてデコードすると元に戻る(#[case] message: &str, #[case] count: usize) {
        let request = BatchRequest::new(
            "Riverside Medical Office",
            "on March 3, 2025",
            message,
            recipients(count),
        );

        let bytes = request.to_json().unwrap();
        let decoded = BatchRequest::from_json(&bytes).unwrap();

        assert_eq!(decoded, request);
    }

    #[test]
    fn キャメルケースのワイヤーフォーマットをデコードできる() {
        let json = br#"{
            "jobName": "Riverside Medical Office",
            "expiration": "on March 3, 2025",
            "message": "Walkthrough Friday",
            "recipients": [
                { "to": "a@example.com", "link": "https://planroom.example.com/a" },
                { "to": "b@example.com", "link": "https://planroom.example.com/b" }
            ]
        }"#;

        let request = BatchRequest::from_json(json).unwrap();

        assert_eq!(request.job_name(), "Riverside Medical Office");
        assert_eq!(request.expiration(), "on March 3, 2025");
        assert_eq!(request.message(), "Walkthrough Friday");
        assert_eq!(request.recipients().len(), 2);
        assert_eq!(request.recipients()[0].to(), "a@example.com");
        assert_eq!(request.recipients()[1].link(), "https://planroom.example.com/b");
    }

    #[rstest]
    #[case::省略(br#"{"jobName":"J","expiration":"tomorrow","recipients":[]}"#.as_slice())]
    #[case::null(br#"{"jobName":"J","expiration":"tomorrow","message":null,"recipients":[]}"#.as_slice())]
    fn messageが省略またはnullの場合は空文字列になる(#[case] json: &[u8]) {
        let request = BatchRequest::from_json(json).unwrap();

        assert_eq!(request.message(), "");
    }

    #[test]
    fn 未知のフィールドは無視する() {
        let json = br#"{"jobName":"J","expiration":"e","recipients":[],"bidDue":"2025-03-03"}"#;

        assert!(BatchRequest::from_json(json).is_ok());
    }

    #[rstest]
    #[case::不正なjson(b"{not json".as_slice())]
    #[case::空のバイト列(b"".as_slice())]
    #[case::recipientsが配列でない(br#"{"jobName":"J","expiration":"e","recipients":"a@example.com"}"#.as_slice())]
    #[case::recipientsが欠けている(br#"{"jobName":"J","expiration":"e"}"#.as_slice())]
    #[case::宛先にlinkがない(br#"{"jobName":"J","expiration":"e","recipients":[{"to":"a@example.com"}]}"#.as_slice())]
    #[case::トップレベルが配列(b"[]".as_slice())]
    fn 形の合わないペイロードはデコードエラーになる(#[case] bytes: &[u8]) {
        let result = BatchRequest::from_json(bytes);

        assert!(result.is_err());
    }

    #[test]
    fn デコードエラーのメッセージに原因が含まれる() {
        let err = BatchRequest::from_json(b"{").unwrap_err();

        assert!(err.to_string().starts_with("招待ペイロードのデコードに失敗: "));
    }

    #[rstest]
    #[case("", true)]
    #[case("   ", true)]
    #[case("\n\t \r\n", true)]
    #[case("hello", false)]
    #[case("  <p>hi</p>  ", false)]
    fn is_blankは前後の空白を除いて判定する(#[case] message: &str, #[case] expected: bool) {
        assert_eq!(is_blank(message), expected);
    }
}
