//! # バッチコーディネーター
//!
//! ストレージイベントのレコードを 1 件ずつ処理する。
//!
//! ## 状態遷移（1 レコード）
//!
//! ```text
//! Fetching → Decoding → Dispatching → Deleting → Deleted
//!     ↓          ↓            ↓            ↓
//!  Retained   Retained     Retained     Retained
//! ```
//!
//! - どの段階で失敗してもオブジェクトは残し、運用者に通知して次のレコードへ進む
//! - 1 宛先でも送信に失敗したバッチのオブジェクトは削除しない
//! - 全レコードの処理後、失敗をまとめて [`InvocationFailure`] として返す

use std::{fmt, sync::Arc};

use planroom_domain::{
    invitation::{BatchRequest, DecodeError},
    record::{ObjectLocator, RecordOutcome},
};
use planroom_infra::{InfraError, s3::ObjectStore};
use planroom_shared::{
    event_log::{error as error_field, event},
    log_business_event,
};
use thiserror::Error;
use tracing::Instrument as _;

use super::{DispatchError, MailDispatcher, OperatorNotifier};

/// ストレージイベントの 1 レコード
///
/// イベントから取り出したままの値。キーは URL エンコードされている。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageRecord {
    pub bucket: Option<String>,
    pub key:    Option<String>,
}

impl StorageRecord {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            key:    Some(key.into()),
        }
    }

    /// バケット名とデコード済みキーからオブジェクトの所在を得る
    ///
    /// S3 イベントのキーは空白が `+` に、その他の文字がパーセントエンコードされている。
    pub fn locate(&self) -> Result<ObjectLocator, RecordError> {
        let bucket = self
            .bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| RecordError::InvalidRecord("バケット名がありません".to_string()))?;
        let raw_key = self
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RecordError::InvalidRecord("オブジェクトキーがありません".to_string()))?;

        let key = urlencoding::decode(&raw_key.replace('+', " "))
            .map_err(|e| RecordError::InvalidRecord(format!("キーをデコードできません {raw_key}: {e}")))?
            .into_owned();

        Ok(ObjectLocator::new(bucket, key))
    }
}

impl fmt::Display for StorageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s3://{}/{}",
            self.bucket.as_deref().unwrap_or("<unknown>"),
            self.key.as_deref().unwrap_or("<unknown>")
        )
    }
}

/// レコード単位のエラー
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("ペイロードの取得に失敗: {0}")]
    Fetch(#[source] InfraError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("ペイロードの削除に失敗: {0}")]
    Delete(#[source] InfraError),

    #[error("不正なレコード: {0}")]
    InvalidRecord(String),
}

impl RecordError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => error_field::kind::FETCH,
            Self::Decode(_) => error_field::kind::DECODE,
            Self::Dispatch(_) => error_field::kind::DISPATCH,
            Self::Delete(_) => error_field::kind::DELETE,
            Self::InvalidRecord(_) => error_field::kind::INVALID_RECORD,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::Fetch(_) | Self::Delete(_) => error_field::category::INFRASTRUCTURE,
            Self::Dispatch(_) => error_field::category::EXTERNAL_SERVICE,
            Self::Decode(_) | Self::InvalidRecord(_) => error_field::category::PAYLOAD,
        }
    }
}

/// 失敗したレコードとその原因
#[derive(Debug, Error)]
#[error("{context}: {error}")]
pub struct RecordFailure {
    /// 失敗したレコード（`s3://bucket/key`）
    pub context: String,
    #[source]
    pub error:   RecordError,
}

/// 1 回の呼び出しで失敗した全レコード
///
/// 失敗はレコードの処理順に並ぶ。
#[derive(Debug)]
pub struct InvocationFailure {
    failures: Vec<RecordFailure>,
}

impl InvocationFailure {
    pub fn failures(&self) -> &[RecordFailure] {
        &self.failures
    }
}

impl fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 件のレコードの処理に失敗:", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n\t* {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvocationFailure {}

/// 1 レコードの処理結果
#[derive(Debug)]
pub struct RecordReport {
    pub outcome: RecordOutcome,
    pub failure: Option<RecordFailure>,
}

/// バッチコーディネーター
pub struct BatchCoordinator {
    store:      Arc<dyn ObjectStore>,
    dispatcher: MailDispatcher,
    operator:   OperatorNotifier,
}

impl BatchCoordinator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        dispatcher: MailDispatcher,
        operator: OperatorNotifier,
    ) -> Self {
        Self {
            store,
            dispatcher,
            operator,
        }
    }

    /// イベント内の全レコードを順に処理する
    ///
    /// 1 件でも失敗したレコードがあれば、全失敗をまとめて返す。
    pub async fn process_event(&self, records: &[StorageRecord]) -> Result<(), InvocationFailure> {
        let mut failures = Vec::new();

        for record in records {
            let report = self.process_record(record).await;
            if let Some(failure) = report.failure {
                failures.push(failure);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(InvocationFailure { failures })
        }
    }

    /// 1 レコードを処理する
    ///
    /// 失敗はここで運用者に通知し、呼び出し元には報告として返す。
    pub async fn process_record(&self, record: &StorageRecord) -> RecordReport {
        let span = tracing::info_span!(
            "process_record",
            bucket = record.bucket.as_deref().unwrap_or_default(),
            key = record.key.as_deref().unwrap_or_default(),
        );

        async {
            match self.run(record).await {
                Ok(locator) => {
                    log_business_event!(
                        event.category = event::category::RECORD,
                        event.action = event::action::RECORD_DELETED,
                        event.result = event::result::SUCCESS,
                        record.object = %locator,
                        record.outcome = %RecordOutcome::Deleted,
                        "レコードの処理が完了しオブジェクトを削除"
                    );
                    RecordReport {
                        outcome: RecordOutcome::Deleted,
                        failure: None,
                    }
                }
                Err(error) => {
                    log_business_event!(
                        event.category = event::category::RECORD,
                        event.action = event::action::RECORD_RETAINED,
                        event.result = event::result::FAILURE,
                        error.category = error.category(),
                        error.kind = error.kind(),
                        error.detail = %error,
                        record.outcome = %RecordOutcome::Retained,
                        "レコードの処理に失敗しオブジェクトを残した"
                    );
                    let failure = RecordFailure {
                        context: record.to_string(),
                        error,
                    };
                    self.operator.notify(&failure).await;
                    RecordReport {
                        outcome: RecordOutcome::Retained,
                        failure: Some(failure),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// 取得 → デコード → 送信 → 削除
    async fn run(&self, record: &StorageRecord) -> Result<ObjectLocator, RecordError> {
        let locator = record.locate()?;

        let payload = self
            .store
            .fetch(&locator)
            .await
            .map_err(RecordError::Fetch)?;

        let request = BatchRequest::from_json(&payload)?;
        tracing::debug!(
            job_name = request.job_name(),
            recipients = request.recipients().len(),
            "招待ペイロードをデコード"
        );

        let result = self.dispatcher.dispatch(&request).await?;
        if let Some(error) = DispatchError::from_result(result) {
            return Err(error.into());
        }

        self.store
            .delete(&locator)
            .await
            .map_err(RecordError::Delete)?;

        Ok(locator)
    }
}
