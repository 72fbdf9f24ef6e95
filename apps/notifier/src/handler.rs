//! # Lambda ハンドラ
//!
//! S3 イベントをストレージレコードに変換し、コーディネーターに渡す。

use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{Error, LambdaEvent};

use crate::usecase::{BatchCoordinator, StorageRecord};

/// S3 イベント 1 件を処理する
///
/// 失敗したレコードがあれば、全失敗をまとめたエラーを返す。
pub async fn handle(coordinator: &BatchCoordinator, event: LambdaEvent<S3Event>) -> Result<(), Error> {
    let records = storage_records(&event.payload);
    tracing::info!(
        request_id = %event.context.request_id,
        records = records.len(),
        "S3 イベントを受信"
    );

    coordinator.process_event(&records).await?;
    Ok(())
}

/// S3 イベントからレコードを取り出す
pub fn storage_records(event: &S3Event) -> Vec<StorageRecord> {
    event
        .records
        .iter()
        .map(|record| StorageRecord {
            bucket: record.s3.bucket.name.clone(),
            key:    record.s3.object.key.clone(),
        })
        .collect()
}
