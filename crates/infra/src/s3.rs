//! # S3 オブジェクトストア
//!
//! 招待ペイロードの取得と、処理完了後の削除を行う。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`ObjectStore`] でコーディネーターから S3 を隠蔽する
//! - **ローカル実行**: MinIO を使用（`S3_ENDPOINT_URL` で接続先を指定）
//! - **本番環境**: Lambda の実行ロールで Amazon S3 に接続（`S3_ENDPOINT_URL` 未設定）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use planroom_infra::s3;
//!
//! async fn setup() {
//!     // ローカル（MinIO）
//!     let client = s3::create_client(Some("http://localhost:19000")).await;
//!     let store = s3::AwsS3ObjectStore::new(client);
//!
//!     // 本番（AWS S3）
//!     let client = s3::create_client(None).await;
//!     let store = s3::AwsS3ObjectStore::new(client);
//! }
//! ```

use async_trait::async_trait;
use aws_sdk_s3::{Client, error::ProvideErrorMetadata};
use planroom_domain::record::ObjectLocator;

use crate::InfraError;

/// オブジェクトストアのインターフェース
///
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// オブジェクトの内容を取得する
    ///
    /// オブジェクトが存在しない場合は `ObjectNotFound`、
    /// それ以外の失敗は `S3`（転送エラー）を返す。
    async fn fetch(&self, locator: &ObjectLocator) -> Result<Vec<u8>, InfraError>;

    /// オブジェクトを削除する
    async fn delete(&self, locator: &ObjectLocator) -> Result<(), InfraError>;
}

/// AWS S3 オブジェクトストア
///
/// `aws-sdk-s3` を使用した [`ObjectStore`] の実装。
/// バケットはレコードごとに異なりうるため、クライアントのみを保持する。
pub struct AwsS3ObjectStore {
    client: Client,
}

impl AwsS3ObjectStore {
    /// 新しいオブジェクトストアを作成する
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for AwsS3ObjectStore {
    async fn fetch(&self, locator: &ObjectLocator) -> Result<Vec<u8>, InfraError> {
        let output = self
            .client
            .get_object()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .send()
            .await
            .map_err(|err| {
                let is_not_found = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false);
                if is_not_found {
                    InfraError::object_not_found(&locator.bucket, &locator.key)
                } else {
                    InfraError::s3(format!("GetObject の実行に失敗: {err}"))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| InfraError::s3(format!("オブジェクト本体の読み取りに失敗: {e}")))?;

        Ok(body.into_bytes().to_vec())
    }

    async fn delete(&self, locator: &ObjectLocator) -> Result<(), InfraError> {
        self.client
            .delete_object()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .send()
            .await
            .map_err(|err| {
                // バージョニング無効のバケットでは存在しないキーの削除も成功する。
                // NoSuchKey が返るのはバージョン指定時などに限られる
                let is_not_found = err
                    .as_service_error()
                    .and_then(|e| e.code())
                    .is_some_and(|code| code == "NoSuchKey");
                if is_not_found {
                    InfraError::object_not_found(&locator.bucket, &locator.key)
                } else {
                    InfraError::s3(format!("DeleteObject の実行に失敗: {err}"))
                }
            })?;

        Ok(())
    }
}

/// S3 クライアントを作成する
///
/// `endpoint` が `Some` の場合は MinIO 等のカスタムエンドポイントに接続する。
/// `None` の場合は AWS S3 のデフォルトエンドポイントを使用する。
///
/// リージョンと認証情報は SDK のデフォルトチェーンで解決する:
/// - Lambda: `AWS_REGION` と実行ロール
/// - ローカル: 環境変数 `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`（`.env` で設定）
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder.endpoint_url(endpoint_url);
    }

    let config = config_builder.load().await;

    // MinIO はパススタイルが必要（バーチャルホスト型 URL を使わない）
    let s3_config_builder = aws_sdk_s3::config::Builder::from(&config);
    let s3_config = if endpoint.is_some() {
        s3_config_builder.force_path_style(true).build()
    } else {
        s3_config_builder.build()
    };

    Client::from_conf(s3_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_syncを満たす() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AwsS3ObjectStore>();
    }

    #[test]
    fn test_trait_objectとして扱える() {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version_latest()
            .build();
        let store: Box<dyn ObjectStore> = Box::new(AwsS3ObjectStore::new(Client::from_conf(config)));

        drop(store);
    }
}
