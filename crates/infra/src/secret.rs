//! # シークレット解決
//!
//! SMTP の接続情報や運用者アドレスは、Lambda の環境変数に KMS で暗号化した
//! base64 文字列として設定される。起動時に 1 度だけ復号して平文を得る。
//!
//! ## 実装
//!
//! - [`KmsSecretResolver`]: base64 デコード → KMS `Decrypt`（本番）
//! - [`PlainSecretResolver`]: 値をそのまま返す（ローカル実行・Mailpit 向け）
//!
//! `SECRET_BACKEND` 環境変数で切り替える（呼び出し側の設定層が選択する）。

use async_trait::async_trait;
use aws_sdk_kms::{Client, primitives::Blob};
use base64::Engine as _;

use crate::InfraError;

/// KMS の暗号化コンテキストのキー
///
/// Lambda コンソールの「暗号化ヘルパー」で暗号化した値は、
/// このキーに関数名を設定したコンテキストでしか復号できない。
const ENCRYPTION_CONTEXT_KEY: &str = "LambdaFunctionName";

/// シークレット解決のインターフェース
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// 設定値を平文に解決する
    ///
    /// # 引数
    ///
    /// - `name`: 設定名（例: `PE_SERVER`）。エラーメッセージとログに使う
    /// - `value`: 環境変数に設定された値
    async fn resolve(&self, name: &str, value: &str) -> Result<String, InfraError>;
}

/// KMS によるシークレット解決
pub struct KmsSecretResolver {
    client:        Client,
    function_name: String,
}

impl KmsSecretResolver {
    /// 新しいリゾルバを作成する
    ///
    /// # 引数
    ///
    /// - `client`: AWS KMS クライアント
    /// - `function_name`: 暗号化コンテキストに使う Lambda 関数名
    ///   （`AWS_LAMBDA_FUNCTION_NAME`）
    pub fn new(client: Client, function_name: String) -> Self {
        Self {
            client,
            function_name,
        }
    }
}

#[async_trait]
impl SecretResolver for KmsSecretResolver {
    async fn resolve(&self, name: &str, value: &str) -> Result<String, InfraError> {
        let ciphertext = decode_ciphertext(name, value)?;

        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .encryption_context(ENCRYPTION_CONTEXT_KEY, &self.function_name)
            .send()
            .await
            .map_err(|e| InfraError::kms(format!("{name} の復号に失敗: {e}")))?;

        let plaintext = output
            .plaintext()
            .ok_or_else(|| InfraError::kms(format!("{name} の復号結果が空です")))?;

        String::from_utf8(plaintext.as_ref().to_vec())
            .map_err(|e| InfraError::invalid_input(format!("{name} の復号結果が UTF-8 ではありません: {e}")))
    }
}

/// 平文のまま設定値を使うリゾルバ
#[derive(Debug, Clone, Default)]
pub struct PlainSecretResolver;

#[async_trait]
impl SecretResolver for PlainSecretResolver {
    async fn resolve(&self, _name: &str, value: &str) -> Result<String, InfraError> {
        Ok(value.to_string())
    }
}

/// KMS クライアントを作成する
///
/// リージョンと認証情報は SDK のデフォルトチェーンで解決する。
pub async fn create_kms_client() -> Client {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    Client::new(&config)
}

/// 環境変数の base64 文字列を暗号文のバイト列に戻す
fn decode_ciphertext(name: &str, value: &str) -> Result<Vec<u8>, InfraError> {
    base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| InfraError::invalid_input(format!("{name} が base64 として不正です: {e}")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::InfraErrorKind;

    #[tokio::test]
    async fn plain_secret_resolverは値をそのまま返す() {
        let resolver = PlainSecretResolver;

        let resolved = resolver.resolve("PE_SERVER", "smtp.example.com").await.unwrap();

        assert_eq!(resolved, "smtp.example.com");
    }

    #[test]
    fn decode_ciphertextはbase64をデコードする() {
        let decoded = decode_ciphertext("PE_PORT", "NTg3").unwrap();

        assert_eq!(decoded, b"587".to_vec());
    }

    #[test]
    fn decode_ciphertextは前後の空白を無視する() {
        let decoded = decode_ciphertext("PE_PORT", " NTg3\n").unwrap();

        assert_eq!(decoded, b"587".to_vec());
    }

    #[test]
    fn decode_ciphertextは不正なbase64で入力エラーを返す() {
        let err = decode_ciphertext("PE_PASSWORD", "not base64!").unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::InvalidInput(msg) if msg.contains("PE_PASSWORD")));
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KmsSecretResolver>();
        assert_send_sync::<PlainSecretResolver>();
    }
}
