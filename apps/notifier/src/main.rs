//! # Planroom Notifier
//!
//! S3 に置かれた入札招待ペイロードを受け取り、宛先ごとに招待メールを送信する Lambda。
//!
//! ## 処理の流れ
//!
//! ```text
//! S3 (ObjectCreated) → Lambda → GetObject → デコード → SMTP 送信 → DeleteObject
//!                                   ↓            ↓           ↓            ↓
//!                                 失敗         失敗        失敗         失敗
//!                                   └────────────┴─────┬─────┴────────────┘
//!                                                      ↓
//!                                          運用者メールボックスへ通知
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `PE_SERVER` | **Yes** | SMTP ホスト（シークレット） |
//! | `PE_PORT` | **Yes** | SMTP ポート（シークレット） |
//! | `PE_EMAIL` | **Yes** | SMTP アカウント兼送信元アドレス（シークレット） |
//! | `PE_PASSWORD` | **Yes** | SMTP パスワード（シークレット） |
//! | `PE_ERROR` | **Yes** | 運用者アラートの宛先（シークレット） |
//! | `SECRET_BACKEND` | No | `kms`（デフォルト）/ `plain` |
//! | `SMTP_TLS` | No | `wrapper` / `starttls` / `none`（デフォルト: ポートから決定） |
//! | `MAIL_BACKEND` | No | `smtp`（デフォルト）/ `noop` |
//! | `S3_ENDPOINT_URL` | No | MinIO 等のカスタムエンドポイント |
//! | `LOG_FORMAT` | No | `json`（デフォルト）/ `pretty` |
//!
//! ## 起動方法
//!
//! ```bash
//! # Lambda 用ビルド
//! cargo lambda build -p planroom-notifier --release
//!
//! # ローカル実行（Mailpit + MinIO）
//! SECRET_BACKEND=plain SMTP_TLS=none cargo lambda watch -p planroom-notifier
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{LambdaEvent, service_fn};
use planroom_infra::{
    notification::{MailTransport, NoopMailTransport, SmtpMailTransport},
    s3::{self, AwsS3ObjectStore},
    secret::{self, KmsSecretResolver, PlainSecretResolver, SecretResolver},
};
use planroom_notifier::{
    config::{MailBackend, NotifierConfig, SecretBackend},
    handler,
    usecase::{BatchCoordinator, InvitationRenderer, MailDispatcher, OperatorNotifier},
};
use planroom_shared::observability::{TracingConfig, init_tracing};

/// Notifier のエントリーポイント
///
/// レコードも宛先も逐次処理するため、シングルスレッドのランタイムで動かす。
fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("planroom-notifier");
    init_tracing(&tracing_config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("tokio ランタイムの構築に失敗しました")?;

    runtime.block_on(run())
}

async fn run() -> anyhow::Result<()> {
    let resolver: Box<dyn SecretResolver> = match SecretBackend::from_env()? {
        SecretBackend::Kms => {
            let function_name = std::env::var("AWS_LAMBDA_FUNCTION_NAME").unwrap_or_default();
            Box::new(KmsSecretResolver::new(
                secret::create_kms_client().await,
                function_name,
            ))
        }
        SecretBackend::Plain => Box::new(PlainSecretResolver),
    };

    let config = NotifierConfig::load(resolver.as_ref())
        .await
        .context("設定の読み込みに失敗しました")?;

    tracing::info!(
        smtp_host = %config.smtp.host,
        smtp_port = config.smtp.port,
        mail_backend = %config.mail_backend,
        "Planroom Notifier を起動します"
    );

    let store = Arc::new(AwsS3ObjectStore::new(
        s3::create_client(config.s3_endpoint_url.as_deref()).await,
    ));

    let transport: Arc<dyn MailTransport> = match config.mail_backend {
        MailBackend::Smtp => Arc::new(
            SmtpMailTransport::new(config.smtp.clone())
                .context("SMTP 送信の初期化に失敗しました")?,
        ),
        MailBackend::Noop => Arc::new(NoopMailTransport),
    };

    let renderer = InvitationRenderer::new().context("テンプレートの読み込みに失敗しました")?;

    let coordinator = Arc::new(BatchCoordinator::new(
        store,
        MailDispatcher::new(transport.clone(), renderer),
        OperatorNotifier::new(transport, config.operator_address.clone()),
    ));

    lambda_runtime::run(service_fn(|event: LambdaEvent<S3Event>| {
        let coordinator = coordinator.clone();
        async move { handler::handle(&coordinator, event).await }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}
