//! 統合テスト用のヘルパー
//!
//! インメモリのモックでコーディネーターを組み立てる。

use std::sync::Arc;

use planroom_domain::{
    notification::EmailMessage,
    record::ObjectLocator,
};
use planroom_infra::mock::{MockMailTransport, MockObjectStore};
use planroom_notifier::usecase::{
    BatchCoordinator,
    InvitationRenderer,
    MailDispatcher,
    OperatorNotifier,
};

pub const BUCKET: &str = "planroom-invitations";
pub const OPERATOR: &str = "ops@benchmark.example.com";

/// テスト対象と、検証に使うモックの組
pub struct NotifierSetup {
    pub store:     MockObjectStore,
    pub transport: MockMailTransport,
    pub sut:       BatchCoordinator,
}

impl NotifierSetup {
    pub fn build() -> Self {
        let store = MockObjectStore::new();
        let transport = MockMailTransport::new();
        let shared: Arc<MockMailTransport> = Arc::new(transport.clone());

        let sut = BatchCoordinator::new(
            Arc::new(store.clone()),
            MailDispatcher::new(shared.clone(), InvitationRenderer::new().unwrap()),
            OperatorNotifier::new(shared, OPERATOR),
        );

        Self {
            store,
            transport,
            sut,
        }
    }

    /// ペイロードを JSON 文字列のまま置く
    pub fn put_json(&self, key: &str, json: &str) -> ObjectLocator {
        let locator = ObjectLocator::new(BUCKET, key);
        self.store.put(locator.clone(), json.as_bytes().to_vec());
        locator
    }

    /// 運用者以外に送信されたメール
    pub fn invitations(&self) -> Vec<EmailMessage> {
        self.transport
            .sent_emails()
            .into_iter()
            .filter(|e| e.to != OPERATOR)
            .collect()
    }

    /// 運用者に送信されたアラート
    pub fn alerts(&self) -> Vec<EmailMessage> {
        self.transport
            .sent_emails()
            .into_iter()
            .filter(|e| e.to == OPERATOR)
            .collect()
    }
}

/// S3 の ObjectCreated イベントを組み立てる
pub fn s3_event_json(keys: &[&str]) -> String {
    let records: Vec<String> = keys
        .iter()
        .map(|key| {
            format!(
                r#"{{
                    "eventVersion": "2.1",
                    "eventSource": "aws:s3",
                    "awsRegion": "us-east-1",
                    "eventTime": "2025-03-01T12:00:00.000Z",
                    "eventName": "ObjectCreated:Put",
                    "userIdentity": {{ "principalId": "AWS:AIDAEXAMPLE" }},
                    "requestParameters": {{ "sourceIPAddress": "127.0.0.1" }},
                    "responseElements": {{ "x-amz-request-id": "C3D13FE58DE4C810" }},
                    "s3": {{
                        "s3SchemaVersion": "1.0",
                        "configurationId": "invitations",
                        "bucket": {{
                            "name": "{BUCKET}",
                            "ownerIdentity": {{ "principalId": "A3NL1KOZZKExample" }},
                            "arn": "arn:aws:s3:::{BUCKET}"
                        }},
                        "object": {{ "key": "{key}", "size": 512 }}
                    }}
                }}"#
            )
        })
        .collect();

    format!(r#"{{ "Records": [{}] }}"#, records.join(","))
}
