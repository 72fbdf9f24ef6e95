//! 招待メール送信フローの統合テスト
//!
//! S3 イベントの受信から、送信・削除・運用者アラートまでを通しで確認する。

mod helpers;

use aws_lambda_events::event::s3::S3Event;
use helpers::{BUCKET, NotifierSetup, s3_event_json};
use planroom_domain::record::{ObjectLocator, RecordOutcome};
use planroom_notifier::{
    handler::storage_records,
    usecase::{RecordError, StorageRecord},
};
use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};

const PAYLOAD_WITH_MESSAGE: &str = r#"{
    "jobName": "Riverside Clinic",
    "expiration": "March 3, 2025",
    "message": "<b>Pre-bid walk on Friday</b>",
    "recipients": [
        { "to": "alice@example.com", "link": "https://planroom.example.com/bid/a1" },
        { "to": "bob@example.com", "link": "https://planroom.example.com/bid/b2" }
    ]
}"#;

const PAYLOAD_WITHOUT_MESSAGE: &str = r#"{
    "jobName": "Harbor Warehouse",
    "expiration": "April 1, 2025",
    "recipients": [
        { "to": "carol@example.com", "link": "https://planroom.example.com/bid/c3" }
    ]
}"#;

const EXPECTED_HTML_WITHOUT_MESSAGE: &str = "<center>
\t<img src=\"https://benchmarkmechanical.com/Images/logo1.jpg\" />
\t<br><br><br>
\t<div style=\"width:60%;border:1px solid lightgrey\">
\t\t<h1>Invitation to Bid</h1>
\t\t<h2>Harbor Warehouse</h2>
\t\t<a href=\"https://planroom.example.com/bid/c3\">Click Here</a> to access bidding documents and project details.<br>This link will expire April 1, 2025.
\t\t<br><br><br>
\t\t<span style=\"color:grey;font-size:10pt\"><em>Please do not reply to this email. The mailbox is not monitored.</em></span>
\t</div>
</center>";

#[tokio::test]
async fn s3イベントから招待メールを送信しオブジェクトを削除する() {
    // Arrange
    let setup = NotifierSetup::build();
    let first = setup.put_json("2025/Riverside Clinic.json", PAYLOAD_WITH_MESSAGE);
    let second = setup.put_json("2025/harbor.json", PAYLOAD_WITHOUT_MESSAGE);
    let event: S3Event = serde_json::from_str(&s3_event_json(&[
        "2025/Riverside+Clinic.json",
        "2025/harbor.json",
    ]))
    .unwrap();

    // Act
    let result = setup.sut.process_event(&storage_records(&event)).await;

    // Assert
    assert_ok!(result);
    assert_eq!(setup.store.deleted(), vec![first, second]);
    assert!(setup.alerts().is_empty());

    let invitations = setup.invitations();
    let recipients: Vec<&str> = invitations.iter().map(|e| e.to.as_str()).collect();
    assert_eq!(
        recipients,
        vec!["alice@example.com", "bob@example.com", "carol@example.com"]
    );
    assert_eq!(invitations[0].subject, "Invitation to Bid: Riverside Clinic");
    assert!(
        invitations[0]
            .html_body
            .contains("<div style=\"width:70%\"><b>Pre-bid walk on Friday</b>\t\t</div><br>")
    );
    assert!(invitations[1].html_body.contains("https://planroom.example.com/bid/b2"));
    assert_eq!(invitations[2].html_body, EXPECTED_HTML_WITHOUT_MESSAGE);
    assert_eq!(
        invitations[2].text_body,
        "This is an invitation from Benchmark Mechanical to bid on the Harbor Warehouse \
         project. Bidding documents and project details are available at the link below. \
         The link will expire April 1, 2025\n\nhttps://planroom.example.com/bid/c3\n\n\
         Please do not reply to this email. The mailbox is not monitored"
    );
}

#[tokio::test]
async fn 送信に失敗した宛先があるとオブジェクトを残し運用者に通知する() {
    // Arrange
    let setup = NotifierSetup::build();
    let locator = setup.put_json("job.json", PAYLOAD_WITH_MESSAGE);
    setup.transport.fail_recipient("alice@example.com");

    // Act
    let report = setup
        .sut
        .process_record(&StorageRecord::new(BUCKET, "job.json"))
        .await;

    // Assert
    assert_eq!(report.outcome, RecordOutcome::Retained);
    assert!(setup.store.contains(&locator));

    // 失敗した宛先の後ろの宛先にも送信している
    let recipients: Vec<String> = setup.invitations().into_iter().map(|e| e.to).collect();
    assert_eq!(recipients, vec!["bob@example.com"]);

    let alerts = setup.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject, "Planroom Email Error");
    assert!(alerts[0].text_body.starts_with(&format!(
        "There was an error sending emails s3://{BUCKET}/job.json: 1 件の宛先への送信に失敗: alice@example.com"
    )));
    assert_eq!(alerts[0].html_body, alerts[0].text_body);
}

#[tokio::test]
async fn 壊れたペイロードがあっても後続のレコードは処理される() {
    // Arrange
    let setup = NotifierSetup::build();
    setup.put_json("broken.json", r#"{ "jobName": "No recipients", "expiration": "soon" }"#);
    let good = setup.put_json("good.json", PAYLOAD_WITHOUT_MESSAGE);

    // Act
    let result = setup
        .sut
        .process_event(&[
            StorageRecord::new(BUCKET, "broken.json"),
            StorageRecord::new(BUCKET, "good.json"),
        ])
        .await;

    // Assert
    let err = assert_err!(result);
    assert_eq!(err.failures().len(), 1);
    assert!(matches!(err.failures()[0].error, RecordError::Decode(_)));
    assert_eq!(setup.store.deleted(), vec![good]);
    assert!(setup.store.contains(&ObjectLocator::new(BUCKET, "broken.json")));
    assert_eq!(setup.invitations().len(), 1);
    assert_eq!(setup.alerts().len(), 1);
}

#[tokio::test]
async fn smtpに接続できない場合は全レコードを残し失敗ごとに通知を試みる() {
    // Arrange
    let setup = NotifierSetup::build();
    let first = setup.put_json("a.json", PAYLOAD_WITH_MESSAGE);
    let second = setup.put_json("b.json", PAYLOAD_WITHOUT_MESSAGE);
    setup.transport.fail_open();

    // Act
    let result = setup
        .sut
        .process_event(&[
            StorageRecord::new(BUCKET, "a.json"),
            StorageRecord::new(BUCKET, "b.json"),
        ])
        .await;

    // Assert
    let err = assert_err!(result);
    assert_eq!(err.failures().len(), 2);
    assert!(setup.store.contains(&first));
    assert!(setup.store.contains(&second));
    // 運用者アラートも同じ SMTP に依存するため届かない（ログのみ）
    assert!(setup.transport.sent_emails().is_empty());
}
