//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! planroom-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use planroom_domain::{
    notification::{EmailMessage, NotificationError},
    record::ObjectLocator,
};

use crate::{
    error::InfraError,
    notification::{MailSession, MailTransport},
    s3::ObjectStore,
    secret::SecretResolver,
};

// ===== MockObjectStore =====

/// インメモリのオブジェクトストア
///
/// 取得・削除の失敗をオブジェクト単位で注入できる。
#[derive(Clone, Default)]
pub struct MockObjectStore {
    objects:        Arc<Mutex<HashMap<ObjectLocator, Vec<u8>>>>,
    failing_fetch:  Arc<Mutex<HashSet<ObjectLocator>>>,
    failing_delete: Arc<Mutex<HashSet<ObjectLocator>>>,
    deleted:        Arc<Mutex<Vec<ObjectLocator>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, locator: ObjectLocator, body: impl Into<Vec<u8>>) {
        self.objects.lock().unwrap().insert(locator, body.into());
    }

    /// 指定オブジェクトの取得を転送エラーで失敗させる
    pub fn fail_fetch(&self, locator: ObjectLocator) {
        self.failing_fetch.lock().unwrap().insert(locator);
    }

    /// 指定オブジェクトの削除を転送エラーで失敗させる
    pub fn fail_delete(&self, locator: ObjectLocator) {
        self.failing_delete.lock().unwrap().insert(locator);
    }

    pub fn contains(&self, locator: &ObjectLocator) -> bool {
        self.objects.lock().unwrap().contains_key(locator)
    }

    pub fn deleted(&self) -> Vec<ObjectLocator> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn fetch(&self, locator: &ObjectLocator) -> Result<Vec<u8>, InfraError> {
        if self.failing_fetch.lock().unwrap().contains(locator) {
            return Err(InfraError::s3(format!("GetObject の実行に失敗: {locator}")));
        }

        self.objects
            .lock()
            .unwrap()
            .get(locator)
            .cloned()
            .ok_or_else(|| InfraError::object_not_found(&locator.bucket, &locator.key))
    }

    async fn delete(&self, locator: &ObjectLocator) -> Result<(), InfraError> {
        if self.failing_delete.lock().unwrap().contains(locator) {
            return Err(InfraError::s3(format!("DeleteObject の実行に失敗: {locator}")));
        }

        self.objects.lock().unwrap().remove(locator);
        self.deleted.lock().unwrap().push(locator.clone());
        Ok(())
    }
}

// ===== MockMailTransport =====

/// 送信されたメールを記録するモックトランスポート
///
/// セッションの開閉回数も記録し、1 バッチ 1 セッションの検証に使う。
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:               Arc<Mutex<Vec<EmailMessage>>>,
    failing_recipients: Arc<Mutex<HashSet<String>>>,
    fail_open:          Arc<Mutex<bool>>,
    opened:             Arc<Mutex<usize>>,
    closed:             Arc<Mutex<usize>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// セッションの確立を失敗させる
    pub fn fail_open(&self) {
        *self.fail_open.lock().unwrap() = true;
    }

    /// 指定アドレス宛の送信を失敗させる
    pub fn fail_recipient(&self, to: impl Into<String>) {
        self.failing_recipients.lock().unwrap().insert(to.into());
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn opened_sessions(&self) -> usize {
        *self.opened.lock().unwrap()
    }

    pub fn closed_sessions(&self) -> usize {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn open(&self) -> Result<Box<dyn MailSession>, NotificationError> {
        if *self.fail_open.lock().unwrap() {
            return Err(NotificationError::SessionFailed(
                "SMTP 接続失敗: connection refused".to_string(),
            ));
        }

        *self.opened.lock().unwrap() += 1;
        Ok(Box::new(MockMailSession {
            transport: self.clone(),
            closed:    false,
        }))
    }
}

struct MockMailSession {
    transport: MockMailTransport,
    closed:    bool,
}

#[async_trait]
impl MailSession for MockMailSession {
    async fn submit(&mut self, email: &EmailMessage) -> Result<(), NotificationError> {
        if self.closed {
            return Err(NotificationError::SessionFailed(
                "セッションは閉じられています".to_string(),
            ));
        }

        if self
            .transport
            .failing_recipients
            .lock()
            .unwrap()
            .contains(&email.to)
        {
            return Err(NotificationError::SendFailed(format!(
                "SMTP 送信失敗: 550 mailbox unavailable {}",
                email.to
            )));
        }

        self.transport.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            *self.transport.closed.lock().unwrap() += 1;
        }
    }
}

// ===== MockSecretResolver =====

/// 設定名ごとの解決結果を差し替えられるモックリゾルバ
///
/// 登録のない設定名は値をそのまま返す。
#[derive(Clone, Default)]
pub struct MockSecretResolver {
    overrides: Arc<Mutex<HashMap<String, String>>>,
    failing:   Arc<Mutex<HashSet<String>>>,
}

impl MockSecretResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl Into<String>, plaintext: impl Into<String>) {
        self.overrides
            .lock()
            .unwrap()
            .insert(name.into(), plaintext.into());
    }

    /// 指定した設定名の解決を失敗させる
    pub fn fail(&self, name: impl Into<String>) {
        self.failing.lock().unwrap().insert(name.into());
    }
}

#[async_trait]
impl SecretResolver for MockSecretResolver {
    async fn resolve(&self, name: &str, value: &str) -> Result<String, InfraError> {
        if self.failing.lock().unwrap().contains(name) {
            return Err(InfraError::kms(format!("{name} の復号に失敗: AccessDeniedException")));
        }

        Ok(self
            .overrides
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| value.to_string()))
    }
}
