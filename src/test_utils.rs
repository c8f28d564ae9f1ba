//! Shared in-memory fakes for the network-facing traits.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, OperationalError, Result};
use crate::models::{MatchedPaste, Paste};
use crate::services::{Notifier, PasteSource};

/// Scripted paste source recording every body fetch.
#[derive(Default)]
pub struct FakeSource {
    lists: Mutex<VecDeque<Result<Vec<Paste>>>>,
    bodies: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
    on_fetch: Mutex<Option<(String, oneshot::Sender<()>)>>,
}

impl FakeSource {
    pub fn new(bodies: &[(&str, &str)]) -> Self {
        Self {
            bodies: bodies
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Queue a successful list response.
    pub fn push_list(&self, keys: &[&str]) {
        let pastes = keys.iter().map(|k| Paste::new(*k)).collect();
        self.lists.lock().unwrap().push_back(Ok(pastes));
    }

    /// Queue a failed list response.
    pub fn push_failure(&self) {
        self.lists.lock().unwrap().push_back(Err(AppError::Status {
            url: "https://example.com/list".into(),
            status: 500,
        }));
    }

    /// Fire `tx` when `key` is fetched.
    pub fn signal_on_fetch(&self, key: &str, tx: oneshot::Sender<()>) {
        *self.on_fetch.lock().unwrap() = Some((key.to_string(), tx));
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasteSource for FakeSource {
    async fn list_items(&self, _cancel: &CancellationToken) -> Result<Vec<Paste>> {
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }

    async fn fetch_body(&self, paste: &Paste, _cancel: &CancellationToken) -> Result<String> {
        self.fetched.lock().unwrap().push(paste.key.clone());

        let mut on_fetch = self.on_fetch.lock().unwrap();
        if on_fetch.as_ref().is_some_and(|(key, _)| *key == paste.key) {
            if let Some((_, tx)) = on_fetch.take() {
                let _ = tx.send(());
            }
        }
        drop(on_fetch);

        self.bodies
            .get(&paste.key)
            .cloned()
            .ok_or_else(|| AppError::Status {
                url: format!("https://example.com/item?i={}", paste.key),
                status: 404,
            })
    }
}

/// Notifier recording what it was asked to send.
#[derive(Default)]
pub struct FakeNotifier {
    fail_pastes: bool,
    fail_errors: bool,
    pastes: Mutex<Vec<MatchedPaste>>,
    errors: Mutex<Vec<OperationalError>>,
}

impl FakeNotifier {
    pub fn failing() -> Self {
        Self {
            fail_pastes: true,
            fail_errors: true,
            ..Self::default()
        }
    }

    pub fn pastes(&self) -> Vec<MatchedPaste> {
        self.pastes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<OperationalError> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_paste(&self, paste: &MatchedPaste) -> Result<()> {
        self.pastes.lock().unwrap().push(paste.clone());
        if self.fail_pastes {
            return Err(AppError::Status {
                url: "https://hooks.example.com/paste".into(),
                status: 502,
            });
        }
        Ok(())
    }

    async fn send_error(&self, error: &OperationalError) -> Result<()> {
        self.errors.lock().unwrap().push(error.clone());
        if self.fail_errors {
            return Err(AppError::Status {
                url: "https://hooks.example.com/errors".into(),
                status: 502,
            });
        }
        Ok(())
    }
}
