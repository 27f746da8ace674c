//! Scripted in-memory `CloudApi` shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tencentcloud::api::{ApiCall, ApiError, CloudApi};
use tencentcloud::reconcile::ReconcilerConfig;
use tencentcloud::TencentCloudProviderData;

type Reply = Result<Value, ApiError>;

#[derive(Default)]
struct Script {
    /// Replies consumed in order, per action
    queued: HashMap<&'static str, VecDeque<Reply>>,
    /// Reply builders used once an action's queue is empty
    repeated: HashMap<&'static str, fn() -> Reply>,
    calls: Vec<ApiCall>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    script: Arc<Mutex<Script>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one reply for `action`
    pub fn reply(&self, action: &'static str, reply: Reply) -> &Self {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(action)
            .or_default()
            .push_back(reply);
        self
    }

    /// Answers every further `action` call with `reply()`
    pub fn always(&self, action: &'static str, reply: fn() -> Reply) -> &Self {
        self.script.lock().unwrap().repeated.insert(action, reply);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn actions(&self) -> Vec<&'static str> {
        self.calls().iter().map(|call| call.action).collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls().iter().filter(|call| call.action == action).count()
    }

    pub fn provider_data(&self) -> TencentCloudProviderData {
        TencentCloudProviderData::new(self.clone())
    }

    pub fn provider_data_with(&self, config: ReconcilerConfig) -> TencentCloudProviderData {
        self.provider_data().with_config(config)
    }
}

#[async_trait]
impl CloudApi for FakeApi {
    async fn invoke(&self, call: &ApiCall) -> Result<Value, ApiError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(call.clone());

        if let Some(reply) = script.queued.get_mut(call.action).and_then(VecDeque::pop_front) {
            return reply;
        }
        match script.repeated.get(call.action) {
            Some(reply) => reply(),
            None => panic!("unexpected call to {}", call.action),
        }
    }
}

pub fn service_error(code: &str) -> ApiError {
    ApiError::ServiceError {
        code: code.to_string(),
        message: format!("{} from fake", code),
        request_id: "fake-request".to_string(),
    }
}
