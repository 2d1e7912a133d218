//! Scripted probe and runner shared by unit tests

use crate::lifecycle::{CommandRunner, LifecycleCommand};
use crate::models::{LifecycleResult, ServiceName, ServiceStatus};
use crate::status::Probe;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Probe answering from a mutable status table
pub struct ScriptedProbe {
    statuses: Mutex<HashMap<ServiceName, ServiceStatus>>,
    delays: HashMap<ServiceName, Duration>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn all(status: ServiceStatus) -> Self {
        Self {
            statuses: Mutex::new(ServiceName::ALL.iter().map(|s| (*s, status)).collect()),
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, service: ServiceName, delay: Duration) -> Self {
        self.delays.insert(service, delay);
        self
    }

    pub fn set(&self, service: ServiceName, status: ServiceStatus) {
        self.statuses.lock().unwrap().insert(service, status);
    }

    pub fn set_all(&self, status: ServiceStatus) {
        for service in ServiceName::ALL {
            self.set(service, status);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, service: ServiceName) -> ServiceStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&service) {
            tokio::time::sleep(*delay).await;
        }
        self.statuses.lock().unwrap()[&service]
    }
}

/// Runner returning a fixed result after an optional delay
pub struct ScriptedRunner {
    result: LifecycleResult,
    delay: Duration,
    calls: Mutex<Vec<LifecycleCommand>>,
}

impl ScriptedRunner {
    pub fn succeeding() -> Self {
        Self::returning(LifecycleResult::success("ok", None))
    }

    pub fn failing(message: &str) -> Self {
        Self::returning(LifecycleResult::failure(message, Some("exit status: 1".into())))
    }

    pub fn returning(result: LifecycleResult) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<LifecycleCommand> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        command: LifecycleCommand,
        _working_dir: &Path,
        _timeout: Duration,
    ) -> LifecycleResult {
        self.calls.lock().unwrap().push(command);
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}
