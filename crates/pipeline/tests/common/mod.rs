//! Scripted in-memory [`PipelineRemote`] for orchestrator tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use assetflow_core::task::FileRef;
use assetflow_remote::{PipelineRemote, ProcessTicket, RemoteError, StageSlot, StatusReport};
use async_trait::async_trait;

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Stage,
    Put { url: String, file: String },
    Process { key: String, pipeline: String },
    Status { task_id: String },
}

/// Fake remote with per-call failure injection.
///
/// Stage call `n` (1-based) hands out key `key-n` and URL
/// `http://uploads.test/key-n`. Processing `key-n` yields task id
/// `task-key-n`. Status polls consume the task's script and then fall
/// back to `default_status`.
pub struct FakeRemote {
    stage_calls: AtomicUsize,
    stage_failures: HashMap<usize, RemoteError>,
    upload_failures: HashMap<String, RemoteError>,
    process_failures: HashMap<String, RemoteError>,
    status_scripts: Mutex<HashMap<String, VecDeque<String>>>,
    default_status: String,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            stage_calls: AtomicUsize::new(0),
            stage_failures: HashMap::new(),
            upload_failures: HashMap::new(),
            process_failures: HashMap::new(),
            status_scripts: Mutex::new(HashMap::new()),
            default_status: "SUCCEEDED".to_string(),
            latency: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_stage_call(mut self, call: usize, err: RemoteError) -> Self {
        self.stage_failures.insert(call, err);
        self
    }

    pub fn fail_upload(mut self, key: &str, err: RemoteError) -> Self {
        self.upload_failures.insert(upload_url(key), err);
        self
    }

    pub fn fail_process(mut self, key: &str, err: RemoteError) -> Self {
        self.process_failures.insert(key.to_string(), err);
        self
    }

    pub fn script_status(self, task_id: &str, statuses: &[&str]) -> Self {
        self.status_scripts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), statuses.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn default_status(mut self, status: &str) -> Self {
        self.default_status = status.to_string();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|&c| pred(c)).count()
    }

    pub fn status_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Status { .. }))
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn simulate_latency(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn upload_url(key: &str) -> String {
    format!("http://uploads.test/{key}")
}

pub fn task_id(key: &str) -> String {
    format!("task-{key}")
}

#[async_trait]
impl PipelineRemote for FakeRemote {
    async fn request_stage_slot(&self) -> Result<StageSlot, RemoteError> {
        let n = self.stage_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Call::Stage);
        self.simulate_latency().await;

        if let Some(err) = self.stage_failures.get(&n) {
            return Err(err.clone());
        }
        let key = format!("key-{n}");
        Ok(StageSlot {
            url: upload_url(&key),
            key,
        })
    }

    async fn put_bytes(&self, url: &str, file: &FileRef) -> Result<(), RemoteError> {
        self.record(Call::Put {
            url: url.to_string(),
            file: file.name().to_string(),
        });
        self.simulate_latency().await;

        match self.upload_failures.get(url) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn submit_process(&self, key: &str, pipeline: &str) -> Result<ProcessTicket, RemoteError> {
        self.record(Call::Process {
            key: key.to_string(),
            pipeline: pipeline.to_string(),
        });
        self.simulate_latency().await;

        if let Some(err) = self.process_failures.get(key) {
            return Err(err.clone());
        }
        Ok(ProcessTicket {
            task_id: task_id(key),
            extra: Default::default(),
        })
    }

    async fn fetch_status(&self, task_id: &str) -> Result<StatusReport, RemoteError> {
        self.record(Call::Status {
            task_id: task_id.to_string(),
        });
        self.simulate_latency().await;

        let status = self
            .status_scripts
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default_status.clone());
        Ok(StatusReport {
            status,
            title: Some(format!("{task_id}.png")),
            extra: Default::default(),
        })
    }
}

pub fn png(name: &str) -> FileRef {
    FileRef::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}

pub fn files(n: usize) -> Vec<FileRef> {
    (0..n).map(|i| png(&format!("file-{i}.png"))).collect()
}
