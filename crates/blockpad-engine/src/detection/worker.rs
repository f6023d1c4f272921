//! The classifier worker and the request/response protocol.
//!
//! Classification runs on a background thread fed by an mpsc channel. The
//! worker holds no document state: each request carries the content and a
//! correlation id, each response echoes the id and a reply channel chosen by
//! the requester carries it back. Responses may arrive in any order.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

use once_cell::sync::Lazy;

use crate::detection::classifier::{Classifier, HeuristicClassifier};

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub content: String,
    pub correlation_id: u64,
}

/// An empty `language` or zero `confidence` means "no classification".
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResponse {
    pub language: String,
    pub confidence: f32,
    pub correlation_id: u64,
}

impl DetectionResponse {
    pub fn unclassified(correlation_id: u64) -> Self {
        Self {
            language: String::new(),
            confidence: 0.0,
            correlation_id,
        }
    }
}

/// Where detection requests go. Fire-and-forget: the answer, if any, comes
/// back on `reply`.
pub trait DetectionBackend {
    fn submit(&self, request: DetectionRequest, reply: Sender<DetectionResponse>);
}

enum Job {
    Classify {
        request: DetectionRequest,
        reply: Sender<DetectionResponse>,
    },
    Shutdown,
}

/// A running classifier thread.
pub struct ClassifierWorker {
    jobs: Sender<Job>,
    handle: Option<JoinHandle<()>>,
}

impl ClassifierWorker {
    pub fn spawn(classifier: Box<dyn Classifier>) -> std::io::Result<Self> {
        let (jobs, inbox) = channel();
        let handle = thread::Builder::new()
            .name("blockpad-classifier".to_string())
            .spawn(move || run(classifier, inbox))?;
        Ok(Self {
            jobs,
            handle: Some(handle),
        })
    }

    /// Queue a request. False if the thread is gone.
    pub fn send(&self, request: DetectionRequest, reply: Sender<DetectionResponse>) -> bool {
        self.jobs.send(Job::Classify { request, reply }).is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the thread and wait for it.
    pub fn stop(mut self) {
        let _ = self.jobs.send(Job::Shutdown);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("classifier worker had panicked");
        }
    }

    /// The process-wide worker, started on first use.
    pub fn global() -> GlobalWorker {
        GlobalWorker
    }

    /// Stop the process-wide worker. The next request starts a fresh one.
    pub fn shutdown() {
        let worker = lock_global().worker.take();
        if let Some(worker) = worker {
            worker.stop();
            log::info!("classifier worker stopped");
        }
    }
}

fn run(classifier: Box<dyn Classifier>, inbox: Receiver<Job>) {
    while let Ok(job) = inbox.recv() {
        match job {
            Job::Classify { request, reply } => {
                let result = classifier.classify(&request.content);
                let response = DetectionResponse {
                    language: result
                        .language
                        .map(|l| l.token().to_string())
                        .unwrap_or_default(),
                    confidence: result.confidence,
                    correlation_id: request.correlation_id,
                };
                // The requester may have gone away; nothing to do then.
                let _ = reply.send(response);
            }
            Job::Shutdown => break,
        }
    }
}

/// A lazily started worker that is restarted if its thread died.
pub struct WorkerSlot {
    worker: Option<ClassifierWorker>,
    factory: fn() -> Box<dyn Classifier>,
    restarts: usize,
}

impl WorkerSlot {
    pub fn new(factory: fn() -> Box<dyn Classifier>) -> Self {
        Self {
            worker: None,
            factory,
            restarts: 0,
        }
    }

    pub fn submit(&mut self, request: DetectionRequest, reply: Sender<DetectionResponse>) {
        if !self.worker.as_ref().is_some_and(|w| w.is_running()) {
            if self.worker.take().is_some() {
                self.restarts += 1;
                log::warn!("classifier worker died, restarting");
            }
            match ClassifierWorker::spawn((self.factory)()) {
                Ok(worker) => {
                    log::info!("classifier worker started");
                    self.worker = Some(worker);
                }
                Err(err) => {
                    log::warn!("classifier worker failed to start: {err}");
                    return;
                }
            }
        }
        if let Some(worker) = &self.worker
            && !worker.send(request, reply)
        {
            log::warn!("classifier worker unavailable, request dropped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| w.is_running())
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }
}

static GLOBAL: Lazy<Mutex<WorkerSlot>> =
    Lazy::new(|| Mutex::new(WorkerSlot::new(|| Box::new(HeuristicClassifier))));

fn lock_global() -> std::sync::MutexGuard<'static, WorkerSlot> {
    GLOBAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to the process-wide worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalWorker;

impl GlobalWorker {
    pub fn is_running(&self) -> bool {
        lock_global().is_running()
    }
}

impl DetectionBackend for GlobalWorker {
    fn submit(&self, request: DetectionRequest, reply: Sender<DetectionResponse>) {
        lock_global().submit(request, reply);
    }
}

/// Holds requests until the host answers them, for hosts that classify
/// elsewhere (another process, a remote service) and for driving the
/// pipeline step by step.
#[derive(Clone, Default)]
pub struct QueuedBackend {
    pending: Rc<RefCell<Vec<(DetectionRequest, Sender<DetectionResponse>)>>>,
    submitted: Rc<RefCell<usize>>,
}

impl QueuedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far, including answered ones.
    pub fn submitted(&self) -> usize {
        *self.submitted.borrow()
    }

    pub fn pending(&self) -> Vec<DetectionRequest> {
        self.pending.borrow().iter().map(|(r, _)| r.clone()).collect()
    }

    /// Answer one pending request. False if no such request is pending.
    pub fn respond(&self, response: DetectionResponse) -> bool {
        let mut pending = self.pending.borrow_mut();
        let Some(at) = pending
            .iter()
            .position(|(r, _)| r.correlation_id == response.correlation_id)
        else {
            return false;
        };
        let (_, reply) = pending.remove(at);
        reply.send(response).is_ok()
    }

    /// Answer every pending request with `classifier`.
    pub fn respond_all(&self, classifier: &dyn Classifier) -> usize {
        let drained: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        let count = drained.len();
        for (request, reply) in drained {
            let result = classifier.classify(&request.content);
            let _ = reply.send(DetectionResponse {
                language: result
                    .language
                    .map(|l| l.token().to_string())
                    .unwrap_or_default(),
                confidence: result.confidence,
                correlation_id: request.correlation_id,
            });
        }
        count
    }
}

impl DetectionBackend for QueuedBackend {
    fn submit(&self, request: DetectionRequest, reply: Sender<DetectionResponse>) {
        *self.submitted.borrow_mut() += 1;
        self.pending.borrow_mut().push((request, reply));
    }
}
