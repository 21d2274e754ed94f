//! Shared helpers for HealthPlan integration tests

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;

use healthplan::api::{ApiError, ByteStream, PlanApi};
use healthplan::domain::{HealthGoal, Plan, Task, TaskRef, WeeklyPlan};

/// Sender side of a live generation body
pub type BodySender = mpsc::UnboundedSender<Result<Vec<u8>, ApiError>>;

/// A generation body fed by the test while the session consumes it
pub fn live_stream() -> (BodySender, ByteStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) });
    (tx, Box::pin(stream))
}

/// A generation body delivered in the given chunks
pub fn chunked_stream(chunks: Vec<Vec<u8>>) -> ByteStream {
    Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
}

/// Scripted planning service
pub struct ScriptedApi {
    streams: Mutex<VecDeque<ByteStream>>,
    saved: Mutex<Vec<Plan>>,
    failing_tasks: Mutex<HashSet<String>>,
    hold_updates: AtomicBool,
    gate: Semaphore,
    updates: Mutex<Vec<(String, TaskRef, bool)>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            streams: Mutex::default(),
            saved: Mutex::default(),
            failing_tasks: Mutex::default(),
            hold_updates: AtomicBool::default(),
            gate: Semaphore::new(0),
            updates: Mutex::default(),
        }
    }
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the body returned by the next generation request
    pub fn push_stream(&self, stream: ByteStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn save(&self, plan: Plan) {
        self.saved.lock().unwrap().push(plan);
    }

    pub fn saved(&self) -> Vec<Plan> {
        self.saved.lock().unwrap().clone()
    }

    /// Reject confirmations for this task id
    pub fn fail_task(&self, task_id: &str) {
        self.failing_tasks.lock().unwrap().insert(task_id.to_string());
    }

    /// Park confirmations until `release_updates` is called
    pub fn hold_updates(&self) {
        self.hold_updates.store(true, Ordering::SeqCst);
    }

    pub fn release_updates(&self, count: usize) {
        self.gate.add_permits(count);
    }

    pub fn updates(&self) -> Vec<(String, TaskRef, bool)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanApi for ScriptedApi {
    async fn open_generation(&self, _goal: &HealthGoal) -> Result<ByteStream, ApiError> {
        self.streams.lock().unwrap().pop_front().ok_or(ApiError::NoBody)
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, ApiError> {
        Ok(self.saved())
    }

    async fn get_plan(&self, plan_id: &str) -> Result<Plan, ApiError> {
        self.saved()
            .into_iter()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| ApiError::NotFound(plan_id.to_string()))
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<(), ApiError> {
        self.saved.lock().unwrap().retain(|p| p.id != plan_id);
        Ok(())
    }

    async fn update_task(&self, plan_id: &str, target: &TaskRef, completed: bool) -> Result<(), ApiError> {
        self.updates
            .lock()
            .unwrap()
            .push((plan_id.to_string(), target.clone(), completed));

        if self.hold_updates.load(Ordering::SeqCst) {
            self.gate.acquire().await.expect("gate closed").forget();
        }

        if self.failing_tasks.lock().unwrap().contains(&target.task_id) {
            return Err(ApiError::Status {
                status: 500,
                message: "could not save task".to_string(),
            });
        }

        let mut saved = self.saved.lock().unwrap();
        let task = saved
            .iter_mut()
            .find(|p| p.id == plan_id)
            .and_then(|p| p.week_mut(target.week))
            .and_then(|w| w.task_mut(&target.task_id));
        match task {
            Some(task) => {
                task.completed = completed;
                Ok(())
            }
            None => Err(ApiError::Status {
                status: 404,
                message: "Plan or task not found".to_string(),
            }),
        }
    }
}

pub fn goal() -> HealthGoal {
    HealthGoal::new("lose weight", "beginner", "3 months", "")
}

/// Body of the reference stream: overview, one week, two tasks, done
pub fn example_body(plan_id: &str) -> String {
    [
        r#"data: {"type":"overview","value":"Build habits before intensity, petits pas 🚶"}"#.to_string(),
        r#"data: {"type":"week_start","week":1,"focus":"Foundations"}"#.to_string(),
        r#"data: {"type":"task","week":1,"task":{"title":"Daily walk","description":"Brisk pace","duration":"20 mins"}}"#.to_string(),
        r#"data: {"type":"task","week":1,"task":{"title":"Track meals","description":"Use an app","duration":"5 mins"}}"#.to_string(),
        format!(r#"data: {{"type":"done","plan_id":"{}"}}"#, plan_id),
    ]
    .iter()
    .map(|frame| format!("{}\n\n", frame))
    .collect()
}

/// The example plan as the service stores it, with server task ids
pub fn stored_example(plan_id: &str) -> Plan {
    let mut plan = Plan::shell("lose weight");
    plan.id = plan_id.to_string();
    plan.overview = "Build habits before intensity, petits pas 🚶".to_string();
    let mut week = WeeklyPlan::new(1, "Foundations");
    week.tasks.push(
        Task::new("srv-1", "Daily walk")
            .with_description("Brisk pace")
            .with_duration("20 mins"),
    );
    week.tasks.push(
        Task::new("srv-2", "Track meals")
            .with_description("Use an app")
            .with_duration("5 mins"),
    );
    plan.weeks.push(week);
    plan
}

/// One canned HTTP response: status line text and JSON body
pub struct Canned {
    pub status: &'static str,
    pub body: String,
}

impl Canned {
    pub fn empty(status: &'static str) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn json(status: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Serve `responses` in order, one connection each, on a local port
///
/// Returns the base URL and a handle yielding the raw requests received.
pub async fn serve_canned(responses: Vec<Canned>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Failed to read stub address");

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for canned in responses {
            let (mut socket, _) = listener.accept().await.expect("Failed to accept");
            requests.push(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                canned.status,
                canned.body.len(),
                canned.body
            );
            socket.write_all(response.as_bytes()).await.expect("Failed to write response");
            let _ = socket.shutdown().await;
        }
        requests
    });

    (format!("http://{}", addr), handle)
}

/// Read one request: headers, then as much body as content-length says
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.expect("Failed to read request");
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);

        if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&request).into_owned()
}
