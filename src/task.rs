use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::{SourceNames, VolumetricDocument};

/// 任务状态
#[derive(Debug, Clone)]
pub enum TaskStatus {
    /// 后台流水线仍在运行
    Processing,
    /// 已生成体数据文档
    Ready(Arc<VolumetricDocument>),
    /// 流水线中止，kind 对应 `PipelineError::kind`
    Failed { kind: String, message: String },
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Ready(_) => "ready",
            TaskStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSources {
    pub simulation: String,
    pub initial_data: String,
}

impl From<&SourceNames> for TaskSources {
    fn from(sources: &SourceNames) -> Self {
        Self {
            simulation: sources.simulation.clone(),
            initial_data: sources.initial_data.clone(),
        }
    }
}

/// 任务数据，保存一次流水线运行的状态与结果
pub struct TaskData {
    pub sources: TaskSources,
    status: RwLock<TaskStatus>,
    /// 任务创建时间，用于 TTL 过期检查
    pub created_at: Instant,
}

impl TaskData {
    /// 创建新的 TaskData（流水线尚未完成）
    pub fn new(sources: &SourceNames) -> Self {
        Self {
            sources: sources.into(),
            status: RwLock::new(TaskStatus::Processing),
            created_at: Instant::now(),
        }
    }

    /// 后台流水线完成后写入结果
    pub fn set_status(&self, status: TaskStatus) {
        *self.status.write() = status;
    }

    pub fn status(&self) -> TaskStatus {
        self.status.read().clone()
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// 任务存储，task_id 为 uuid v4
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Arc<TaskData>>>,
    ttl: Duration,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(30 * 60))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn insert(&self, data: TaskData) -> (String, Arc<TaskData>) {
        let task_id = Uuid::new_v4().to_string();
        let task = Arc::new(data);
        self.tasks.write().insert(task_id.clone(), task.clone());
        (task_id, task)
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<TaskData>> {
        self.tasks.read().get(task_id).cloned()
    }

    /// 清理过期任务（包括仍在处理中的），返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let mut tasks = self.tasks.write();
        let before_count = tasks.len();
        tasks.retain(|_, task| !task.is_expired(self.ttl));
        before_count - tasks.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
