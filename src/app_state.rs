use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::performance::PerformanceStore;
use crate::task::TaskStore;
use crate::utils::reader_registry::ReaderRegistry;

/// 全局应用状态，负责在各个 handler 之间共享读取器、配置与任务存储
pub struct AppState {
    pub reader_registry: Arc<ReaderRegistry>,
    pub config: ServiceConfig,
    pub task_store: Arc<TaskStore>,
    pub performance_store: Arc<PerformanceStore>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            reader_registry: Arc::new(ReaderRegistry::new()),
            task_store: Arc::new(TaskStore::with_ttl(config.task_ttl())),
            performance_store: Arc::new(PerformanceStore::with_ttl(config.task_ttl())),
            config,
        }
    }
}
