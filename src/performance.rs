use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineReport;

/// 性能数据记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// 开始时间 (Unix 时间戳，毫秒)
    pub start_time: u64,
    /// 结束时间 (Unix 时间戳，毫秒)
    pub end_time: u64,
    /// 行组 (同一行组颜色相同)
    pub channel_group: String,
    /// 行号，这里使用阶段名，如 "validating", "deriving_steps"
    pub channel_index: String,
    /// 消息 (hover 时除了时间外的显示信息)
    pub msg: String,
}

/// 将一次流水线运行的阶段耗时转换为性能记录
pub fn records_from_report(report: &PipelineReport) -> Vec<PerformanceRecord> {
    report
        .timings
        .iter()
        .map(|timing| PerformanceRecord {
            start_time: timing.start_time,
            end_time: timing.end_time,
            channel_group: "pipeline".to_string(),
            channel_index: timing.stage.as_str().to_string(),
            msg: format!(
                "{} 耗时 {}ms",
                timing.stage.as_str(),
                timing.end_time.saturating_sub(timing.start_time)
            ),
        })
        .collect()
}

/// 单个会话的记录
struct PerformanceSession {
    created_at: Instant,
    records: Vec<PerformanceRecord>,
}

/// 性能数据存储，按 session_id（即 task_id）分组
pub struct PerformanceStore {
    sessions: RwLock<HashMap<String, PerformanceSession>>,
    ttl: Duration,
}

impl PerformanceStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(30 * 60))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// 追加记录，首次写入时开始计算会话的存活时间
    pub fn add_records(&self, session_id: &str, records: Vec<PerformanceRecord>) {
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_insert_with(|| PerformanceSession {
                created_at: Instant::now(),
                records: Vec::new(),
            })
            .records
            .extend(records);
    }

    pub fn get_records(&self, session_id: &str) -> Option<Vec<PerformanceRecord>> {
        self.sessions
            .read()
            .get(session_id)
            .map(|session| session.records.clone())
    }

    /// 清理过期会话，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before_count = sessions.len();
        sessions.retain(|_, session| session.created_at.elapsed() < self.ttl);
        before_count - sessions.len()
    }
}

impl Default for PerformanceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 记录覆盖的总时长（毫秒）
pub fn total_duration_ms(records: &[PerformanceRecord]) -> u64 {
    let start = records.iter().map(|r| r.start_time).min();
    let end = records.iter().map(|r| r.end_time).max();
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_sub(start),
        _ => 0,
    }
}
