use actix_web::{HttpResponse, Responder, get, web};
use log::debug;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::performance::total_duration_ms;

#[derive(Deserialize)]
pub struct PerformanceQuery {
    /// 即处理任务的 task_id
    pub session_id: String,
}

/// 获取指定任务的流水线阶段耗时
#[get("/performance")]
pub async fn get_performance(
    data: web::Data<AppState>,
    query: web::Query<PerformanceQuery>,
) -> impl Responder {
    let records = data
        .performance_store
        .get_records(&query.session_id)
        .unwrap_or_default();
    debug!(
        "[性能数据查询] session_id: {}, 记录数: {}",
        query.session_id,
        records.len()
    );

    // 任务可能仍在处理中，此时返回空数组
    HttpResponse::Ok().json(serde_json::json!({
        "session_id": query.session_id,
        "total_ms": total_duration_ms(&records),
        "records": records,
    }))
}
