use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::task::{TaskData, TaskStatus};

#[derive(Deserialize)]
pub struct VolumeQuery {
    pub task_id: String,
}

/// 查询任务结果，就绪时返回完整体数据文档
/// 例如: /volume?task_id=xxx
#[get("/volume")]
pub async fn get_volume(data: web::Data<AppState>, query: web::Query<VolumeQuery>) -> impl Responder {
    let task = match find_task(&data, &query.task_id) {
        Ok(task) => task,
        Err(resp) => return resp,
    };

    match task.status() {
        TaskStatus::Ready(document) => HttpResponse::Ok().json(document.as_ref()),
        status => status_response(&query.task_id, &task, &status),
    }
}

pub(crate) fn find_task(data: &AppState, task_id: &str) -> Result<Arc<TaskData>, HttpResponse> {
    data.task_store.get(task_id).ok_or_else(|| {
        HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 task_id",
            "task_id": task_id,
        }))
    })
}

/// 未就绪任务的响应：处理中 202，失败 422
pub(crate) fn status_response(task_id: &str, task: &TaskData, status: &TaskStatus) -> HttpResponse {
    match status {
        TaskStatus::Failed { kind, message } => {
            HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "error": message,
                "kind": kind,
                "task_id": task_id,
                "status": status.label(),
                "sources": task.sources,
            }))
        }
        _ => HttpResponse::Accepted().json(serde_json::json!({
            "error": "任务正在处理中，请稍后重试",
            "task_id": task_id,
            "status": status.label(),
            "sources": task.sources,
        })),
    }
}
