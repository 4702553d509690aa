use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    let supported = data.reader_registry.supported_extensions();
    HttpResponse::Ok().json(serde_json::json!({
        "message": "流体体数据服务",
        "endpoints": [
            "POST /volume/process",
            "POST /volume/process-inline",
            "GET /volume?task_id=<id>",
            "GET /volume/field?task_id=<id>&step=<index>&field=density|temperature|velocity",
            "GET /performance?session_id=<id>",
        ],
        "supported_extensions": supported,
        "resource_dir": data.config.resource_dir,
        "tasks": data.task_store.task_count(),
    }))
}
