use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use byteorder::{LittleEndian, WriteBytesExt};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::derivation::DerivedTimeStep;
use crate::handlers::volume::{find_task, status_response};
use crate::task::TaskStatus;

#[derive(Deserialize)]
pub struct FieldQuery {
    pub task_id: String,
    pub step: usize,
    /// density | temperature | velocity
    pub field: String,
}

/// 按节点顺序展平指定场量；速度每个节点 3 个值
pub fn field_values(step: &DerivedTimeStep, field: &str) -> Option<Vec<f64>> {
    match field {
        "density" => Some(step.density.clone()),
        "temperature" => Some(step.temperature.clone()),
        "velocity" => Some(step.velocity.iter().flatten().copied().collect()),
        _ => None,
    }
}

/// 获取单个时间步的单个场量，以小端 f64 二进制返回
#[get("/volume/field")]
pub async fn get_volume_field(
    data: web::Data<AppState>,
    query: web::Query<FieldQuery>,
) -> impl Responder {
    let task = match find_task(&data, &query.task_id) {
        Ok(task) => task,
        Err(resp) => return resp,
    };

    let document = match task.status() {
        TaskStatus::Ready(document) => document,
        status => return status_response(&query.task_id, &task, &status),
    };

    let Some(step) = document.time_steps.get(query.step) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 step",
            "step": query.step,
            "step_count": document.time_steps.len(),
        }));
    };

    let Some(values) = field_values(step, &query.field) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 field",
            "field": query.field,
            "supported_fields": ["density", "temperature", "velocity"],
        }));
    };

    // 将场数据序列化为二进制格式
    let mut bytes = Vec::with_capacity(values.len() * std::mem::size_of::<f64>());
    for value in &values {
        if let Err(e) = bytes.write_f64::<LittleEndian>(*value) {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "写入场数据失败",
                "details": e.to_string(),
            }));
        }
    }

    HttpResponse::Ok()
        .content_type(ContentType::octet_stream())
        .append_header(("X-Step-Index", step.frame_index.to_string()))
        .append_header(("X-Step-Time", step.time.to_string()))
        .append_header(("X-Field", query.field.clone()))
        .append_header(("X-Field-Length", values.len().to_string()))
        .body(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_values() {
        let step = DerivedTimeStep {
            time: 0.0,
            frame_index: 0,
            density: vec![1.0, 2.0],
            velocity: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            temperature: vec![300.0, 301.0],
        };
        assert_eq!(field_values(&step, "density"), Some(vec![1.0, 2.0]));
        assert_eq!(
            field_values(&step, "velocity"),
            Some(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
        assert_eq!(field_values(&step, "pressure"), None);
    }
}
