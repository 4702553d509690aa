use std::path::{Component, Path};
use std::sync::Arc;

use actix_web::{HttpResponse, Responder, post, web};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app_state::AppState;
use crate::error::PipelineResult;
use crate::performance::records_from_report;
use crate::pipeline::{Pipeline, PipelineOptions, PipelineReport, SourceNames, VolumetricDocument};
use crate::task::{TaskData, TaskStatus};
use crate::utils::reader_registry::ReaderRegistry;

#[derive(Deserialize)]
pub struct ProcessRequest {
    /// 资源目录下的模拟结果文件，例如 "navier_stokes_results.json"
    pub simulation_file: String,
    /// 资源目录下的初始条件文件，例如 "initial_data.json"
    pub initial_data_file: String,
}

#[derive(Serialize, Clone)]
pub struct ProcessResponse {
    pub task_id: String,
    pub status: &'static str,
    pub simulation_file: String,
    pub initial_data_file: String,
}

#[derive(Deserialize)]
pub struct InlineProcessRequest {
    pub simulation: Value,
    pub initial_data: Value,
    pub simulation_name: Option<String>,
    pub initial_data_name: Option<String>,
}

#[post("/volume/process")]
pub async fn process_volume(
    data: web::Data<AppState>,
    payload: web::Json<ProcessRequest>,
) -> impl Responder {
    match run_process(
        data.get_ref(),
        &payload.simulation_file,
        &payload.initial_data_file,
    ) {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(err) => err,
    }
}

/// 直接提交两个文档，同步返回体数据文档
#[post("/volume/process-inline")]
pub async fn process_volume_inline(
    data: web::Data<AppState>,
    payload: web::Json<InlineProcessRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let sources = SourceNames::new(
        request
            .simulation_name
            .unwrap_or_else(|| "inline_simulation".to_string()),
        request
            .initial_data_name
            .unwrap_or_else(|| "inline_initial_data".to_string()),
    );
    let options = data.config.pipeline_options();

    let joined = web::block(move || {
        execute_pipeline(&request.simulation, &request.initial_data, &sources, options)
    })
    .await;

    match joined {
        Ok((Ok(document), _)) => HttpResponse::Ok().json(document),
        Ok((Err(e), _)) => HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "error": e.to_string(),
            "kind": e.kind(),
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "流水线执行失败",
            "details": e.to_string(),
        })),
    }
}

/// 运行流水线并返回结果与过程记录
pub fn execute_pipeline(
    simulation: &Value,
    initial_data: &Value,
    sources: &SourceNames,
    options: PipelineOptions,
) -> (PipelineResult<VolumetricDocument>, PipelineReport) {
    let mut pipeline = Pipeline::new(options);
    let result = pipeline.run(simulation, initial_data, sources);
    (result, pipeline.into_report())
}

/// 创建处理任务并启动后台流水线
///
/// ## 功能概述
/// 只做轻量级检查后立即返回 task_id：
/// 1. 检查文件名并构建完整路径
/// 2. 按扩展名查找读取器
/// 3. 确认文件存在
/// 4. 创建任务存储
/// 5. 后台读取文档并运行流水线，结果写回任务
///
/// ## 返回
/// - `Ok(ProcessResponse)`: 任务已创建
/// - `Err(HttpResponse)`: 文件名非法、格式不支持或文件不存在
pub fn run_process(
    app_state: &AppState,
    simulation_file: &str,
    initial_data_file: &str,
) -> Result<ProcessResponse, HttpResponse> {
    let simulation_path = resolve_input(app_state, simulation_file)?;
    let initial_data_path = resolve_input(app_state, initial_data_file)?;

    let sources = SourceNames::new(simulation_file, initial_data_file);
    let (task_id, task) = app_state.task_store.insert(TaskData::new(&sources));
    info!(
        "[后台处理] 创建任务 {}: {} + {}",
        task_id, simulation_file, initial_data_file
    );

    let registry = app_state.reader_registry.clone();
    let performance_store = app_state.performance_store.clone();
    let options = app_state.config.pipeline_options();
    let task_id_clone = task_id.clone();

    actix_web::rt::spawn(async move {
        let joined = web::block(move || {
            let simulation = read_document(&registry, &simulation_path)?;
            let initial_data = read_document(&registry, &initial_data_path)?;
            Ok::<_, TaskStatus>(execute_pipeline(
                &simulation,
                &initial_data,
                &sources,
                options,
            ))
        })
        .await;

        let status = match joined {
            Ok(Ok((result, report))) => {
                performance_store.add_records(&task_id_clone, records_from_report(&report));
                match result {
                    Ok(document) => TaskStatus::Ready(Arc::new(document)),
                    Err(e) => TaskStatus::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    },
                }
            }
            Ok(Err(load_failure)) => load_failure,
            Err(e) => TaskStatus::Failed {
                kind: "internal".to_string(),
                message: e.to_string(),
            },
        };
        if let TaskStatus::Failed { message, .. } = &status {
            error!("[后台处理] 任务 {} 失败: {}", task_id_clone, message);
        } else {
            info!("[后台处理] 任务 {} 完成", task_id_clone);
        }
        task.set_status(status);
    });

    Ok(ProcessResponse {
        task_id,
        status: "processing",
        simulation_file: simulation_file.to_string(),
        initial_data_file: initial_data_file.to_string(),
    })
}

fn read_document(registry: &ReaderRegistry, path: &str) -> Result<Value, TaskStatus> {
    registry.read_document(path).map_err(|e| TaskStatus::Failed {
        kind: "load".to_string(),
        message: e.to_string(),
    })
}

/// 校验文件名并返回资源目录下的完整路径
fn resolve_input(app_state: &AppState, file: &str) -> Result<String, HttpResponse> {
    let escapes = Path::new(file)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if file.is_empty() || escapes {
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "非法文件名",
            "file": file,
        })));
    }

    let file_path = format!("{}/{}", app_state.config.resource_dir, file);

    if app_state
        .reader_registry
        .find_reader_for_file(&file_path)
        .is_none()
    {
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "不支持的文件格式",
            "file": file,
            "supported_extensions": app_state.reader_registry.supported_extensions(),
        })));
    }

    if let Err(e) = std::fs::metadata(&file_path) {
        return Err(HttpResponse::NotFound().json(serde_json::json!({
            "error": "文件不存在或无法访问",
            "file": file,
            "details": e.to_string(),
        })));
    }

    Ok(file_path)
}
