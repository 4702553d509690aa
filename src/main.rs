use actix_web::{App, HttpServer, web};
use log::{error, info};

use fluid_volume_backend::app_state::AppState;
use fluid_volume_backend::config::ServiceConfig;
use fluid_volume_backend::logger::init_logging;
use fluid_volume_backend::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(None);
            error!("配置无效: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };
    init_logging(config.log_level.as_deref());

    let app_state = web::Data::new(AppState::new(config.clone()));

    info!("已注册的读取器:");
    for ext in app_state.reader_registry.supported_extensions() {
        info!("  - .{}", ext);
    }

    // 启动后台清理任务：定期清理过期的任务与性能记录，避免长期占用内存
    let task_store = app_state.task_store.clone();
    let performance_store = app_state.performance_store.clone();
    let cleanup_interval = config.cleanup_interval();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let cleaned_count = task_store.cleanup_expired();
            performance_store.cleanup_expired();
            if cleaned_count > 0 {
                info!(
                    "[清理任务] 清理了 {} 个过期任务，当前剩余: {} 个任务",
                    cleaned_count,
                    task_store.task_count()
                );
            }
        }
    });

    info!("服务器启动在 http://{}:{}", config.host, config.port);
    info!("资源目录: {}", config.resource_dir);
    info!("任务 TTL: {} 分钟", app_state.task_store.ttl().as_secs() / 60);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
