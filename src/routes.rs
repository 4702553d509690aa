use actix_web::web;

use crate::handlers;

/// 统一注册 HTTP 路由，方便集中管理
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::process_volume)
        .service(handlers::process_volume_inline)
        .service(handlers::get_volume_field)
        .service(handlers::get_volume)
        .service(handlers::get_performance);
}
