use actix_web::web;

use crate::handlers;

/// 统一注册 HTTP 路由，方便集中管理
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::create_cube)
        .service(handlers::get_cube)
        .service(handlers::delete_cube)
        .service(handlers::put_meta)
        .service(handlers::put_data)
        .service(handlers::put_value)
        .service(handlers::sample_cube)
        .service(handlers::get_cube_chunk);
}
