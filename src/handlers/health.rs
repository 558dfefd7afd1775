use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "体数据网格服务",
        "cube_count": data.cube_store.cube_count(),
        "default_chunk_size": data.config.default_chunk_size,
        "cube_ttl_secs": data.cube_store.default_ttl().as_secs(),
        "endpoints": [
            "POST /cubes",
            "GET /cubes/{cube_id}",
            "DELETE /cubes/{cube_id}",
            "PUT /cubes/{cube_id}/data",
            "PUT /cubes/{cube_id}/value",
            "PUT /cubes/{cube_id}/meta",
            "GET /cubes/{cube_id}/sample?x=&y=&z=",
            "GET /cubes/{cube_id}/chunk?chunk_index=&chunk_size=&gzip=",
        ],
    }))
}
