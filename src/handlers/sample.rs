use actix_web::{HttpResponse, get, web};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::handlers::{ApiError, lookup};

#[derive(Deserialize)]
pub struct SampleQuery {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SampleResponse {
    pub position: [f64; 3],
    /// 三线性插值结果
    pub value: f64,
    /// 最近格点
    pub closest_index: usize,
    pub index_vector: [i32; 3],
    pub closest_value: f64,
}

/// 在任意位置采样
/// 例如: /cubes/{cube_id}/sample?x=0.5&y=0.5&z=0.5
#[get("/cubes/{cube_id}/sample")]
pub async fn sample_cube(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SampleQuery>,
) -> Result<HttpResponse, ApiError> {
    let cube_id = path.into_inner();
    let entry = lookup(&data, &cube_id)?;
    let cube = entry.cube.read();

    let pos = Vector3::new(query.x, query.y, query.z);
    let closest_index = cube
        .closest_index(&pos)
        .ok_or_else(|| ApiError::BadRequest("网格尚未设置几何".to_string()))?;
    let ijk = cube.index_vector(&pos);
    Ok(HttpResponse::Ok().json(SampleResponse {
        position: pos.into(),
        value: cube.interpolate(&pos),
        closest_index,
        index_vector: ijk.into(),
        closest_value: cube.value_at(&ijk),
    }))
}
