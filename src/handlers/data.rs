use actix_web::{HttpResponse, put, web};
use serde::Deserialize;
use tracing::debug;

use crate::app_state::AppState;
use crate::handlers::{ApiError, lookup};

#[derive(Deserialize)]
pub struct DataRequest {
    pub values: Vec<f64>,
    /// true 时逐元素累加到现有数据上，否则整体替换
    #[serde(default)]
    pub accumulate: bool,
}

/// 单点写入，`index` 与 `flat_index` 二选一
#[derive(Deserialize)]
pub struct ValueRequest {
    pub index: Option<[i32; 3]>,
    pub flat_index: Option<usize>,
    pub value: f64,
}

/// 批量导入数据（替换或累加）
#[put("/cubes/{cube_id}/data")]
pub async fn put_data(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<DataRequest>,
) -> Result<HttpResponse, ApiError> {
    let cube_id = path.into_inner();
    let entry = lookup(&data, &cube_id)?;
    let request = payload.into_inner();

    // 整个批量写入在同一个写锁内完成，读者看不到中间状态
    let mut cube = entry.cube.write();
    if request.accumulate {
        cube.add_data(&request.values)?;
    } else {
        cube.set_data(&request.values)?;
    }
    debug!(
        %cube_id,
        accumulate = request.accumulate,
        min_value = cube.min_value(),
        max_value = cube.max_value(),
        "网格数据已更新"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "cube_id": cube_id,
        "data_length": cube.len(),
        "min_value": cube.min_value(),
        "max_value": cube.max_value(),
    })))
}

#[put("/cubes/{cube_id}/value")]
pub async fn put_value(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ValueRequest>,
) -> Result<HttpResponse, ApiError> {
    let cube_id = path.into_inner();
    let entry = lookup(&data, &cube_id)?;

    let mut cube = entry.cube.write();
    match (payload.index, payload.flat_index) {
        (Some([i, j, k]), None) => cube.set_value(i, j, k, payload.value)?,
        (None, Some(index)) => cube.set_value_index(index, payload.value)?,
        _ => {
            return Err(ApiError::BadRequest(
                "index 与 flat_index 必须且只能提供一个".to_string(),
            ));
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "cube_id": cube_id,
        "min_value": cube.min_value(),
        "max_value": cube.max_value(),
    })))
}
