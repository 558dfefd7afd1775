pub mod chunk;
pub mod cube;
pub mod data;
pub mod error;
pub mod health;
pub mod sample;

use std::sync::Arc;

use crate::app_state::AppState;
use crate::store::CubeEntry;

pub use chunk::get_cube_chunk;
pub use cube::{create_cube, delete_cube, get_cube, put_meta};
pub use data::{put_data, put_value};
pub use error::ApiError;
pub use health::hello;
pub use sample::sample_cube;

/// 按 id 取出网格，不存在时返回 404
pub(crate) fn lookup(data: &AppState, cube_id: &str) -> Result<Arc<CubeEntry>, ApiError> {
    data.cube_store
        .get(cube_id)
        .ok_or_else(|| ApiError::CubeNotFound(cube_id.to_string()))
}
