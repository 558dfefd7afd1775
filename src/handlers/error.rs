use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::warn;

use crate::error::GridError;

/// HTTP 层的错误，统一渲染为 `{"error": ..., "details": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("无效的 cube_id")]
    CubeNotFound(String),

    #[error("无效的 chunk_index")]
    ChunkNotFound(usize),

    #[error("请求参数错误")]
    BadRequest(String),

    #[error("网格超出服务允许的大小")]
    CubeTooLarge { len: usize, limit: usize },

    #[error("网格操作失败")]
    Grid(#[from] GridError),

    #[error("写入 chunk 数据失败")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn details(&self) -> String {
        match self {
            ApiError::CubeNotFound(cube_id) => cube_id.clone(),
            ApiError::ChunkNotFound(chunk_index) => chunk_index.to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::CubeTooLarge { len, limit } => format!("{len} 个格点，上限为 {limit}"),
            ApiError::Grid(e) => e.to_string(),
            ApiError::Io(e) => e.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::CubeNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ChunkNotFound(_)
            | ApiError::BadRequest(_)
            | ApiError::CubeTooLarge { .. }
            | ApiError::Grid(_) => StatusCode::BAD_REQUEST,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let details = self.details();
        warn!(error = %self, %details, "请求失败");
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
            "details": details,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_errors_are_client_errors() {
        let err = ApiError::from(GridError::EmptyStructure);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.details(), GridError::EmptyStructure.to_string());
    }

    #[test]
    fn oversized_cube_reports_the_limit() {
        let err = ApiError::CubeTooLarge {
            len: 1_000,
            limit: 512,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.details().contains("512"));
    }

    #[test]
    fn unknown_cube_is_not_found() {
        let err = ApiError::CubeNotFound("abc".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.details(), "abc");
    }
}
