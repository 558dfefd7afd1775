use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app_state::AppState;
use crate::cube::{Cube, CubeType, Limits};
use crate::handlers::{ApiError, lookup};
use crate::molecule::Molecule;
use crate::store::{ChunkDescriptor, chunk_count, plan_chunks};

/// 分块数超过该值时 `CubeInfo` 只给出块数，不再逐个列出
pub const MAX_LISTED_CHUNKS: usize = 4096;

/// 几何定义请求，对应 `Limits` 的各个变体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitsRequest {
    Points {
        min: [f64; 3],
        max: [f64; 3],
        points: [i32; 3],
    },
    Spacing {
        min: [f64; 3],
        max: [f64; 3],
        spacing: [f64; 3],
    },
    Dimensions {
        min: [f64; 3],
        points: [i32; 3],
        spacing: [f64; 3],
    },
    /// 复制已存储网格的几何
    Like { cube_id: String },
    /// 由原子坐标的包围盒加边距确定
    Molecule {
        atoms: Vec<[f64; 3]>,
        spacing: f64,
        padding: f64,
    },
}

#[derive(Debug, Deserialize)]
pub struct CreateCubeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cube_type: CubeType,
    pub limits: LimitsRequest,
    pub chunk_size: Option<usize>,
}

#[derive(Deserialize)]
pub struct CubeQuery {
    pub chunk_size: Option<usize>,
}

#[derive(Deserialize)]
pub struct MetaRequest {
    pub name: Option<String>,
    pub cube_type: Option<CubeType>,
}

/// 网格的几何、元数据、统计值与分块信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeInfo {
    pub cube_id: String,
    pub name: String,
    pub cube_type: CubeType,
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub spacing: [f64; 3],
    pub dimensions: [i32; 3],
    pub data_length: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub chunks: Vec<ChunkDescriptor>,
}

impl CubeInfo {
    pub fn describe(cube_id: String, cube: &Cube, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunk_count = chunk_count(cube.len(), chunk_size);
        let chunks = if chunk_count <= MAX_LISTED_CHUNKS {
            plan_chunks(cube.len(), chunk_size)
        } else {
            Vec::new()
        };
        Self {
            cube_id,
            name: cube.name().to_string(),
            cube_type: cube.cube_type(),
            min: cube.min().into(),
            max: cube.max().into(),
            spacing: cube.spacing().into(),
            dimensions: cube.dimensions().into(),
            data_length: cube.len(),
            min_value: cube.min_value(),
            max_value: cube.max_value(),
            chunk_size,
            chunk_count,
            chunks,
        }
    }
}

/// 创建网格并放入存储
/// 例如: POST /cubes {"name": "rho", "limits": {"spacing": {"min": [...], "max": [...], "spacing": [...]}}}
#[post("/cubes")]
pub async fn create_cube(
    data: web::Data<AppState>,
    payload: web::Json<CreateCubeRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = payload.into_inner();
    let chunk_size = request
        .chunk_size
        .unwrap_or(data.config.default_chunk_size);

    let mut cube = Cube::new();
    cube.set_name(request.name);
    cube.set_cube_type(request.cube_type);
    apply_limits(&data, &mut cube, &request.limits)?;

    let mut info = CubeInfo::describe(String::new(), &cube, chunk_size);
    info.cube_id = data.cube_store.insert(cube);
    info!(
        cube_id = %info.cube_id,
        name = %info.name,
        dimensions = ?info.dimensions,
        "网格已创建"
    );
    Ok(HttpResponse::Created().json(info))
}

fn apply_limits(data: &AppState, cube: &mut Cube, limits: &LimitsRequest) -> Result<(), ApiError> {
    let max_len = data.config.max_cube_len;
    match limits {
        LimitsRequest::Points { min, max, points } => apply_bounded(
            cube,
            Limits::Points {
                min: (*min).into(),
                max: (*max).into(),
                points: (*points).into(),
            },
            max_len,
        ),
        LimitsRequest::Spacing { min, max, spacing } => apply_bounded(
            cube,
            Limits::Spacing {
                min: (*min).into(),
                max: (*max).into(),
                spacing: (*spacing).into(),
            },
            max_len,
        ),
        LimitsRequest::Dimensions {
            min,
            points,
            spacing,
        } => apply_bounded(
            cube,
            Limits::Dimensions {
                min: (*min).into(),
                points: (*points).into(),
                spacing: (*spacing).into(),
            },
            max_len,
        ),
        LimitsRequest::Like { cube_id } => {
            let entry = lookup(data, cube_id)?;
            let source = entry.cube.read();
            apply_bounded(cube, Limits::Like(&*source), max_len)
        }
        LimitsRequest::Molecule {
            atoms,
            spacing,
            padding,
        } => {
            let molecule = Molecule::from(atoms.as_slice());
            apply_bounded(
                cube,
                Limits::Molecule {
                    structure: &molecule,
                    spacing: *spacing,
                    padding: *padding,
                },
                max_len,
            )
        }
    }
}

/// 先求出几何并检查格点数上限，通过后才分配数据
fn apply_bounded(cube: &mut Cube, limits: Limits<'_>, max_len: usize) -> Result<(), ApiError> {
    let geometry = limits.resolve()?;
    if geometry.len() > max_len {
        return Err(ApiError::CubeTooLarge {
            len: geometry.len(),
            limit: max_len,
        });
    }
    cube.set_geometry(geometry)?;
    Ok(())
}

#[get("/cubes/{cube_id}")]
pub async fn get_cube(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<CubeQuery>,
) -> Result<HttpResponse, ApiError> {
    let cube_id = path.into_inner();
    let entry = lookup(&data, &cube_id)?;
    let chunk_size = query.chunk_size.unwrap_or(data.config.default_chunk_size);
    let info = CubeInfo::describe(cube_id, &entry.cube.read(), chunk_size);
    Ok(HttpResponse::Ok().json(info))
}

#[delete("/cubes/{cube_id}")]
pub async fn delete_cube(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let cube_id = path.into_inner();
    if !data.cube_store.remove(&cube_id) {
        return Err(ApiError::CubeNotFound(cube_id));
    }
    info!(%cube_id, "网格已删除");
    Ok(HttpResponse::NoContent().finish())
}

/// 修改名称和类型标记，不影响几何与数据
#[put("/cubes/{cube_id}/meta")]
pub async fn put_meta(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<MetaRequest>,
) -> Result<HttpResponse, ApiError> {
    let cube_id = path.into_inner();
    let entry = lookup(&data, &cube_id)?;
    let request = payload.into_inner();

    let mut cube = entry.cube.write();
    if let Some(name) = request.name {
        cube.set_name(name);
    }
    if let Some(cube_type) = request.cube_type {
        cube.set_cube_type(cube_type);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "cube_id": cube_id,
        "name": cube.name(),
        "cube_type": cube.cube_type(),
    })))
}
