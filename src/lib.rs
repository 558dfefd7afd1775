//! 规则三维网格上的标量场（电子密度、分子轨道、静电势等）
//!
//! 核心是 [`Cube`]：几何定义、平铺的数据缓冲区、实时的最小/最大值统计、
//! 索引与坐标换算、精确读写和三线性插值。其余模块把多个网格放进存储，
//! 通过 HTTP 提供给渲染和分析端使用。

pub mod app_state;
pub mod config;
pub mod cube;
pub mod error;
pub mod handlers;
pub mod molecule;
pub mod routes;
pub mod store;

use tracing_subscriber::{EnvFilter, fmt};

pub use cube::{Cube, CubeType, Geometry, Limits, SharedCube};
pub use error::{GridError, Result};
pub use molecule::{AtomPositions, Molecule};

/// 初始化日志，RUST_LOG 优先于传入的默认过滤规则
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().with_env_filter(filter).with_target(false).init();
}
