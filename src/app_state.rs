use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::store::CubeStore;

/// 全局应用状态，负责在各个 handler 之间共享网格存储与配置
pub struct AppState {
    pub cube_store: Arc<CubeStore>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            cube_store: Arc::new(CubeStore::with_ttl(config.cube_ttl())),
            config: Arc::new(config),
        }
    }
}
