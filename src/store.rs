use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cube::{Cube, SharedCube};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    pub index: usize,
    /// 开始位置（包含），单位：浮点元素索引
    pub start: usize,
    /// 结束位置（不包含），单位：浮点元素索引
    pub end: usize,
}

/// 把长度为 data_length 的线性数据按 chunk_size 划分成连续的块
/// chunk_size 至少按 1 处理
pub fn plan_chunks(data_length: usize, chunk_size: usize) -> Vec<ChunkDescriptor> {
    (0..chunk_count(data_length, chunk_size))
        .filter_map(|index| chunk_at(data_length, chunk_size, index))
        .collect()
}

pub fn chunk_count(data_length: usize, chunk_size: usize) -> usize {
    data_length.div_ceil(chunk_size.max(1))
}

/// 直接计算第 index 块的范围，块不存在时返回 None
pub fn chunk_at(data_length: usize, chunk_size: usize, index: usize) -> Option<ChunkDescriptor> {
    let chunk_size = chunk_size.max(1);
    let start = index.checked_mul(chunk_size)?;
    if start >= data_length {
        return None;
    }
    Some(ChunkDescriptor {
        index,
        start,
        end: start.saturating_add(chunk_size).min(data_length),
    })
}

/// 存储中的一个网格
pub struct CubeEntry {
    pub cube: SharedCube,
    /// 创建时间，用于 TTL 过期检查
    pub created_at: Instant,
}

/// 按 id 保存多个命名网格，过期的网格由后台任务定期清理
pub struct CubeStore {
    cubes: RwLock<HashMap<String, Arc<CubeEntry>>>,
    /// TTL（Time-To-Live）默认过期时间
    default_ttl: Duration,
}

impl CubeStore {
    /// 默认 TTL 为 30 分钟
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(30 * 60))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cubes: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    pub fn insert(&self, cube: Cube) -> String {
        let cube_id = Uuid::new_v4().to_string();
        let entry = CubeEntry {
            cube: cube.into_shared(),
            created_at: Instant::now(),
        };
        self.cubes.write().insert(cube_id.clone(), Arc::new(entry));
        cube_id
    }

    pub fn get(&self, cube_id: &str) -> Option<Arc<CubeEntry>> {
        self.cubes.read().get(cube_id).cloned()
    }

    /// 移除网格，返回是否存在
    /// 其他持有 SharedCube 句柄的调用方仍可继续使用该网格
    pub fn remove(&self, cube_id: &str) -> bool {
        self.cubes.write().remove(cube_id).is_some()
    }

    /// 清理过期的网格
    /// 返回清理的数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut cubes = self.cubes.write();
        let before_count = cubes.len();

        cubes.retain(|_, entry| now.duration_since(entry.created_at) < self.default_ttl);

        before_count - cubes.len()
    }

    /// 清理所有网格（通常在服务关闭时调用）
    pub fn clear_all(&self) {
        self.cubes.write().clear();
    }

    pub fn cube_count(&self) -> usize {
        self.cubes.read().len()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for CubeStore {
    fn default() -> Self {
        Self::new()
    }
}
