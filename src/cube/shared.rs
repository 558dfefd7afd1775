use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Cube;

/// 带读写锁的共享网格
///
/// `Cube` 自身的方法从不加锁；需要跨线程共享时由调用方显式获取读锁或写锁，
/// 并在锁的作用域内完成一组逻辑上原子的操作（例如计算线程分多步填充数据，
/// 渲染线程在填充完成后并发读取）。不要嵌套获取同一把锁。
#[derive(Debug, Clone, Default)]
pub struct SharedCube {
    inner: Arc<RwLock<Cube>>,
}

impl SharedCube {
    pub fn new(cube: Cube) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cube)),
        }
    }

    /// 底层读写锁
    pub fn lock(&self) -> &RwLock<Cube> {
        &self.inner
    }

    /// 获取共享读锁，允许多个读者同时持有
    pub fn read(&self) -> RwLockReadGuard<'_, Cube> {
        self.inner.read()
    }

    /// 获取独占写锁
    pub fn write(&self) -> RwLockWriteGuard<'_, Cube> {
        self.inner.write()
    }

    /// 两个句柄是否指向同一个网格
    pub fn ptr_eq(&self, other: &SharedCube) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Cube> for SharedCube {
    fn from(cube: Cube) -> Self {
        Self::new(cube)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;

    #[test]
    fn readers_share_the_lock() {
        let shared = Cube::new().into_shared();
        let a = shared.read();
        let b = shared.read();
        assert!(shared.lock().try_write().is_none());
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn writes_are_visible_through_clones() {
        let shared = SharedCube::from(Cube::new());
        let handle = shared.clone();
        {
            let mut cube = handle.write();
            cube.set_limits_dimensions(Vector3::zeros(), Vector3::new(2, 2, 2), Vector3::repeat(1.0))
                .unwrap();
            cube.set_value(1, 0, 0, 2.5).unwrap();
        }
        assert!(shared.ptr_eq(&handle));
        assert_eq!(shared.read().value(1, 0, 0), 2.5);
    }
}
