mod extrema;
mod geometry;
mod interpolate;
mod shared;

use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridError, Result};
use crate::molecule::AtomPositions;

use extrema::Extrema;
pub use geometry::{Geometry, Limits};
pub use shared::SharedCube;

/// 网格数据的来源/含义，仅作标记，不影响任何计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeType {
    VanDerWaals,
    ElectrostaticPotential,
    ElectronDensity,
    MolecularOrbital,
    FromFile,
    #[default]
    Unset,
}

/// 规则三维网格上的标量场
///
/// 数据按 x 变化最快、y 其次、z 最慢的顺序平铺存储，
/// 索引计算: `index = i + j * nx + k * nx * ny`。
///
/// 越界的精确读取返回 NaN；越界写入返回错误且不修改任何数据。
/// `min_value` / `max_value` 在每次写入后都与数据严格一致。
///
/// 本结构自身不加锁，跨线程共享时使用 [`SharedCube`]。
#[derive(Debug, Clone, Default)]
pub struct Cube {
    geometry: Geometry,
    data: Vec<f64>,
    extrema: Extrema,
    name: String,
    cube_type: CubeType,
}

impl Cube {
    /// 创建空网格（没有几何定义，数据长度为 0）
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 几何 ====================

    /// 设置网格几何并重新分配数据（全部置 0）
    /// 参数无效时返回错误，网格保持原样
    pub fn set_limits(&mut self, limits: Limits<'_>) -> Result<()> {
        self.set_geometry(limits.resolve()?)
    }

    /// 应用一个已经校验过的几何定义
    /// 内存不足以容纳新数据时返回 `GridTooLarge`，网格保持原样
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<()> {
        let len = geometry.len();
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| GridError::GridTooLarge {
                points: geometry.dimensions().cast::<i64>().into(),
            })?;
        data.resize(len, 0.0);

        debug!(
            name = %self.name,
            dimensions = ?geometry.dimensions(),
            spacing = ?geometry.spacing(),
            "网格几何已更新"
        );
        self.data = data;
        self.extrema = Extrema::scan(&self.data);
        self.geometry = geometry;
        Ok(())
    }

    pub fn set_limits_points(
        &mut self,
        min: Vector3<f64>,
        max: Vector3<f64>,
        points: Vector3<i32>,
    ) -> Result<()> {
        self.set_limits(Limits::Points { min, max, points })
    }

    pub fn set_limits_spacing(
        &mut self,
        min: Vector3<f64>,
        max: Vector3<f64>,
        spacing: Vector3<f64>,
    ) -> Result<()> {
        self.set_limits(Limits::Spacing { min, max, spacing })
    }

    pub fn set_limits_dimensions(
        &mut self,
        min: Vector3<f64>,
        points: Vector3<i32>,
        spacing: Vector3<f64>,
    ) -> Result<()> {
        self.set_limits(Limits::Dimensions {
            min,
            points,
            spacing,
        })
    }

    pub fn set_limits_like(&mut self, other: &Cube) -> Result<()> {
        self.set_limits(Limits::Like(other))
    }

    pub fn set_limits_molecule(
        &mut self,
        structure: &dyn AtomPositions,
        spacing: f64,
        padding: f64,
    ) -> Result<()> {
        self.set_limits(Limits::Molecule {
            structure,
            spacing,
            padding,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn min(&self) -> Vector3<f64> {
        self.geometry.min()
    }

    pub fn max(&self) -> Vector3<f64> {
        self.geometry.max()
    }

    pub fn spacing(&self) -> Vector3<f64> {
        self.geometry.spacing()
    }

    pub fn dimensions(&self) -> Vector3<i32> {
        self.geometry.dimensions()
    }

    // ==================== 索引与坐标 ====================

    /// 网格为空时返回 None
    pub fn closest_index(&self, pos: &Vector3<f64>) -> Option<usize> {
        self.geometry.closest_index(pos)
    }

    pub fn index_vector(&self, pos: &Vector3<f64>) -> Vector3<i32> {
        self.geometry.index_vector(pos)
    }

    pub fn position(&self, index: usize) -> Vector3<f64> {
        self.geometry.position(index)
    }

    // ==================== 精确读写 ====================

    /// 格点 (i, j, k) 的值，越界时返回 NaN
    #[inline]
    pub fn value(&self, i: i32, j: i32, k: i32) -> f64 {
        self.geometry
            .flat_index(i.into(), j.into(), k.into())
            .map_or(f64::NAN, |index| self.data[index])
    }

    #[inline]
    pub fn value_at(&self, ijk: &Vector3<i32>) -> f64 {
        self.value(ijk.x, ijk.y, ijk.z)
    }

    pub fn set_value(&mut self, i: i32, j: i32, k: i32, value: f64) -> Result<()> {
        let index = self
            .geometry
            .flat_index(i.into(), j.into(), k.into())
            .ok_or_else(|| GridError::IndexOutOfRange {
                index: [i, j, k].map(i64::from),
                points: self.geometry.dimensions().into(),
            })?;
        self.write(index, value);
        Ok(())
    }

    pub fn set_value_index(&mut self, index: usize, value: f64) -> Result<()> {
        if index >= self.data.len() {
            return Err(GridError::FlatIndexOutOfRange {
                index,
                len: self.data.len(),
            });
        }
        self.write(index, value);
        Ok(())
    }

    #[inline]
    fn write(&mut self, index: usize, value: f64) {
        let old = std::mem::replace(&mut self.data[index], value);
        self.extrema.replace(old, value, &self.data);
    }

    pub fn min_value(&self) -> f64 {
        self.extrema.min()
    }

    pub fn max_value(&self) -> f64 {
        self.extrema.max()
    }

    // ==================== 批量数据 ====================

    /// 整个数据数组（只读），用于批量导出和渲染
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 用给定数据替换整个缓冲区，长度必须等于 nx * ny * nz
    pub fn set_data(&mut self, values: &[f64]) -> Result<()> {
        self.check_length(values.len())?;
        self.data.copy_from_slice(values);
        self.extrema = Extrema::scan(&self.data);
        Ok(())
    }

    /// 把给定数据逐元素累加到现有数据上
    pub fn add_data(&mut self, values: &[f64]) -> Result<()> {
        self.check_length(values.len())?;
        for (value, delta) in self.data.iter_mut().zip(values) {
            *value += delta;
        }
        // 累加可能让极值向任意方向移动，必须完整重扫
        self.extrema = Extrema::scan(&self.data);
        Ok(())
    }

    /// 并行计算每个格点位置上的函数值并写入缓冲区
    pub fn fill_with<F>(&mut self, f: F)
    where
        F: Fn(Vector3<f64>) -> f64 + Sync,
    {
        let geometry = self.geometry;
        self.data
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, value)| *value = f(geometry.position(index)));
        self.extrema = Extrema::scan(&self.data);
    }

    fn check_length(&self, got: usize) -> Result<()> {
        if got != self.data.len() {
            return Err(GridError::LengthMismatch {
                expected: self.data.len(),
                got,
            });
        }
        Ok(())
    }

    // ==================== 元数据 ====================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn cube_type(&self) -> CubeType {
        self.cube_type
    }

    pub fn set_cube_type(&mut self, cube_type: CubeType) {
        self.cube_type = cube_type;
    }

    /// 交给读写锁，供多个线程共享
    pub fn into_shared(self) -> SharedCube {
        SharedCube::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::Molecule;

    fn cube(points: [i32; 3]) -> Cube {
        let mut cube = Cube::new();
        cube.set_limits_points(
            Vector3::zeros(),
            Vector3::from(points.map(|n| f64::from((n - 1).max(0)))),
            Vector3::from(points),
        )
        .unwrap();
        cube
    }

    #[test]
    fn new_cube_is_empty() {
        let cube = Cube::new();
        assert!(cube.is_empty());
        assert_eq!(cube.dimensions(), Vector3::zeros());
        assert_eq!(cube.cube_type(), CubeType::Unset);
        assert!(cube.value(0, 0, 0).is_nan());
    }

    #[test]
    fn set_limits_allocates_zeroed_buffer() {
        let cube = cube([3, 4, 5]);
        assert_eq!(cube.len(), 60);
        assert!(cube.data().iter().all(|&v| v == 0.0));
        assert_eq!((cube.min_value(), cube.max_value()), (0.0, 0.0));
    }

    #[test]
    fn unallocatable_grid_is_an_error() {
        // 1e15 个格点：能用 usize 表示，但无法分配
        let mut grid = cube([2, 2, 2]);
        grid.set_value(1, 1, 1, 4.0).unwrap();
        let err = grid
            .set_limits_dimensions(Vector3::zeros(), Vector3::repeat(100_000), Vector3::repeat(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            GridError::GridTooLarge {
                points: [100_000; 3]
            }
        );
        assert_eq!(grid.dimensions(), Vector3::repeat(2));
        assert_eq!(grid.value(1, 1, 1), 4.0);
        assert_eq!(grid.max_value(), 4.0);
    }

    #[test]
    fn closest_index_on_empty_cube_is_none() {
        assert_eq!(Cube::new().closest_index(&Vector3::zeros()), None);
        assert_eq!(cube([2, 2, 2]).closest_index(&Vector3::repeat(5.0)), Some(7));
    }

    #[test]
    fn geometry_change_discards_data() {
        let mut cube = cube([2, 2, 2]);
        cube.set_value(1, 1, 1, 9.0).unwrap();
        cube.set_limits_dimensions(Vector3::zeros(), Vector3::new(2, 2, 2), Vector3::repeat(1.0))
            .unwrap();
        assert_eq!(cube.value(1, 1, 1), 0.0);
        assert_eq!(cube.max_value(), 0.0);
    }

    #[test]
    fn failed_geometry_leaves_cube_untouched() {
        let mut cube = cube([2, 3, 4]);
        cube.set_value(1, 2, 3, 4.5).unwrap();
        let before = cube.geometry;

        let err = cube
            .set_limits_points(Vector3::zeros(), Vector3::repeat(1.0), Vector3::new(2, -2, 2))
            .unwrap_err();
        assert!(matches!(err, GridError::NegativeDimensions { .. }));
        assert!(cube
            .set_limits_spacing(Vector3::zeros(), Vector3::repeat(1.0), Vector3::zeros())
            .is_err());
        assert!(cube
            .set_limits_molecule(&Molecule::default(), 0.5, 1.0)
            .is_err());

        assert_eq!(cube.geometry, before);
        assert_eq!(cube.value(1, 2, 3), 4.5);
        assert_eq!(cube.max_value(), 4.5);
    }

    #[test]
    fn like_copies_geometry_but_not_values() {
        let mut source = cube([3, 2, 2]);
        source.set_value(2, 1, 1, 3.0).unwrap();

        let mut copy = Cube::new();
        copy.set_limits_like(&source).unwrap();
        assert_eq!(copy.geometry(), source.geometry());
        assert_eq!(copy.len(), source.len());
        assert!(copy.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn molecule_limits_pad_the_bounding_box() {
        let mol = Molecule::from(&[[0.0, 0.0, 0.0], [2.0, 1.0, 0.0]][..]);
        let mut cube = Cube::new();
        cube.set_limits_molecule(&mol, 0.5, 1.0).unwrap();
        assert_eq!(cube.min(), Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(cube.dimensions(), Vector3::new(9, 7, 5));
        assert_eq!(cube.max(), Vector3::new(3.0, 2.0, 1.0));

        assert!(matches!(
            cube.set_limits_molecule(&mol, 0.5, -1.0),
            Err(GridError::InvalidPadding { .. })
        ));
    }

    #[test]
    fn set_value_round_trips() {
        let mut cube = cube([3, 3, 3]);
        cube.set_value(2, 1, 0, -1.25).unwrap();
        assert_eq!(cube.value(2, 1, 0), -1.25);
        assert_eq!(cube.value_at(&Vector3::new(2, 1, 0)), -1.25);

        cube.set_value_index(26, 8.0).unwrap();
        assert_eq!(cube.value(2, 2, 2), 8.0);
        assert_eq!((cube.min_value(), cube.max_value()), (-1.25, 8.0));
    }

    #[test]
    fn out_of_range_access() {
        let mut cube = cube([2, 2, 2]);
        let before = cube.data().to_vec();

        assert!(matches!(
            cube.set_value(2, 0, 0, 1.0),
            Err(GridError::IndexOutOfRange { .. })
        ));
        assert!(cube.set_value(0, -1, 0, 1.0).is_err());
        assert!(matches!(
            cube.set_value_index(8, 1.0),
            Err(GridError::FlatIndexOutOfRange { index: 8, len: 8 })
        ));
        assert_eq!(cube.data(), &before[..]);
        assert!(cube.value(0, 0, 2).is_nan());
    }

    #[test]
    fn set_data_requires_matching_length() {
        let mut cube = cube([2, 2, 1]);
        assert_eq!(
            cube.set_data(&[1.0, 2.0, 3.0]),
            Err(GridError::LengthMismatch {
                expected: 4,
                got: 3
            })
        );
        cube.set_data(&[1.0, -2.0, 3.0, 0.5]).unwrap();
        assert_eq!((cube.min_value(), cube.max_value()), (-2.0, 3.0));
    }

    #[test]
    fn add_data_twice_accumulates() {
        let mut cube = cube([3, 2, 2]);
        let ones = vec![1.0; cube.len()];
        cube.add_data(&ones).unwrap();
        cube.add_data(&ones).unwrap();
        assert!(cube.data().iter().all(|&v| v == 2.0));
        assert_eq!((cube.min_value(), cube.max_value()), (2.0, 2.0));
        assert!(cube.add_data(&ones[1..]).is_err());
    }

    #[test]
    fn overwriting_the_maximum_lowers_it() {
        let mut cube = cube([2, 1, 1]);
        cube.set_value(0, 0, 0, 10.0).unwrap();
        cube.set_value(0, 0, 0, 3.0).unwrap();
        assert_eq!(cube.max_value(), 3.0);
        cube.set_value(0, 0, 0, -3.0).unwrap();
        assert_eq!((cube.min_value(), cube.max_value()), (-3.0, 0.0));
    }

    #[test]
    fn fill_with_evaluates_at_node_positions() {
        let mut cube = cube([4, 3, 2]);
        cube.fill_with(|p| p.x + 10.0 * p.y + 100.0 * p.z);
        assert_eq!(cube.value(3, 2, 1), 123.0);
        assert_eq!((cube.min_value(), cube.max_value()), (0.0, 123.0));
    }

    #[test]
    fn metadata_is_plain_storage() {
        let mut cube = cube([2, 2, 2]);
        cube.set_name("HOMO");
        cube.set_cube_type(CubeType::MolecularOrbital);
        assert_eq!(cube.name(), "HOMO");
        assert_eq!(cube.cube_type(), CubeType::MolecularOrbital);
        assert_eq!(cube.len(), 8);
    }
}
