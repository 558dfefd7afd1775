use nalgebra::Vector3;

use crate::error::{GridError, Result};
use crate::molecule::AtomPositions;

use super::Cube;

/// (max - min) / spacing 与整数只差浮点舍入误差时视为整数，不再多加一层格点
/// 实际容差按边界的绝对值缩放
const SNAP_ULPS: f64 = 8.0 * f64::EPSILON;

/// 设置网格几何的几种等价方式
/// 所有方式最终都归结为同一个 `Geometry`，并由 `Cube::set_limits` 统一应用
pub enum Limits<'a> {
    /// 给定边界和格点数，间距由两者推导
    Points {
        min: Vector3<f64>,
        max: Vector3<f64>,
        points: Vector3<i32>,
    },
    /// 给定边界和间距，格点数向上取整，max 可能向外扩展以保持间距精确
    Spacing {
        min: Vector3<f64>,
        max: Vector3<f64>,
        spacing: Vector3<f64>,
    },
    /// 给定起点、格点数和间距，max 由三者推导
    Dimensions {
        min: Vector3<f64>,
        points: Vector3<i32>,
        spacing: Vector3<f64>,
    },
    /// 复制另一个网格的几何（不复制数据）
    Like(&'a Cube),
    /// 分子包围盒向外扩展 padding 后按均匀间距划分
    Molecule {
        structure: &'a dyn AtomPositions,
        spacing: f64,
        padding: f64,
    },
}

impl Limits<'_> {
    /// 校验参数并求出完整的几何定义，不修改任何网格
    pub fn resolve(&self) -> Result<Geometry> {
        match self {
            Limits::Points { min, max, points } => Geometry::from_points(*min, *max, *points),
            Limits::Spacing { min, max, spacing } => Geometry::from_spacing(*min, *max, *spacing),
            Limits::Dimensions {
                min,
                points,
                spacing,
            } => Geometry::from_dimensions(*min, *points, *spacing),
            Limits::Like(other) => Ok(*other.geometry()),
            Limits::Molecule {
                structure,
                spacing,
                padding,
            } => {
                if !padding.is_finite() || *padding < 0.0 {
                    return Err(GridError::InvalidPadding { padding: *padding });
                }
                let (lo, hi) = structure.extent().ok_or(GridError::EmptyStructure)?;
                let pad = Vector3::repeat(*padding);
                Geometry::from_spacing(lo - pad, hi + pad, Vector3::repeat(*spacing))
            }
        }
    }
}

/// 规则网格的几何定义：边界、间距与各轴格点数
///
/// 线性索引按 x 变化最快、y 其次、z 最慢排列:
/// `index = i + j * nx + k * nx * ny`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    min: Vector3<f64>,
    max: Vector3<f64>,
    spacing: Vector3<f64>,
    points: Vector3<i32>,
}

impl Geometry {
    pub fn from_points(min: Vector3<f64>, max: Vector3<f64>, points: Vector3<i32>) -> Result<Self> {
        check_finite(&[min, max])?;
        check_points(&points)?;
        check_bounds(&min, &max)?;
        check_size(&points.cast::<i64>())?;

        let steps = points.map(|n| f64::from((n - 1).max(1)));
        Ok(Self {
            min,
            max,
            spacing: (max - min).component_div(&steps),
            points,
        })
    }

    pub fn from_spacing(
        min: Vector3<f64>,
        max: Vector3<f64>,
        spacing: Vector3<f64>,
    ) -> Result<Self> {
        check_finite(&[min, max, spacing])?;
        check_spacing(&spacing)?;
        check_bounds(&min, &max)?;

        let points = Vector3::from_fn(|axis, _| {
            let h = spacing[axis];
            let ratio = (max[axis] - min[axis]) / h;
            if !ratio.is_finite() {
                return i64::MAX;
            }
            // 相减的舍入误差与边界的绝对值成正比
            let tolerance = (SNAP_ULPS * (min[axis].abs() + max[axis].abs()) / h).min(0.5);
            ((ratio - tolerance).ceil().max(0.0) as i64).saturating_add(1)
        });
        let points = check_size(&points)?;
        let geometry = Self::from_dimensions(min, points, spacing)?;
        // 吸附后 max 可能比请求值小几个 ulp，max 只允许向外移动
        Ok(Self {
            max: geometry.max.sup(&max),
            ..geometry
        })
    }

    pub fn from_dimensions(
        min: Vector3<f64>,
        points: Vector3<i32>,
        spacing: Vector3<f64>,
    ) -> Result<Self> {
        check_finite(&[min, spacing])?;
        check_points(&points)?;
        check_spacing(&spacing)?;
        check_size(&points.cast::<i64>())?;

        let steps = points.map(|n| f64::from((n - 1).max(0)));
        let max = min + spacing.component_mul(&steps);
        check_finite(&[max])?;
        Ok(Self {
            min,
            max,
            spacing,
            points,
        })
    }

    pub fn min(&self) -> Vector3<f64> {
        self.min
    }

    pub fn max(&self) -> Vector3<f64> {
        self.max
    }

    pub fn spacing(&self) -> Vector3<f64> {
        self.spacing
    }

    pub fn dimensions(&self) -> Vector3<i32> {
        self.points
    }

    /// 格点总数 nx * ny * nz
    pub fn len(&self) -> usize {
        self.points.iter().map(|&n| n as usize).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (i, j, k) 对应的线性索引，越界时返回 None
    #[inline]
    pub fn flat_index(&self, i: i64, j: i64, k: i64) -> Option<usize> {
        let [nx, ny, nz] = [self.points.x, self.points.y, self.points.z].map(i64::from);
        if !(0..nx).contains(&i) || !(0..ny).contains(&j) || !(0..nz).contains(&k) {
            return None;
        }
        Some((i + j * nx + k * nx * ny) as usize)
    }

    /// 离给定位置最近的格点 (i, j, k)，每个分量都被限制在 [0, n-1] 内
    pub fn index_vector(&self, pos: &Vector3<f64>) -> Vector3<i32> {
        Vector3::from_fn(|axis, _| self.nearest_on_axis(axis, pos[axis]))
    }

    /// 离给定位置最近的格点的线性索引，网格为空时返回 None
    pub fn closest_index(&self, pos: &Vector3<f64>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let ijk = self.index_vector(pos).map(|c| c as usize);
        let (nx, ny) = (self.points.x as usize, self.points.y as usize);
        Some(ijk.x + ijk.y * nx + ijk.z * nx * ny)
    }

    /// 把线性索引分解为 (i, j, k)
    pub fn unflatten(&self, index: usize) -> Vector3<i32> {
        let (nx, ny) = (self.points.x as usize, self.points.y as usize);
        if nx == 0 || ny == 0 {
            return Vector3::zeros();
        }
        Vector3::new(index % nx, (index / nx) % ny, index / (nx * ny)).map(|c| c as i32)
    }

    /// 线性索引对应的空间坐标
    pub fn position(&self, index: usize) -> Vector3<f64> {
        self.node_position(&self.unflatten(index))
    }

    /// 格点 (i, j, k) 的空间坐标: min + spacing ⊙ (i, j, k)
    #[inline]
    pub fn node_position(&self, ijk: &Vector3<i32>) -> Vector3<f64> {
        self.min + self.spacing.component_mul(&ijk.map(f64::from))
    }

    fn nearest_on_axis(&self, axis: usize, coord: f64) -> i32 {
        let n = self.points[axis];
        let h = self.spacing[axis];
        if n <= 1 || h <= 0.0 {
            return 0;
        }
        // NaN 坐标经 as 转换后落在 0
        ((coord - self.min[axis]) / h).round().clamp(0.0, f64::from(n - 1)) as i32
    }
}

fn check_finite(vectors: &[Vector3<f64>]) -> Result<()> {
    if vectors.iter().all(|v| v.iter().all(|c| c.is_finite())) {
        Ok(())
    } else {
        Err(GridError::NonFiniteGeometry)
    }
}

fn check_points(points: &Vector3<i32>) -> Result<()> {
    if points.iter().any(|&n| n < 0) {
        return Err(GridError::NegativeDimensions {
            points: (*points).into(),
        });
    }
    Ok(())
}

fn check_spacing(spacing: &Vector3<f64>) -> Result<()> {
    if spacing.iter().any(|&h| h <= 0.0) {
        return Err(GridError::NonPositiveSpacing {
            spacing: (*spacing).into(),
        });
    }
    Ok(())
}

fn check_bounds(min: &Vector3<f64>, max: &Vector3<f64>) -> Result<()> {
    if min.iter().zip(max.iter()).any(|(lo, hi)| lo > hi) {
        return Err(GridError::InvertedBounds {
            min: (*min).into(),
            max: (*max).into(),
        });
    }
    Ok(())
}

/// 每个轴必须能用 i32 表示，总格点数必须能用 usize 表示
fn check_size(points: &Vector3<i64>) -> Result<Vector3<i32>> {
    let too_large = || GridError::GridTooLarge {
        points: (*points).into(),
    };
    let mut total: usize = 1;
    for &n in points.iter() {
        let n = i32::try_from(n).map_err(|_| too_large())?;
        total = total.checked_mul(n as usize).ok_or_else(too_large)?;
    }
    total
        .checked_mul(std::mem::size_of::<f64>())
        .ok_or_else(too_large)?;
    Ok(points.map(|n| n as i32))
}
