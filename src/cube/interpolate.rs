use nalgebra::Vector3;

use super::Cube;

/// 单个轴上的插值单元：下角索引、上角索引和单元内的分数偏移 t ∈ [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisCell {
    lo: usize,
    hi: usize,
    t: f64,
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Cube {
    /// 三线性插值求任意点的值
    ///
    /// 点落在网格外（或恰好在上边界上）时使用最近的有效单元，偏移被限制在
    /// [0, 1] 内，因此网格外的点取边界值而不会外推。空网格返回 NaN。
    ///
    /// 该函数需要读取 8 个角点，比精确的格点读取慢得多，
    /// 只适合偶尔的采样（例如细化等值面交点），批量遍历请使用 `value`。
    pub fn interpolate(&self, pos: &Vector3<f64>) -> f64 {
        if self.data.is_empty() {
            return f64::NAN;
        }

        let [x, y, z] = [0, 1, 2].map(|axis| self.axis_cell(axis, pos[axis]));
        let corner = |i: usize, j: usize, k: usize| self.data[self.node_index(i, j, k)];

        // 先沿 x 插值得到 4 条棱上的值
        let c00 = lerp(corner(x.lo, y.lo, z.lo), corner(x.hi, y.lo, z.lo), x.t);
        let c10 = lerp(corner(x.lo, y.hi, z.lo), corner(x.hi, y.hi, z.lo), x.t);
        let c01 = lerp(corner(x.lo, y.lo, z.hi), corner(x.hi, y.lo, z.hi), x.t);
        let c11 = lerp(corner(x.lo, y.hi, z.hi), corner(x.hi, y.hi, z.hi), x.t);

        // 再沿 y 得到 2 个值，最后沿 z
        let c0 = lerp(c00, c10, y.t);
        let c1 = lerp(c01, c11, y.t);
        lerp(c0, c1, z.t)
    }

    /// 单精度版本的三线性插值
    pub fn interpolate_f32(&self, pos: &Vector3<f32>) -> f32 {
        self.interpolate(&pos.cast::<f64>()) as f32
    }

    fn axis_cell(&self, axis: usize, coord: f64) -> AxisCell {
        let geometry = &self.geometry;
        let n = geometry.dimensions()[axis] as usize;
        let h = geometry.spacing()[axis];
        if n < 2 || h <= 0.0 {
            return AxisCell { lo: 0, hi: 0, t: 0.0 };
        }

        let u = (coord - geometry.min()[axis]) / h;
        if u.is_nan() {
            return AxisCell { lo: 0, hi: 1, t: f64::NAN };
        }
        let last_cell = (n - 2) as f64;
        let lo = u.floor().clamp(0.0, last_cell);
        AxisCell {
            lo: lo as usize,
            hi: lo as usize + 1,
            t: (u - lo).clamp(0.0, 1.0),
        }
    }

    #[inline]
    fn node_index(&self, i: usize, j: usize, k: usize) -> usize {
        let points = self.geometry.dimensions();
        let (nx, ny) = (points.x as usize, points.y as usize);
        i + j * nx + k * nx * ny
    }
}
