/// 数据的最小值与最大值
///
/// 除了极值本身，还记录每个极值在缓冲区中出现的次数。单点写入只在
/// 唯一持有某个极值的格点被改成更"靠内"的值时才需要重新扫描，
/// 其余情况都是 O(1) 更新，且极值始终与数据严格一致。
/// NaN 不参与统计。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extrema {
    min: f64,
    max: f64,
    min_count: usize,
    max_count: usize,
}

impl Default for Extrema {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            min_count: 0,
            max_count: 0,
        }
    }
}

impl Extrema {
    /// 完整扫描一次数据
    pub(crate) fn scan(values: &[f64]) -> Self {
        let mut extrema = Self::default();
        for &value in values {
            extrema.include(value);
        }
        extrema
    }

    pub(crate) fn min(&self) -> f64 {
        self.min
    }

    pub(crate) fn max(&self) -> f64 {
        self.max
    }

    /// 某个格点从 old 改为 new 之后更新统计
    /// values 必须是已经写入 new 之后的数据
    pub(crate) fn replace(&mut self, old: f64, new: f64, values: &[f64]) {
        if old == new || (old.is_nan() && new.is_nan()) {
            return;
        }

        let mut stale = false;
        if old == self.min {
            self.min_count -= 1;
            stale |= self.min_count == 0;
        }
        if old == self.max {
            self.max_count -= 1;
            stale |= self.max_count == 0;
        }

        if stale {
            *self = Self::scan(values);
        } else {
            self.include(new);
        }
    }

    fn include(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        if self.min_count == 0 {
            *self = Self {
                min: value,
                max: value,
                min_count: 1,
                max_count: 1,
            };
            return;
        }

        if value < self.min {
            self.min = value;
            self.min_count = 1;
        } else if value == self.min {
            self.min_count += 1;
        }

        if value > self.max {
            self.max = value;
            self.max_count = 1;
        } else if value == self.max {
            self.max_count += 1;
        }
    }
}
