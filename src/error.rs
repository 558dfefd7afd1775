use thiserror::Error;

/// 网格操作的结果类型
pub type Result<T> = std::result::Result<T, GridError>;

/// 网格操作可能返回的错误
/// 所有错误都是局部、可修正的：修正请求后重试即可，失败时网格状态保持不变
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("维度不能为负数: {points:?}")]
    NegativeDimensions { points: [i32; 3] },

    #[error("边界不一致: min {min:?} 在某个轴上大于 max {max:?}")]
    InvertedBounds { min: [f64; 3], max: [f64; 3] },

    #[error("网格间距必须为正数: {spacing:?}")]
    NonPositiveSpacing { spacing: [f64; 3] },

    #[error("几何参数包含非有限值 (NaN 或无穷大)")]
    NonFiniteGeometry,

    #[error("网格过大: 维度 {points:?} 超出可寻址范围")]
    GridTooLarge { points: [i64; 3] },

    #[error("填充边距不能为负数: {padding}")]
    InvalidPadding { padding: f64 },

    #[error("结构中没有原子，无法确定网格边界")]
    EmptyStructure,

    #[error("数据量不匹配: 需要 {expected} 个元素，但提供了 {got} 个")]
    LengthMismatch { expected: usize, got: usize },

    #[error("索引越界: {index:?}，网格维度为 {points:?}")]
    IndexOutOfRange { index: [i64; 3], points: [i32; 3] },

    #[error("线性索引越界: {index}，数据长度为 {len}")]
    FlatIndexOutOfRange { index: usize, len: usize },
}
