//! 指标计算错误.

use thiserror::Error;

/// 单个掩码对的指标计算错误.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// 真值与预测掩码形状不一致.
    #[error("mask shape mismatch: ground truth {gt:?}, prediction {pred:?}")]
    ShapeMismatch {
        /// 真值掩码形状.
        gt: Vec<usize>,
        /// 预测掩码形状.
        pred: Vec<usize>,
    },

    /// 掩码不含任何元素, 像素准确率与 MAE 均无定义.
    #[error("masks contain no voxels")]
    Empty,

    /// 展平掩码失败.
    #[error("flatten: {0}")]
    Flatten(#[from] ndarray::ShapeError),
}
