//! 分割掩码对的一致性指标.
//!
//! 包括三个计算核 (像素重叠, 混淆计数, 逐切片 Hausdorff 距离) 以及将它们与
//! 平均绝对误差组合起来的 [`pair_metrics`].

mod confusion;
mod distance;
mod error;
mod pixel;

use ndarray::{ArrayView1, ArrayView3};

pub use confusion::{confusion_counts, precision_recall_f1, ConfusionMetrics};
pub use distance::{hausdorff_3d, rows_hausdorff, slice_hausdorff, EmptySlicePolicy, PointSet};
pub use error::MetricError;
pub use pixel::{iou_dice_accuracy, PixelMetrics};

#[cfg(feature = "rayon")]
pub use distance::par_hausdorff_3d;

/// 指标计算结果.
pub type MetricResult<T> = Result<T, MetricError>;

/// 一对掩码的 8 项指标.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairMetrics {
    /// 交并比.
    pub iou: f64,
    /// Dice 系数.
    pub dice: f64,
    /// 像素准确率.
    pub pixel_accuracy: f64,
    /// 精确率.
    pub precision: f64,
    /// 召回率.
    pub recall: f64,
    /// F1 分数.
    pub f1: f64,
    /// 平均绝对误差.
    pub mae: f64,
    /// 逐切片近似的 Hausdorff 距离.
    pub hausdorff: f64,
}

/// 展平后的平均绝对误差 `mean(|gt - pred|)`.
///
/// 如果 `gt` 和 `pred` 长度不一致, 则程序 panic.
pub fn mean_absolute_error(gt: ArrayView1<u8>, pred: ArrayView1<u8>) -> f64 {
    assert_eq!(gt.len(), pred.len(), "掩码长度不一致");
    let total: u64 = gt
        .iter()
        .zip(pred.iter())
        .map(|(g, p)| u64::from(g.abs_diff(*p)))
        .sum();
    total as f64 / gt.len() as f64
}

/// 计算一对掩码的全部指标.
///
/// 像素指标与 MAE 在展平后的掩码上计算; 精确率/召回率/F1 只把 0/1 视为有效值,
/// 因此仅对二值掩码有意义; Hausdorff 距离在原始 3D 掩码上按 `points` 逐切片计算.
///
/// 任意一个计算核失败都会使整个结果失败, 不存在部分结果.
pub fn pair_metrics(
    gt: ArrayView3<u8>,
    pred: ArrayView3<u8>,
    points: PointSet,
    policy: EmptySlicePolicy,
) -> MetricResult<PairMetrics> {
    if gt.shape() != pred.shape() {
        return Err(MetricError::ShapeMismatch {
            gt: gt.shape().to_vec(),
            pred: pred.shape().to_vec(),
        });
    }
    if gt.is_empty() {
        return Err(MetricError::Empty);
    }

    // 非标准布局时先复制为行优先布局再展平.
    let (gt_std, pred_std) = (gt.as_standard_layout(), pred.as_standard_layout());
    let gt_flat = gt_std.view().into_shape(gt.len())?;
    let pred_flat = pred_std.view().into_shape(pred.len())?;

    let pixel = iou_dice_accuracy(gt_flat, pred_flat);
    let confusion = precision_recall_f1(gt_flat, pred_flat);
    let mae = mean_absolute_error(gt_flat, pred_flat);

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let hausdorff = par_hausdorff_3d(gt, pred, points, policy);
        } else {
            let hausdorff = hausdorff_3d(gt, pred, points, policy);
        }
    }

    Ok(PairMetrics {
        iou: pixel.iou,
        dice: pixel.dice,
        pixel_accuracy: pixel.pixel_accuracy,
        precision: confusion.precision,
        recall: confusion.recall,
        f1: confusion.f1,
        mae,
        hausdorff,
    })
}
