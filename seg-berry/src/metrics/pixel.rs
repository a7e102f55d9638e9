//! 像素级重叠指标: IoU, Dice, 像素准确率.

use ndarray::{ArrayView, Dimension, Zip};

/// 像素级重叠指标.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelMetrics {
    /// |gt ∧ pred| / |gt ∨ pred|.
    pub iou: f64,
    /// 2·|gt ∧ pred| / (Σgt + Σpred).
    pub dice: f64,
    /// gt 与 pred 取值相同的元素比例.
    pub pixel_accuracy: f64,
}

/// 计算 IoU, Dice 和像素准确率. 结果与输入的形状无关, 仅与逐元素的对应关系有关.
///
/// 非零元素视为前景参与逻辑与/或; Dice 的分母直接对元素值求和.
///
/// # 注意
///
/// 1. IoU 和 Dice 的分母不做零值保护: 当两个掩码均无前景时结果为 `NaN`,
///    由调用者决定如何解释.
/// 2. 如果 `gt` 和 `pred` 形状不一致, 则程序 panic.
pub fn iou_dice_accuracy<D: Dimension>(gt: ArrayView<u8, D>, pred: ArrayView<u8, D>) -> PixelMetrics {
    let len = gt.len();
    let (inter, union, sum, same) = Zip::from(&gt).and(&pred).fold(
        (0u64, 0u64, 0u64, 0u64),
        |(inter, union, sum, same), &g, &p| {
            let (fg, fp) = (g != 0, p != 0);
            (
                inter + u64::from(fg && fp),
                union + u64::from(fg || fp),
                sum + u64::from(g) + u64::from(p),
                same + u64::from(g == p),
            )
        },
    );

    PixelMetrics {
        iou: inter as f64 / union as f64,
        dice: 2.0 * inter as f64 / sum as f64,
        pixel_accuracy: same as f64 / len as f64,
    }
}
