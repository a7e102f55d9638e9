//! 基于混淆计数的指标: 精确率, 召回率, F1.

use ndarray::{ArrayView, Dimension, Zip};

/// 混淆计数及其派生指标.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConfusionMetrics {
    /// TP / (TP + FP), 分母为零时为 0.
    pub precision: f64,
    /// TP / (TP + FN), 分母为零时为 0.
    pub recall: f64,
    /// 2PR / (P + R), 分母为零时为 0.
    pub f1: f64,
}

/// 二值掩码的 TP / FP / FN 计数.
///
/// 仅把值为 1 的元素视为阳性, 值为 0 的元素视为阴性; 其它值两者都不算.
pub fn confusion_counts<D: Dimension>(gt: ArrayView<u8, D>, pred: ArrayView<u8, D>) -> (u64, u64, u64) {
    Zip::from(&gt)
        .and(&pred)
        .fold((0u64, 0u64, 0u64), |(tp, fp, fn_), &g, &p| {
            (
                tp + u64::from(g == 1 && p == 1),
                fp + u64::from(g == 0 && p == 1),
                fn_ + u64::from(g == 1 && p == 0),
            )
        })
}

/// 计算精确率, 召回率和 F1. 三个比值的分母均做零值保护.
///
/// 如果 `gt` 和 `pred` 形状不一致, 则程序 panic.
pub fn precision_recall_f1<D: Dimension>(
    gt: ArrayView<u8, D>,
    pred: ArrayView<u8, D>,
) -> ConfusionMetrics {
    let (tp, fp, fn_) = confusion_counts(gt, pred);

    let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };
    let precision = ratio(tp as f64, (tp + fp) as f64);
    let recall = ratio(tp as f64, (tp + fn_) as f64);
    let f1 = ratio(2.0 * precision * recall, precision + recall);

    ConfusionMetrics {
        precision,
        recall,
        f1,
    }
}

#[cfg(test)]
mod tests {
    use super::{confusion_counts, precision_recall_f1};
    use ndarray::arr1;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_confusion_counts() {
        let gt = arr1(&[1u8, 1, 0, 0, 1, 2]);
        let pred = arr1(&[1u8, 0, 1, 0, 1, 1]);
        assert_eq!(confusion_counts(gt.view(), pred.view()), (2, 1, 1));

        let m = precision_recall_f1(gt.view(), pred.view());
        assert!(f64_eq(m.precision, 2.0 / 3.0));
        assert!(f64_eq(m.recall, 2.0 / 3.0));
        assert!(f64_eq(m.f1, 2.0 / 3.0));
    }

    #[test]
    fn test_confusion_identical() {
        let a = arr1(&[0u8, 1, 1, 0]);
        let m = precision_recall_f1(a.view(), a.view());
        assert_eq!((m.precision, m.recall, m.f1), (1.0, 1.0, 1.0));
    }

    /// 没有阳性元素时三个指标均为 0, 而不是未定义.
    #[test]
    fn test_confusion_zero_guard() {
        let a = arr1(&[0u8; 5]);
        let m = precision_recall_f1(a.view(), a.view());
        assert_eq!((m.precision, m.recall, m.f1), (0.0, 0.0, 0.0));

        // gt 有阳性, pred 全阴: TP = 0.
        let gt = arr1(&[1u8, 1, 0]);
        let pred = arr1(&[0u8, 0, 0]);
        let m = precision_recall_f1(gt.view(), pred.view());
        assert_eq!((m.precision, m.recall, m.f1), (0.0, 0.0, 0.0));
    }
}
