//! 单个病例的逐标签评估.
//!
//! 对真值中出现的每个非背景标签, 以及配置中的每个标签组, 分别构造二值掩码并计算
//! [`PairMetrics`], 再附加体素个数与物理体积.

use crate::config::{EvalConfig, LabelGroup};
use crate::consts::{Label, BACKGROUND};
use crate::data::{LabelVolume, NiftiHeaderAttr};
use crate::metrics::{pair_metrics, MetricError, PairMetrics};
use crate::Idx3d;
use ndarray::Array3;
use std::fmt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 结果表中一行所对应的评估对象: 真实标签或标签组.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LabelKey {
    /// 真值中出现的标签.
    Label(Label),

    /// 配置中的标签组, 以其键标识.
    Group(String),
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKey::Label(l) => write!(f, "{l}"),
            LabelKey::Group(key) => f.write_str(key),
        }
    }
}

/// 一个 (病例, 标签或标签组) 的完整指标: 8 项一致性指标与 5 项体积统计.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricRecord {
    /// 一致性指标.
    pub metrics: PairMetrics,
    /// 真值掩码的前景体素数.
    pub gt_voxels: u64,
    /// 预测掩码的前景体素数.
    pub pred_voxels: u64,
    /// 单个体素体积 (cm^3), 由真值 header 计算.
    pub voxel_cm3: f64,
    /// 真值分割体积 (cm^3).
    pub gt_volume_cm3: f64,
    /// 预测分割体积 (cm^3).
    pub pred_volume_cm3: f64,
}

impl MetricRecord {
    /// 从一对掩码计算完整指标.
    pub fn compute(
        gt: &Array3<u8>,
        pred: &Array3<u8>,
        voxel_cm3: f64,
        config: &EvalConfig,
    ) -> Result<Self, MetricError> {
        let metrics = pair_metrics(gt.view(), pred.view(), config.points, config.empty_slice)?;
        let gt_voxels = count_nonzero(gt);
        let pred_voxels = count_nonzero(pred);
        Ok(Self {
            metrics,
            gt_voxels,
            pred_voxels,
            voxel_cm3,
            gt_volume_cm3: voxel_cm3 * gt_voxels as f64,
            pred_volume_cm3: voxel_cm3 * pred_voxels as f64,
        })
    }
}

#[inline]
fn count_nonzero(mask: &Array3<u8>) -> u64 {
    mask.iter().filter(|p| **p != 0).count() as u64
}

/// 病例级评估错误.
#[derive(Error, Debug)]
pub enum EvalError {
    /// 真值与预测体积形状不一致.
    #[error("volume shape mismatch: ground truth {gt:?}, prediction {pred:?}")]
    ShapeMismatch {
        /// 真值形状.
        gt: Idx3d,
        /// 预测形状.
        pred: Idx3d,
    },

    /// 标签组的指标计算失败.
    #[error("group `{key}`: {source}")]
    Group {
        /// 组键.
        key: String,
        /// 底层错误.
        #[source]
        source: MetricError,
    },
}

/// 一个病例的全部评估结果. 顺序为: 标签升序, 然后是按配置顺序的标签组.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaseMetrics {
    entries: Vec<(LabelKey, MetricRecord)>,
}

impl CaseMetrics {
    /// 结果条目个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否不含任何结果.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按键查找结果.
    pub fn get(&self, key: &LabelKey) -> Option<&MetricRecord> {
        self.entries
            .iter()
            .find_map(|(k, r)| (k == key).then_some(r))
    }

    /// 按输出顺序迭代结果.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &(LabelKey, MetricRecord)> {
        self.entries.iter()
    }
}

impl IntoIterator for CaseMetrics {
    type Item = (LabelKey, MetricRecord);
    type IntoIter = std::vec::IntoIter<(LabelKey, MetricRecord)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// 评估一个病例.
///
/// 1. 真值中出现的每个非背景标签 `L` 以 `(gt == L, pred == L)` 为掩码评估.
///    单个标签计算失败时记录日志并跳过该标签, 不影响其他标签.
/// 2. 与第一步无关, 每个标签组以组内标签的逻辑或为掩码评估, 无论组内标签是否出现.
///    标签组计算失败会使整个病例失败.
///
/// 体素体积只从真值 header 读取.
pub fn evaluate_case(
    gt: &LabelVolume,
    pred: &LabelVolume,
    config: &EvalConfig,
) -> Result<CaseMetrics, EvalError> {
    if gt.shape() != pred.shape() {
        return Err(EvalError::ShapeMismatch {
            gt: gt.shape(),
            pred: pred.shape(),
        });
    }

    let voxel_cm3 = gt.voxel_cm3();
    let mut entries = Vec::new();

    for label in gt.unique_labels().into_iter().filter(|l| *l != BACKGROUND) {
        let gt_mask = gt.mask_of(label);
        let pred_mask = pred.mask_of(label);
        match MetricRecord::compute(&gt_mask, &pred_mask, voxel_cm3, config) {
            Ok(record) => {
                log::debug!("Processed label {label}");
                entries.push((LabelKey::Label(label), record));
            }
            Err(e) => log::warn!("Skipping label {label} due to error: {e}"),
        }
    }

    for LabelGroup { key, labels } in config.groups.iter() {
        let gt_mask = gt.mask_of_any(labels);
        let pred_mask = pred.mask_of_any(labels);
        let record = MetricRecord::compute(&gt_mask, &pred_mask, voxel_cm3, config).map_err(
            |source| EvalError::Group {
                key: key.clone(),
                source,
            },
        )?;
        log::debug!("Processed group {key}");
        entries.push((LabelKey::Group(key.clone()), record));
    }

    Ok(CaseMetrics { entries })
}
