//! 评估配置.

use crate::consts::{Label, BACKGROUND, COMBINED_KEY, COMBINED_LABELS, NIFTI_GZ_SUFFIX};
use crate::metrics::{EmptySlicePolicy, PointSet};
use std::num::NonZeroUsize;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 额外作为一个整体评估的标签组. 组内标签的掩码按逻辑或合并.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelGroup {
    /// 结果表中代替标签值出现的键.
    pub key: String,

    /// 组内标签.
    pub labels: Vec<Label>,
}

impl LabelGroup {
    /// 创建标签组.
    pub fn new<S: Into<String>, I: IntoIterator<Item = Label>>(key: S, labels: I) -> Self {
        Self {
            key: key.into(),
            labels: labels.into_iter().collect(),
        }
    }

    /// 默认复合组: 标签 1 与标签 2, 键为 `combined_1_2`.
    #[inline]
    pub fn combined_1_2() -> Self {
        Self::new(COMBINED_KEY, COMBINED_LABELS)
    }
}

/// 解析 `LabelGroup` 错误.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseGroupError {
    /// 缺少 `=` 分隔符.
    #[error("expected `KEY=L1,L2,...`, got `{0}`")]
    MissingSeparator(String),

    /// 键为空, 或者是纯数字 (会与真实标签混淆).
    #[error("invalid group key `{0}`")]
    InvalidKey(String),

    /// 标签无法解析为非负整数.
    #[error("invalid label `{0}`")]
    InvalidLabel(String),

    /// 标签列表为空或只含背景.
    #[error("group `{0}` has no foreground label")]
    NoLabel(String),
}

/// 从 `KEY=L1,L2,...` 格式解析.
impl FromStr for LabelGroup {
    type Err = ParseGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, labels) = s
            .split_once('=')
            .ok_or_else(|| ParseGroupError::MissingSeparator(s.to_string()))?;
        let key = key.trim();
        if key.is_empty() || key.parse::<Label>().is_ok() {
            return Err(ParseGroupError::InvalidKey(key.to_string()));
        }

        let labels = labels
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| {
                l.parse::<Label>()
                    .map_err(|_| ParseGroupError::InvalidLabel(l.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if labels.iter().all(|l| *l == BACKGROUND) {
            return Err(ParseGroupError::NoLabel(key.to_string()));
        }

        Ok(Self::new(key, labels))
    }
}

/// 一次 corpus 评估的全部配置.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvalConfig {
    /// 每个病例在逐标签评估之后额外评估的标签组, 按顺序输出.
    pub groups: Vec<LabelGroup>,

    /// 体积文件的后缀. 真值目录中只有以此结尾的文件会被当作病例.
    pub suffix: String,

    /// worker 个数. `None` 表示使用全部可并行核心.
    pub workers: Option<NonZeroUsize>,

    /// Hausdorff 距离中切片点集的定义.
    pub points: PointSet,

    /// 单侧切片为空时的 Hausdorff 距离策略. 仅用于 [`PointSet::Foreground`].
    pub empty_slice: EmptySlicePolicy,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            groups: vec![LabelGroup::combined_1_2()],
            suffix: NIFTI_GZ_SUFFIX.to_string(),
            workers: None,
            points: PointSet::default(),
            empty_slice: EmptySlicePolicy::default(),
        }
    }
}

impl EvalConfig {
    /// 实际使用的 worker 个数.
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n.get(),
            None => cpus(),
        }
    }
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}
