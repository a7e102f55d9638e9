#![warn(missing_docs)]

//! 核心库. 对一批 3D 分割预测与真值标签 (nii / nii.gz) 逐病例, 逐标签地计算分割指标,
//! 并将结果汇总为一张表.
//!
//! 该 crate 仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体积数据按 `(z, H, W)` 组织. Hausdorff 距离默认沿文件第一轴切片, 以切片的每一行为点; 也可沿 `z` 切片, 以前景像素坐标为点. 单位为像素索引.
//! 2. 标签以 `u16` 存储. `0` 为背景, 不参与逐标签评估.
//! 3. 单个病例的失败 (缺少预测, 加载失败, 形状不一致) 只会跳过该病例,
//!   不会中止整个评估. 只有结果表写入失败是致命的.
//!
//! # 开发计划
//!
//! ### 像素级指标 ✅
//!
//! IoU, Dice, 像素准确率, 以及 precision / recall / F1.
//!
//! 实现位于 `seg-berry/src/metrics`.
//!
//! ### 逐切片 Hausdorff 距离 ✅
//!
//! 基于精确欧氏距离变换, 对一侧为空的切片提供两种策略 (记为无穷 / 跳过).
//! 开启 `rayon` feature 时切片之间并行计算.
//!
//! ### 逐标签评估与标签组 ✅
//!
//! 除逐标签外, 默认额外评估标签 1, 2 的合并区域 (`combined_1_2`).
//! 标签组可配置.
//!
//! 实现位于 `seg-berry/src/eval`.
//!
//! ### corpus 调度 ✅
//!
//! 线程池逐病例评估, 单一协调者按完成顺序写出结果.
//!
//! 实现位于 `seg-berry/src/dataset`.
//!
//! ### header 一览表 ✅
//!
//! 实现位于 `seg-berry/src/report/header.rs`.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod config;
pub mod consts;

/// 3D 标签体积与加载器.
pub mod data;

pub mod dataset;
pub mod eval;
pub mod metrics;
pub mod prelude;
pub mod report;

pub use config::{EvalConfig, LabelGroup};
pub use data::{LabelVolume, LoadError, NiftiHeaderAttr, NiftiLoader, VolumeLoader};
pub use eval::{evaluate_case, CaseMetrics, EvalError, LabelKey, MetricRecord};
