//! 命令行参数.

use clap::{Args, Parser, Subcommand, ValueEnum};
use seg_berry::metrics::{EmptySlicePolicy, PointSet};
use seg_berry::{EvalConfig, LabelGroup};
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// 真值目录的环境变量.
pub const GT_DIR_VAR: &str = "SEG_GT_DIR";

/// 预测目录的环境变量.
pub const PRED_DIR_VAR: &str = "SEG_PRED_DIR";

/// 分割结果批量评估.
#[derive(Parser, Debug)]
#[command(name = "seg-eval", version, about, long_about = None)]
pub struct Cli {
    /// 日志详细程度. `-v` 为 debug, `-vv` 为 trace. 未指定时读取 `RUST_LOG`, 默认 info.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// 子命令.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// 逐病例, 逐标签评估, 结果写成一张表.
    Eval(EvalArgs),

    /// 列出目录下所有 nii / nii.gz 文件的 header.
    Headers {
        /// 体积所在目录.
        dir: PathBuf,

        /// 输出表路径.
        output: PathBuf,
    },
}

/// Hausdorff 距离的切片点集.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Points {
    /// 沿文件第一轴切片, 每一行是一个点.
    #[default]
    Rows,

    /// 沿 z 切片, 每个前景像素是一个点.
    Foreground,
}

impl From<Points> for PointSet {
    fn from(p: Points) -> Self {
        match p {
            Points::Rows => PointSet::Rows,
            Points::Foreground => PointSet::Foreground,
        }
    }
}

/// 单侧切片为空时的策略.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EmptySlice {
    /// 记为无穷.
    #[default]
    Infinite,

    /// 跳过该切片.
    Skip,
}

impl From<EmptySlice> for EmptySlicePolicy {
    fn from(e: EmptySlice) -> Self {
        match e {
            EmptySlice::Infinite => EmptySlicePolicy::Infinite,
            EmptySlice::Skip => EmptySlicePolicy::Skip,
        }
    }
}

/// `eval` 子命令参数.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// `GT_DIR PRED_DIR OUTPUT`. 只给出 `OUTPUT` 时,
    /// 两个目录分别取自 `$SEG_GT_DIR` 与 `$SEG_PRED_DIR`.
    #[arg(value_name = "PATH", num_args = 1..=3, required = true)]
    pub paths: Vec<PathBuf>,

    /// 额外评估的标签组, 格式为 `KEY=L1,L2,...`. 可重复; 给出时替换默认的 `combined_1_2=1,2`.
    #[arg(long = "group", value_name = "KEY=L1,L2")]
    pub groups: Vec<LabelGroup>,

    /// 病例文件后缀.
    #[arg(long, default_value = ".nii.gz")]
    pub suffix: String,

    /// worker 个数. 默认使用全部可并行核心.
    #[arg(long)]
    pub workers: Option<NonZeroUsize>,

    /// Hausdorff 距离的切片点集.
    #[arg(long, value_enum, default_value_t = Points::Rows)]
    pub points: Points,

    /// 单侧切片为空时的 Hausdorff 策略. 仅用于 `--points foreground`.
    #[arg(long, value_enum, default_value_t = EmptySlice::Infinite)]
    pub empty_slice: EmptySlice,
}

/// 评估所需的三个路径.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalPaths {
    /// 真值目录.
    pub gt_dir: PathBuf,
    /// 预测目录.
    pub pred_dir: PathBuf,
    /// 输出表.
    pub output: PathBuf,
}

impl EvalArgs {
    /// 解析路径. 省略的目录从环境变量获取.
    pub fn paths(&self) -> Result<EvalPaths, String> {
        self.paths_with(|k| env::var(k).ok())
    }

    fn paths_with<F: Fn(&str) -> Option<String>>(&self, var: F) -> Result<EvalPaths, String> {
        let from_env = |k: &str| {
            var(k)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| format!("directory not given and `${k}` is not set"))
        };

        match self.paths.as_slice() {
            [gt_dir, pred_dir, output] => Ok(EvalPaths {
                gt_dir: gt_dir.clone(),
                pred_dir: pred_dir.clone(),
                output: output.clone(),
            }),
            [output] => Ok(EvalPaths {
                gt_dir: from_env(GT_DIR_VAR)?,
                pred_dir: from_env(PRED_DIR_VAR)?,
                output: output.clone(),
            }),
            _ => Err("expected `GT_DIR PRED_DIR OUTPUT` or `OUTPUT` alone".to_string()),
        }
    }

    /// 转换为评估配置.
    pub fn config(&self) -> EvalConfig {
        let mut config = EvalConfig {
            suffix: self.suffix.clone(),
            workers: self.workers,
            points: self.points.into(),
            empty_slice: self.empty_slice.into(),
            ..EvalConfig::default()
        };
        if !self.groups.is_empty() {
            config.groups = self.groups.clone();
        }
        config
    }
}
