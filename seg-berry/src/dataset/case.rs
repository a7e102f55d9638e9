//! 单个病例的驱动: 定位预测文件, 加载两个体积, 评估并展开为结果行.

use crate::config::EvalConfig;
use crate::data::{LoadError, VolumeLoader};
use crate::eval::{evaluate_case, EvalError, LabelKey, MetricRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 结果表中的一行.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    /// 病例标识, 见 [`case_id`].
    pub case: String,

    /// 标签或标签组.
    pub key: LabelKey,

    /// 完整指标.
    pub record: MetricRecord,
}

/// 病例级错误. 这些错误都只会让该病例不产生结果行, 不会中止整个评估.
#[derive(Error, Debug)]
pub enum CaseError {
    /// 预测目录中没有同名文件.
    #[error("prediction not found: {0}")]
    MissingPrediction(PathBuf),

    /// 任一体积加载失败.
    #[error("failed to load {path}: {source}")]
    Load {
        /// 加载失败的文件.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: LoadError,
    },

    /// 评估失败.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// 从真值文件名得到病例标识: 只去掉最后一个扩展名, 即 `case01.nii.gz` 得到 `case01.nii`.
///
/// 文件名开头的点不算作扩展名分隔符, 例如 `.hidden` 保持不变.
pub fn case_id(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if file_name[..i].bytes().any(|b| b != b'.') => &file_name[..i],
        _ => file_name,
    }
}

/// 评估单个病例, 并将错误原样返回.
///
/// `gt_file` 是真值目录下的文件名; 预测文件是预测目录下的同名文件.
pub fn try_process_case<L: VolumeLoader + ?Sized>(
    loader: &L,
    gt_file: &str,
    gt_dir: &Path,
    pred_dir: &Path,
    config: &EvalConfig,
) -> Result<Vec<ResultRow>, CaseError> {
    let gt_path = gt_dir.join(gt_file);
    let pred_path = pred_dir.join(gt_file);
    if !loader.exists(&pred_path) {
        return Err(CaseError::MissingPrediction(pred_path));
    }

    log::info!("Processing file: {}", gt_path.display());
    let load = |path: PathBuf| {
        loader
            .load(&path)
            .map_err(|source| CaseError::Load { path, source })
    };
    let gt = load(gt_path)?;
    let pred = load(pred_path)?;

    let case = case_id(gt_file);
    let rows = evaluate_case(&gt, &pred, config)?
        .into_iter()
        .map(|(key, record)| ResultRow {
            case: case.to_string(),
            key,
            record,
        })
        .collect();
    Ok(rows)
}

/// 评估单个病例. 任何病例级错误都会被记录到日志, 并返回空结果.
pub fn process_case<L: VolumeLoader + ?Sized>(
    loader: &L,
    gt_file: &str,
    gt_dir: &Path,
    pred_dir: &Path,
    config: &EvalConfig,
) -> Vec<ResultRow> {
    match try_process_case(loader, gt_file, gt_dir, pred_dir, config) {
        Ok(rows) => rows,
        Err(CaseError::MissingPrediction(path)) => {
            log::info!("Prediction for {gt_file} not found at {}", path.display());
            Vec::new()
        }
        Err(e) => {
            log::error!("Error processing file {gt_file}: {e}");
            Vec::new()
        }
    }
}
