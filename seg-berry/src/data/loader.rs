//! 体积加载器.
//!
//! 评估流程只依赖 [`VolumeLoader`], 文件解码细节由具体实现负责.

use super::LabelVolume;
use std::path::Path;
use thiserror::Error;

/// 体积加载错误.
#[derive(Error, Debug)]
pub enum LoadError {
    /// 底层 nifti 读取或解码错误.
    #[error("nifti: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 体积不是 3D 的 (第四维长度为 1 的 4D 体积除外).
    #[error("expected a 3D volume, found {0} dimensions")]
    Dimensionality(usize),

    /// 数据无法整理为 3D 数组.
    #[error("volume shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// 按文件标识加载 [`LabelVolume`] 的外部协作者.
///
/// 实现必须可以跨线程共享, 因为 corpus 调度器会在多个 worker 中同时使用它.
pub trait VolumeLoader: Send + Sync {
    /// `path` 是否对应一个可加载的体积.
    #[inline]
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// 加载 `path` 对应的体积.
    fn load(&self, path: &Path) -> Result<LabelVolume, LoadError>;
}

/// 从本地文件系统读取 nii / nii.gz 文件的加载器.
#[derive(Copy, Clone, Debug, Default)]
pub struct NiftiLoader;

impl VolumeLoader for NiftiLoader {
    #[inline]
    fn load(&self, path: &Path) -> Result<LabelVolume, LoadError> {
        LabelVolume::open(path)
    }
}
