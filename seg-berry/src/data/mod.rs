use std::path::Path;

use ndarray::{Array3, ArrayView, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::{Label, MM3_PER_CM3};
use crate::Idx3d;

pub mod loader;

pub use loader::{LoadError, NiftiLoader, VolumeLoader};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 3D nii 文件 header 的共用属性.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 获取体素的实际体积值, 以立方厘米为单位.
    #[inline]
    fn voxel_cm3(&self) -> f64 {
        self.voxel() / MM3_PER_CM3
    }
}

/// nii 格式 3D 分割标签体积, 包括 header 和标签数据.
///
/// 数据按 `(z, H, W)` 组织, 创建后不再修改.
#[derive(Debug, Clone)]
pub struct LabelVolume {
    header: BoxedHeader,
    data: Array3<Label>,
}

impl NiftiHeaderAttr for LabelVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl LabelVolume {
    /// 打开 nii (或 nii.gz) 文件格式的 3D 标签. `path` 为文件的本地路径.
    ///
    /// 第四维长度为 1 的 4D 文件会被压缩为 3D; 其它维度数返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        let data = obj.into_volume().into_ndarray::<Label>()?;
        let data = match data.ndim() {
            3 => data,
            4 if data.shape()[3] == 1 => data.index_axis_move(Axis(3), 0),
            n => return Err(LoadError::Dimensionality(n)),
        };

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = data
            .permuted_axes([2, 1, 0].as_slice())
            .into_dimensionality::<Ix3>()?
            .as_standard_layout()
            .into_owned();

        Ok(Self { header, data })
    }

    /// 根据裸标签数据和体素分辨率直接创建 `LabelVolume` 实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照 \[z, h, w\] 格式存储.
    /// 2. `pix_dim` 按照 \[z, h, w\] 格式存储, 以毫米为单位.
    pub fn fake(data: Array3<Label>, pix_dim: [f32; 3]) -> Self {
        let mut header = Box::<NiftiHeader>::default();
        let (z, h, w) = data.dim();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
        let [pz, ph, pw] = pix_dim;
        header.pixdim = [1.0, pw, ph, pz, 0.0, 0.0, 0.0, 0.0];

        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { header, data }
    }

    /// 获取数据形状大小 `(z, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, Label, Ix3> {
        self.data.view()
    }

    /// 获取 3D 标签中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: Label) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 按升序获取 3D 标签中出现过的所有不同标签值 (包括背景).
    pub fn unique_labels(&self) -> Vec<Label> {
        let mut seen = vec![false; Label::MAX as usize + 1];
        self.data.iter().for_each(|&p| seen[p as usize] = true);
        seen.into_iter()
            .enumerate()
            .filter_map(|(v, hit)| hit.then_some(v as Label))
            .collect()
    }

    /// 构造二值掩码: 值为 `label` 的体素为 1, 其余为 0.
    #[inline]
    pub fn mask_of(&self, label: Label) -> Array3<u8> {
        self.data.mapv(|p| u8::from(p == label))
    }

    /// 构造二值掩码: 值属于 `labels` 中任意一个的体素为 1, 其余为 0.
    #[inline]
    pub fn mask_of_any(&self, labels: &[Label]) -> Array3<u8> {
        self.data.mapv(|p| u8::from(labels.contains(&p)))
    }
}
