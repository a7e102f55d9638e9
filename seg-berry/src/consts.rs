//! 通用常量.

/// 标签值类型. 分割标签为小的非负整数.
pub type Label = u16;

/// 背景标签值. 背景永远不参与单独评估.
pub const BACKGROUND: Label = 0;

/// 默认复合组的键.
pub const COMBINED_KEY: &str = "combined_1_2";

/// 默认复合组包含的标签.
pub const COMBINED_LABELS: [Label; 2] = [1, 2];

/// 默认的体积文件后缀.
pub const NIFTI_GZ_SUFFIX: &str = ".nii.gz";

/// 未压缩的体积文件后缀.
pub const NIFTI_SUFFIX: &str = ".nii";

/// 一立方厘米包含的立方毫米数. 体素间距默认以毫米为单位.
pub const MM3_PER_CM3: f64 = 1000.0;

/// 结果表格的列名, 依次对应 `ResultRow` 的各个字段.
pub const RESULT_COLUMNS: [&str; 15] = [
    "Case",
    "Segmentation Label",
    "IoU",
    "Dice",
    "Pixel Accuracy",
    "Precision",
    "Recall",
    "F1 Score",
    "Mean Absolute Error",
    "Hausdorff Distance",
    "Ground Truth Voxel Count",
    "Inference Voxel Count",
    "GT Voxel Size (cm^3)",
    "Ground Truth Segment Volume (cm^3)",
    "Inference Segment Volume (cm^3)",
];
