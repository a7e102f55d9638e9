//! nii 文件 header 一览表.
//!
//! 用于在评估前检查一批体积的维度, 分辨率与数据类型是否一致.

use crate::consts::{NIFTI_GZ_SUFFIX, NIFTI_SUFFIX};
use crate::dataset::list_cases;
use nifti::NiftiHeader;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

/// header 一览表中除文件名外的列. 最后一列 `Original_pixdim` 为未经修改的 `pixdim`.
pub const HEADER_COLUMNS: [&str; 24] = [
    "sizeof_hdr",
    "dim_info",
    "dim",
    "intent_p1",
    "intent_p2",
    "intent_p3",
    "intent_code",
    "datatype",
    "bitpix",
    "slice_start",
    "pixdim",
    "vox_offset",
    "scl_slope",
    "scl_inter",
    "slice_end",
    "slice_code",
    "xyzt_units",
    "cal_max",
    "cal_min",
    "slice_duration",
    "toffset",
    "glmax",
    "glmin",
    "Original_pixdim",
];

/// 单个文件的 header 摘要. `values` 与 [`HEADER_COLUMNS`] 一一对应.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderRecord {
    /// 文件名.
    pub file_name: String,

    /// 各列取值.
    pub values: Vec<String>,
}

impl HeaderRecord {
    /// 从已解析的 header 创建.
    pub fn from_header<S: Into<String>>(file_name: S, h: &NiftiHeader) -> Self {
        macro_rules! collect {
            ($($field: ident),+ $(,)?) => {
                vec![$(format!("{:?}", h.$field)),+]
            };
        }
        let values = collect!(
            sizeof_hdr,
            dim_info,
            dim,
            intent_p1,
            intent_p2,
            intent_p3,
            intent_code,
            datatype,
            bitpix,
            slice_start,
            pixdim,
            vox_offset,
            scl_slope,
            scl_inter,
            slice_end,
            slice_code,
            xyzt_units,
            cal_max,
            cal_min,
            slice_duration,
            toffset,
            glmax,
            glmin,
            pixdim,
        );
        debug_assert_eq!(values.len(), HEADER_COLUMNS.len());

        Self {
            file_name: file_name.into(),
            values,
        }
    }

    /// 读取失败的文件: 每个 header 字段都记录错误信息, `Original_pixdim` 记为 `Error`.
    pub fn from_error<S: Into<String>, E: Display>(file_name: S, e: E) -> Self {
        let mut values = vec![format!("Error: {e}"); HEADER_COLUMNS.len() - 1];
        values.push("Error".to_string());
        Self {
            file_name: file_name.into(),
            values,
        }
    }

    /// 读取 `dir` 下名为 `file_name` 的文件的 header. 读取失败时返回错误记录.
    pub fn read(dir: &Path, file_name: &str) -> Self {
        match NiftiHeader::from_file(dir.join(file_name)) {
            Ok(h) => Self::from_header(file_name, &h),
            Err(e) => {
                log::warn!("Cannot read header of {file_name}: {e}");
                Self::from_error(file_name, e)
            }
        }
    }
}

/// 将 `records` 写成表格 (含表头).
pub fn write_header_records<W: Write>(records: &[HeaderRecord], out: W) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(std::iter::once("Filename").chain(HEADER_COLUMNS))?;
    for r in records {
        wtr.write_record(std::iter::once(&r.file_name).chain(&r.values))?;
    }
    wtr.flush()
}

/// 将 `dir` 下所有 nii / nii.gz 文件的 header 按文件名顺序写成表格.
///
/// 返回写出的数据行数. 单个文件读取失败不会中止, 而是写出一行错误记录.
pub fn write_header_table<P: AsRef<Path>, W: Write>(dir: P, out: W) -> io::Result<usize> {
    let dir = dir.as_ref();
    let mut names = list_cases(dir, NIFTI_SUFFIX)?;
    names.extend(list_cases(dir, NIFTI_GZ_SUFFIX)?);
    names.sort_unstable();

    let records: Vec<_> = names.iter().map(|n| HeaderRecord::read(dir, n)).collect();
    write_header_records(&records, out)?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_header() {
        let mut h = NiftiHeader::default();
        h.dim = [3, 4, 5, 6, 1, 1, 1, 1];
        h.datatype = 4;
        let r = HeaderRecord::from_header("a.nii", &h);
        assert_eq!(r.values.len(), HEADER_COLUMNS.len());
        assert_eq!(r.values[2], "[3, 4, 5, 6, 1, 1, 1, 1]");
        assert_eq!(r.values[7], "4");
        assert_eq!(r.values[23], r.values[10]);
    }

    #[test]
    fn test_write_records() {
        let mut h = NiftiHeader::default();
        h.bitpix = 16;
        let records = [
            HeaderRecord::from_header("a.nii.gz", &h),
            HeaderRecord::from_error("b.nii", "truncated"),
        ];
        let mut buf = Vec::new();
        write_header_records(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Filename,sizeof_hdr,dim_info,dim,"));
        // `dim` 等数组字段含逗号, 需要加引号.
        assert!(lines[1].starts_with("a.nii.gz,"));
        assert!(lines[1].contains(",\"["));
        assert_eq!(lines[0].split(',').count(), 1 + HEADER_COLUMNS.len());
        assert!(lines[0].ends_with(",glmin,Original_pixdim"));
        assert_eq!(lines[2].matches("Error: truncated").count(), HEADER_COLUMNS.len() - 1);
        assert!(lines[2].ends_with(",Error"));
    }

    /// 无法解析的文件写出错误行, 其他文件被忽略.
    #[test]
    fn test_header_table_from_dir() {
        let dir = std::env::temp_dir().join(format!("seg-berry-header-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("junk.nii"), b"not a nifti file").unwrap();
        fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let mut buf = Vec::new();
        let n = write_header_table(&dir, &mut buf).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(n, 1);
        let text = String::from_utf8(buf).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("junk.nii,"));
        assert!(row.contains("Error: "));
    }

    #[test]
    fn test_header_table_missing_dir() {
        assert!(write_header_table("/nonexistent/seg-berry", Vec::new()).is_err());
    }
}
