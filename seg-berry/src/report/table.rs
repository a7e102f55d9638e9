use crate::consts::RESULT_COLUMNS;
use crate::dataset::ResultRow;
use std::io::{self, Write};

/// 以稳定格式输出浮点数: 最短可往返的十进制表示, `NaN` 输出为 `nan`, 无穷输出为 `inf` / `-inf`.
pub fn fmt_f64(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let s = if f > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else {
        f.to_string()
    }
}

/// 结果表写入器. 创建时写出表头, 之后每个 [`ResultRow`] 占一行.
///
/// 表头写出后立即刷新; 之后的行在调用 [`TableWriter::flush`] 前暂存在缓冲区中.
pub struct TableWriter<W: Write> {
    inner: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> TableWriter<W> {
    /// 创建写入器并写出表头.
    pub fn new(inner: W) -> io::Result<Self> {
        let mut inner = csv::Writer::from_writer(inner);
        inner.write_record(RESULT_COLUMNS)?;
        inner.flush()?;
        Ok(Self { inner, rows: 0 })
    }

    /// 写出一行.
    pub fn write_row(&mut self, row: &ResultRow) -> io::Result<()> {
        let r = &row.record;
        let m = &r.metrics;
        let record = [
            row.case.clone(),
            row.key.to_string(),
            fmt_f64(m.iou),
            fmt_f64(m.dice),
            fmt_f64(m.pixel_accuracy),
            fmt_f64(m.precision),
            fmt_f64(m.recall),
            fmt_f64(m.f1),
            fmt_f64(m.mae),
            fmt_f64(m.hausdorff),
            r.gt_voxels.to_string(),
            r.pred_voxels.to_string(),
            fmt_f64(r.voxel_cm3),
            fmt_f64(r.gt_volume_cm3),
            fmt_f64(r.pred_volume_cm3),
        ];
        self.inner.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// 依次写出多行.
    pub fn write_rows(&mut self, rows: &[ResultRow]) -> io::Result<()> {
        rows.iter().try_for_each(|r| self.write_row(r))
    }

    /// 已写出的数据行数 (不含表头).
    #[inline]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// 将缓冲区写入底层写入器并刷新.
    #[inline]
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// 刷新并消费自我, 获得底层写入器.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| {
            let source = e.error();
            io::Error::new(source.kind(), source.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{LabelKey, MetricRecord};
    use crate::metrics::PairMetrics;

    fn row(case: &str, key: LabelKey) -> ResultRow {
        ResultRow {
            case: case.to_string(),
            key,
            record: MetricRecord {
                metrics: PairMetrics {
                    iou: 0.5,
                    dice: 2.0 / 3.0,
                    pixel_accuracy: 1.0,
                    precision: 0.0,
                    recall: 0.25,
                    f1: f64::NAN,
                    mae: 0.125,
                    hausdorff: f64::INFINITY,
                },
                gt_voxels: 12,
                pred_voxels: 0,
                voxel_cm3: 0.001,
                gt_volume_cm3: 0.012,
                pred_volume_cm3: 0.0,
            },
        }
    }

    #[test]
    fn test_fmt_f64() {
        assert_eq!(fmt_f64(1.0), "1");
        assert_eq!(fmt_f64(0.1), "0.1");
        assert_eq!(fmt_f64(f64::NAN), "nan");
        assert_eq!(fmt_f64(f64::INFINITY), "inf");
        assert_eq!(fmt_f64(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_table_output() {
        let mut t = TableWriter::new(Vec::new()).unwrap();
        t.write_rows(&[
            row("case01", LabelKey::Label(5)),
            row("a,b", LabelKey::Group("combined_1_2".to_string())),
        ])
        .unwrap();
        assert_eq!(t.rows(), 2);

        let text = String::from_utf8(t.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split(',').count(), 15);
        assert_eq!(
            lines[1],
            format!(
                "case01,5,0.5,{},1,0,0.25,nan,0.125,inf,12,0,0.001,0.012,0",
                2.0f64 / 3.0
            )
        );
        assert!(lines[2].starts_with("\"a,b\",combined_1_2,"));
    }

    /// 含引号或换行的文本字段被整体加引号, 内部引号加倍.
    #[test]
    fn test_table_quoting() {
        let mut t = TableWriter::new(Vec::new()).unwrap();
        t.write_row(&row("say \"hi\"", LabelKey::Group("two\nlines".to_string())))
            .unwrap();
        let text = String::from_utf8(t.into_inner().unwrap()).unwrap();
        assert!(text.contains("\"say \"\"hi\"\"\",\"two\nlines\","));
    }

    /// 表头在创建时就写入底层写入器, 数据行在刷新后写入.
    #[test]
    fn test_header_flushed_on_create() {
        let mut t = TableWriter::new(Vec::new()).unwrap();
        t.write_row(&row("case01", LabelKey::Label(1))).unwrap();
        assert_eq!(t.inner.get_ref().iter().filter(|b| **b == b'\n').count(), 1);
        t.flush().unwrap();
        assert_eq!(t.inner.get_ref().iter().filter(|b| **b == b'\n').count(), 2);
    }
}
