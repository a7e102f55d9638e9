//! 运行结果.

use seg_berry::dataset::CorpusSummary;
use std::io::{self, Write};
use std::path::PathBuf;

/// 一次运行的结果.
#[derive(Debug)]
pub enum Outcome {
    /// 评估完成.
    Eval {
        /// 统计.
        summary: CorpusSummary,
        /// 结果表路径.
        output: PathBuf,
    },

    /// header 表写出完成.
    Headers {
        /// 文件数.
        files: usize,
        /// 结果表路径.
        output: PathBuf,
    },
}

/// 将 `summary` 写进 `w` 中.
fn describe_into<W: Write>(s: &CorpusSummary, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Evaluation summary:")?;
    writeln!(w, "{S4}Cases: {}", s.total)?;
    writeln!(w, "{S4}Completed: {}", s.completed)?;
    writeln!(w, "{S4}Rows written: {}", s.rows)?;
    writeln!(w, "{S4}Cases without rows: {}", s.empty)?;
    write!(w, "{S4}Lost cases: {}", s.lost)?;
    Ok(())
}

impl Outcome {
    /// 打印运行结果.
    pub fn report<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::Eval { summary, output } => {
                describe_into(summary, w)?;
                writeln!(w)?;
                writeln!(w, "Results saved to {}", output.display())
            }
            Self::Headers { files, output } => {
                writeln!(w, "{files} headers saved to {}", output.display())
            }
        }
    }

    /// 是否有病例丢失.
    pub fn has_lost(&self) -> bool {
        matches!(self, Self::Eval { summary, .. } if summary.lost > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let s = CorpusSummary {
            total: 3,
            completed: 3,
            rows: 8,
            empty: 1,
            lost: 0,
        };
        let mut buf = Vec::new();
        describe_into(&s, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("    Rows written: 8"));
        assert!(text.ends_with("Lost cases: 0"));

        let o = Outcome::Eval {
            summary: s,
            output: PathBuf::from("out.csv"),
        };
        assert!(!o.has_lost());
        let mut buf = Vec::new();
        o.report(&mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().ends_with("Results saved to out.csv\n"));
    }
}
