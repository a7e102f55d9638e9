//! 数据集操作: 病例枚举, 单病例驱动与 corpus 调度.

use std::io;
use std::path::Path;

pub mod case;
pub mod corpus;

pub use case::{case_id, process_case, try_process_case, CaseError, ResultRow};
pub use corpus::{run_cases, run_corpus, CorpusError, CorpusSummary, Progress};

/// 列出 `dir` 下文件名以 `suffix` 结尾的所有文件名, 按字典序排列.
///
/// 非 UTF-8 文件名会被忽略.
pub fn list_cases<P: AsRef<Path>>(dir: P, suffix: &str) -> io::Result<Vec<String>> {
    let mut ans = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(suffix) {
                ans.push(name.to_string());
            }
        }
    }
    ans.sort_unstable();
    Ok(ans)
}
