//! corpus 调度器.
//!
//! 每个病例由一个 worker 独立完成, worker 之间不共享可变状态. 结果通过 channel
//! 交还给协调者, 由协调者按完成顺序 (而非提交顺序) 写入结果表.

use super::case::{process_case, ResultRow};
use super::list_cases;
use crate::config::EvalConfig;
use crate::data::{NiftiLoader, VolumeLoader};
use crate::report::TableWriter;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use thiserror::Error;
use threadpool::ThreadPool;

/// corpus 级错误. 只有这些错误会中止整个评估; 单个病例的失败不在此列.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// 无法枚举真值目录.
    #[error("cannot list ground truth directory {path}: {source}")]
    Input {
        /// 真值目录.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: io::Error,
    },

    /// 无法创建或写入结果表.
    #[error("output table: {0}")]
    Output(#[from] io::Error),
}

/// 一个病例完成后的进度.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// 已完成的病例数.
    pub done: usize,
    /// 病例总数.
    pub total: usize,
    /// 刚完成的病例写出的行数.
    pub rows: usize,
}

/// 一次评估的统计.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CorpusSummary {
    /// 病例总数.
    pub total: usize,
    /// 已返回结果的病例数 (包括零行的病例).
    pub completed: usize,
    /// 写出的结果行数.
    pub rows: usize,
    /// 没有产生任何结果行的病例数 (缺少预测, 加载失败等).
    pub empty: usize,
    /// worker 异常退出而丢失的病例数.
    pub lost: usize,
}

/// 评估 `gt_dir` 下的全部病例, 结果写入 `output` 路径.
///
/// 使用 [`NiftiLoader`] 从文件系统加载体积.
///
/// # 错误
///
/// 1. 结果表无法创建或写入时返回 [`CorpusError::Output`].
/// 2. 真值目录无法枚举时返回 [`CorpusError::Input`]. 此时没有任何病例可评估,
///   也不会创建结果表.
pub fn run_corpus<P: AsRef<Path>>(
    gt_dir: P,
    pred_dir: P,
    output: P,
    config: &EvalConfig,
) -> Result<CorpusSummary, CorpusError> {
    let gt_dir = gt_dir.as_ref();
    let cases = list_cases(gt_dir, &config.suffix).map_err(|source| CorpusError::Input {
        path: gt_dir.to_owned(),
        source,
    })?;

    let file = File::create(output.as_ref())?;
    let mut table = TableWriter::new(BufWriter::new(file))?;
    let summary = run_cases(
        Arc::new(NiftiLoader),
        cases,
        gt_dir,
        pred_dir.as_ref(),
        &mut table,
        config,
        |_| {},
    )?;
    table.flush()?;
    Ok(summary)
}

/// 在大小为 `config.worker_count()` 的线程池上评估 `cases`, 并把结果流式写入 `table`.
///
/// 每个病例完成后, 其结果行会被立即写出, 随后调用 `on_progress`.
/// 病例之间的输出顺序取决于完成顺序; 同一病例内部的行顺序固定.
///
/// 只有写入失败会返回 `Err`.
pub fn run_cases<L, W, F>(
    loader: Arc<L>,
    cases: Vec<String>,
    gt_dir: &Path,
    pred_dir: &Path,
    table: &mut TableWriter<W>,
    config: &EvalConfig,
    mut on_progress: F,
) -> io::Result<CorpusSummary>
where
    L: VolumeLoader + 'static,
    W: Write,
    F: FnMut(Progress),
{
    let total = cases.len();
    let mut summary = CorpusSummary {
        total,
        ..CorpusSummary::default()
    };
    if total == 0 {
        log::info!("No cases found");
        return Ok(summary);
    }

    let workers = config.worker_count().min(total);
    log::info!("Evaluating {total} cases with {workers} workers");

    let pool = ThreadPool::new(workers);
    let (tx, rx) = mpsc::channel::<Vec<ResultRow>>();
    let config = Arc::new(config.clone());
    for gt_file in cases {
        let tx = tx.clone();
        let loader = Arc::clone(&loader);
        let config = Arc::clone(&config);
        let (gt_dir, pred_dir) = (gt_dir.to_owned(), pred_dir.to_owned());
        pool.execute(move || {
            let rows = process_case(&*loader, &gt_file, &gt_dir, &pred_dir, &config);
            // 协调者只会在写入失败时提前退出, 此时结果已无处可写.
            let _ = tx.send(rows);
        });
    }
    // 只保留 worker 持有的发送端, 所有 worker 结束后 `rx` 迭代自然终止.
    drop(tx);

    for rows in rx.iter() {
        table.write_rows(&rows)?;
        table.flush()?;

        summary.completed += 1;
        summary.rows += rows.len();
        if rows.is_empty() {
            summary.empty += 1;
        }
        log::info!("Processed {}/{} files", summary.completed, total);
        on_progress(Progress {
            done: summary.completed,
            total,
            rows: rows.len(),
        });
    }

    summary.lost = total - summary.completed;
    if summary.lost > 0 {
        log::warn!("{} cases were lost to panicked workers", summary.lost);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LabelVolume, LoadError};
    use crate::dataset::case::tests::{volume_0125, MemLoader};
    use std::num::NonZeroUsize;

    fn config(workers: usize) -> EvalConfig {
        EvalConfig {
            workers: NonZeroUsize::new(workers),
            ..EvalConfig::default()
        }
    }

    fn corpus() -> (MemLoader, Vec<String>) {
        let mut loader = MemLoader::default();
        let v = volume_0125();
        let shifted = LabelVolume::fake(v.data().mapv(|p| if p == 2 { 1 } else { p }), [1.0; 3]);
        for i in 0..6 {
            let name = format!("case{i:02}.nii.gz");
            loader.insert(format!("gt/{name}"), Some(v.clone()));
            // case03 缺少预测, case04 的预测无法加载.
            match i {
                3 => {}
                4 => loader.insert(format!("pred/{name}"), None),
                5 => loader.insert(format!("pred/{name}"), Some(shifted.clone())),
                _ => loader.insert(format!("pred/{name}"), Some(v.clone())),
            }
        }
        let cases = (0..6).map(|i| format!("case{i:02}.nii.gz")).collect();
        (loader, cases)
    }

    fn run(workers: usize) -> (String, CorpusSummary, Vec<Progress>) {
        let (loader, cases) = corpus();
        let mut table = TableWriter::new(Vec::new()).unwrap();
        let mut progress = Vec::new();
        let summary = run_cases(
            Arc::new(loader),
            cases,
            Path::new("gt"),
            Path::new("pred"),
            &mut table,
            &config(workers),
            |p| progress.push(p),
        )
        .unwrap();
        let text = String::from_utf8(table.into_inner().unwrap()).unwrap();
        (text, summary, progress)
    }

    #[test]
    fn test_run_cases_summary() {
        let (text, summary, progress) = run(3);
        assert_eq!(
            summary,
            CorpusSummary {
                total: 6,
                completed: 6,
                rows: 4 * 4,
                empty: 2,
                lost: 0,
            }
        );
        assert_eq!(progress.len(), 6);
        assert_eq!(progress.last().map(|p| p.done), Some(6));
        assert!(progress.iter().all(|p| p.total == 6));

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 16);
        assert!(lines[0].starts_with("Case,Segmentation Label,IoU,Dice"));
        assert!(!text.contains("case03"));
        assert!(!text.contains("case04"));
    }

    /// 同一病例的行连续出现, 且顺序固定.
    #[test]
    fn test_rows_grouped_per_case() {
        let (text, _, _) = run(4);
        let rows: Vec<(&str, &str)> = text
            .lines()
            .skip(1)
            .map(|l| {
                let mut it = l.split(',');
                (it.next().unwrap(), it.next().unwrap())
            })
            .collect();
        for chunk in rows.chunks(4) {
            assert!(chunk.iter().all(|(case, _)| *case == chunk[0].0));
            let keys: Vec<_> = chunk.iter().map(|(_, k)| *k).collect();
            assert_eq!(keys, ["1", "2", "5", "combined_1_2"]);
        }
    }

    /// 重复运行得到相同的行集合 (顺序可能不同).
    #[test]
    fn test_rerun_same_multiset() {
        let sorted = |s: String| {
            let mut v: Vec<String> = s.lines().map(str::to_string).collect();
            v.sort();
            v
        };
        let (a, _, _) = run(4);
        let (b, _, _) = run(1);
        assert_eq!(sorted(a), sorted(b));
    }

    #[test]
    fn test_no_cases() {
        let mut table = TableWriter::new(Vec::new()).unwrap();
        let summary = run_cases(
            Arc::new(MemLoader::default()),
            Vec::new(),
            Path::new("gt"),
            Path::new("pred"),
            &mut table,
            &config(2),
            |_| panic!("no progress expected"),
        )
        .unwrap();
        assert_eq!(summary, CorpusSummary::default());
        assert_eq!(String::from_utf8(table.into_inner().unwrap()).unwrap().lines().count(), 1);
    }

    /// 加载时 panic 的加载器.
    struct PanicLoader;

    impl VolumeLoader for PanicLoader {
        fn exists(&self, _: &Path) -> bool {
            true
        }

        fn load(&self, path: &Path) -> Result<LabelVolume, LoadError> {
            if path.ends_with("boom.nii.gz") {
                panic!("decoder crashed");
            }
            Ok(volume_0125())
        }
    }

    /// worker panic 不会中止整个评估, 只记为丢失.
    #[test]
    fn test_panicked_worker_is_lost() {
        let mut table = TableWriter::new(Vec::new()).unwrap();
        let cases = vec!["ok.nii.gz".to_string(), "boom.nii.gz".to_string()];
        let summary = run_cases(
            Arc::new(PanicLoader),
            cases,
            Path::new("gt"),
            Path::new("pred"),
            &mut table,
            &config(2),
            |_| {},
        )
        .unwrap();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.lost, 1);
        assert_eq!(summary.rows, 4);
    }

    /// 写入失败是致命错误.
    #[test]
    fn test_output_failure_is_fatal() {
        struct Broken(usize);

        impl Write for Broken {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                // 允许写出表头, 之后全部失败.
                if self.0 == 0 {
                    return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
                }
                self.0 -= 1;
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (loader, cases) = corpus();
        let mut table = TableWriter::new(Broken(1)).unwrap();
        let e = run_cases(
            Arc::new(loader),
            cases,
            Path::new("gt"),
            Path::new("pred"),
            &mut table,
            &config(2),
            |_| {},
        )
        .unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::Other);
    }

    /// 真值目录无法枚举时整个评估失败, 且不创建结果表.
    #[test]
    fn test_run_corpus_missing_input_dir() {
        let dir = std::env::temp_dir().join(format!("seg-berry-input-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let output = dir.join("out.csv");
        let e = run_corpus(
            Path::new("/nonexistent/seg-berry/gt"),
            Path::new("/nonexistent/seg-berry/pred"),
            output.as_path(),
            &EvalConfig::default(),
        )
        .unwrap_err();
        let created = output.exists();
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(e, CorpusError::Input { .. }));
        assert!(!created);
    }

    /// 结果表无法创建时返回输出错误.
    #[test]
    fn test_run_corpus_output_unavailable() {
        let dir = std::env::temp_dir().join(format!("seg-berry-output-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let e = run_corpus(
            dir.as_path(),
            dir.as_path(),
            Path::new("/nonexistent/seg-berry/out.csv"),
            &EvalConfig::default(),
        )
        .unwrap_err();
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(e, CorpusError::Output(_)));
    }
}
