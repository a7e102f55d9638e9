//! 程序运行函数.

use crate::args::Command;
use crate::result::Outcome;
use seg_berry::dataset::run_corpus;
use seg_berry::report::write_header_table;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

/// 实际运行.
pub fn run(command: Command) -> Result<Outcome, Box<dyn Error>> {
    match command {
        Command::Eval(args) => {
            let paths = args.paths()?;
            let config = args.config();
            log::info!(
                "Evaluating {} against {}",
                paths.pred_dir.display(),
                paths.gt_dir.display()
            );
            let summary = run_corpus(&paths.gt_dir, &paths.pred_dir, &paths.output, &config)?;
            Ok(Outcome::Eval {
                summary,
                output: paths.output,
            })
        }
        Command::Headers { dir, output } => {
            let out = BufWriter::new(File::create(&output)?);
            let files = write_header_table(&dir, out)?;
            Ok(Outcome::Headers { files, output })
        }
    }
}
