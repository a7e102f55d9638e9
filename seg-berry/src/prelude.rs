//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::config::{EvalConfig, LabelGroup};
pub use crate::consts::{Label, BACKGROUND, COMBINED_KEY};
pub use crate::data::{LabelVolume, NiftiHeaderAttr, NiftiLoader, VolumeLoader};

pub use crate::eval::{evaluate_case, CaseMetrics, LabelKey, MetricRecord};
pub use crate::metrics::{pair_metrics, EmptySlicePolicy, PairMetrics, PointSet};

pub use crate::dataset::{self, run_corpus, CorpusSummary};
pub use crate::report::{write_header_table, TableWriter};
