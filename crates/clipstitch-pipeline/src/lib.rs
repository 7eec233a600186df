pub mod config;
pub mod error;
pub mod fsops;
pub mod naming;
pub mod organize;
pub mod pipeline;
pub mod sequence;
pub mod stitch;
pub mod tools;

pub use crate::config::{ConfigOverrides, StitchConfig};
pub use crate::error::{StitchError, StitchResult};
pub use crate::fsops::{LocalFs, MediaFs};
pub use crate::organize::{organize, OrganizeReport};
pub use crate::pipeline::{day_directories, run, RunOptions, RunSummary};
pub use crate::stitch::{stitch_day, DayReport, RunOutcome};
pub use crate::tools::{open_media_tools, MediaTools};
