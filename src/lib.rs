pub mod cache;
pub mod cli;
pub mod error;
pub mod export;
pub mod git;
pub mod identity;
pub mod model;
pub mod stats;
pub mod util;

pub use error::{DevstatsError, Result};
pub use identity::IdentityResolver;
pub use model::{ContributionReport, ContributionSummary, ProjectTotals, RawCommit};
pub use stats::ContributionAggregator;
