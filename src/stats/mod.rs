pub mod aggregate;
pub mod exec;
pub mod fetch;
pub mod output;
pub mod streak;

pub use aggregate::{ContributionAggregator, DeveloperActivity};
pub use exec::exec;
pub use fetch::fetch_commits;
pub use output::{output_json, output_ndjson, output_table};
pub use streak::compute_streaks;
