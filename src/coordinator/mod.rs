pub mod coordinator;
pub mod report;

pub use coordinator::{Activity, Coordinator};
pub use report::RunReport;
