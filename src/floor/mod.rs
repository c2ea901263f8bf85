pub mod floor;
pub mod request_log;

pub use floor::FloorActor;
pub use request_log::{RequestLog, RequestLogError};
