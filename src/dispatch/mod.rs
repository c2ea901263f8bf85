pub mod algorithm;
pub mod algorithm_tests;
pub mod elevator_state;
pub mod request;

pub use algorithm::DispatchAlgorithm;
pub use algorithm::Served;
pub use elevator_state::CarStatus;
pub use request::Request;
