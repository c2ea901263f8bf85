pub mod actuation;
pub mod fsm;
pub mod hardware;

pub use actuation::{Actuator, SimulatedActuator};
pub use fsm::ElevatorFSM;
pub use hardware::HardwareActuator;
