pub mod errors;
pub mod macros;
pub mod messages;
pub mod structs;

pub use errors::DispatchError;
pub use messages::Command;
pub use messages::ElevatorEvent;
pub use messages::Event;
pub use messages::FloorEvent;
pub use messages::RequestCall;
pub use structs::Direction;
pub use structs::ElevatorId;
pub use structs::Floor;
pub use structs::RequestId;
