/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::structs::{Direction, ElevatorId, Floor};

/***************************************/
/*       Public data structures        */
/***************************************/

/// A passenger call as it comes out of the request log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RequestCall {
    pub timestamp: Duration,
    pub source: Floor,
    pub direction: Direction,
    pub destination: Floor,
}

/// Floor actor -> coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum FloorEvent {
    NewRequest(RequestCall),
    LogExhausted,
}

/// Elevator actor -> coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum ElevatorEvent {
    ArrivedAtFloor(ElevatorId, Floor),
    DoorOpened(ElevatorId),
    DoorClosed(ElevatorId),
    Fault(ElevatorId),
    FaultCleared(ElevatorId),
}

/// Everything that can land in the coordinator's inbound queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Floor(FloorEvent),
    Elevator(ElevatorEvent),
}

impl From<FloorEvent> for Event {
    fn from(event: FloorEvent) -> Self {
        Event::Floor(event)
    }
}

impl From<ElevatorEvent> for Event {
    fn from(event: ElevatorEvent) -> Self {
        Event::Elevator(event)
    }
}

/// Coordinator -> elevator actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move(Direction),
    Stop,
    OpenDoor,
    CloseDoor,
    Shutdown,
}
