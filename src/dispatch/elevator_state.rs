/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Serialize;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, ElevatorId, Floor, RequestId};

/***************************************/
/*       Public data structures        */
/***************************************/

/**
 * Dispatch-side view of one car.
 *
 * Owned by the `DispatchAlgorithm`. The queue holds ids into the dispatcher's request log,
 * in assignment order; completed requests stay in it until the car is taken out of service.
 *
 * `direction` is `Stop` whenever the car has no pending work or is not usable.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ElevatorState {
    pub id: ElevatorId,
    pub floor: Floor,
    pub direction: Direction,
    pub usable: bool,
    pub stop_requested: bool,
    pub queue: Vec<RequestId>,
}

impl ElevatorState {
    pub fn new(id: ElevatorId, floor: Floor) -> ElevatorState {
        ElevatorState {
            id,
            floor,
            direction: Direction::Stop,
            usable: true,
            stop_requested: false,
            queue: Vec::new(),
        }
    }

    // Halt and hold the car where it is
    pub fn halt(&mut self) {
        self.direction = Direction::Stop;
        self.stop_requested = true;
    }
}

/// Read-only snapshot of a car, for monitors and the run report.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CarStatus {
    pub id: ElevatorId,
    pub floor: Floor,
    pub direction: Direction,
    pub usable: bool,
    pub pending: Vec<RequestId>,
}
