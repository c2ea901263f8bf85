/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::structs::{Direction, ElevatorId, Floor, RequestId};

/***************************************/
/*             Public API              */
/***************************************/

/// Errors raised by the dispatch core.
///
/// `NoUsableElevator` is fatal: nothing can ever be assigned again until a car is
/// restored. The request and flag variants are protocol violations, the offending
/// call is rejected and the caller carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("no usable elevator to assign requests to")]
    NoUsableElevator,

    #[error("unknown elevator {0}")]
    UnknownElevator(ElevatorId),

    #[error("unknown request {0}")]
    UnknownRequest(RequestId),

    #[error("invalid request: {direction} from floor {origin} to floor {destination}")]
    InvalidRequest {
        origin: Floor,
        destination: Floor,
        direction: Direction,
    },

    #[error("request {0} was already picked up")]
    AlreadyPickedUp(RequestId),

    #[error("request {0} was already dropped off")]
    AlreadyDroppedOff(RequestId),

    #[error("request {0} cannot be dropped off before it is picked up")]
    DropoffBeforePickup(RequestId),

    #[error("cannot shrink the car pool to zero elevators")]
    EmptyPool,
}

impl DispatchError {
    /// True for errors that halt dispatch altogether.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DispatchError::NoUsableElevator)
    }
}
