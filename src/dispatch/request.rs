/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Serialize;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, DispatchError, Floor, RequestId};

/***************************************/
/*       Public data structures        */
/***************************************/

/**
 * One passenger trip.
 *
 * The trip itself (source, destination, direction) never changes after creation. Progress
 * is tracked by the pickup and dropoff timestamps, each set exactly once; a request with
 * both set is inert and only kept for metrics.
 *
 * # Fields
 * - `created`:         Time the call was registered, as an offset from the dispatcher epoch.
 * - `source`:          Floor the passenger waits on.
 * - `destination`:     Floor the passenger wants to go to.
 * - `direction`:       Requested direction, always consistent with source and destination.
 * - `pickup_time`:     Set when the assigned car reaches `source`.
 * - `dropoff_time`:    Set when the assigned car reaches `destination` after pickup.
 * - `transferred_to`:  Set when the passenger was moved to a new request after a car fault.
 */
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Request {
    pub created: Duration,
    pub source: Floor,
    pub destination: Floor,
    pub direction: Direction,
    pub pickup_time: Option<Duration>,
    pub dropoff_time: Option<Duration>,
    pub transferred_to: Option<RequestId>,
}

/// Checks the floor/direction invariant of a passenger call.
pub fn validate(source: Floor, direction: Direction, destination: Floor) -> Result<(), DispatchError> {
    let expected = Direction::between(source, destination);
    if expected == Direction::Stop || expected != direction {
        return Err(DispatchError::InvalidRequest {
            origin: source,
            destination,
            direction,
        });
    }
    Ok(())
}

impl Request {
    pub fn new(
        created: Duration,
        source: Floor,
        direction: Direction,
        destination: Floor,
    ) -> Result<Request, DispatchError> {
        validate(source, direction, destination)?;

        Ok(Request {
            created,
            source,
            destination,
            direction,
            pickup_time: None,
            dropoff_time: None,
            transferred_to: None,
        })
    }

    pub fn is_picked_up(&self) -> bool {
        self.pickup_time.is_some()
    }

    pub fn is_dropped_off(&self) -> bool {
        self.dropoff_time.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.is_picked_up() && self.is_dropped_off()
    }

    /// The floor the car must visit next for this request, `None` once it is complete.
    pub fn pending_stop(&self) -> Option<Floor> {
        if !self.is_picked_up() {
            Some(self.source)
        } else if !self.is_dropped_off() {
            Some(self.destination)
        } else {
            None
        }
    }

    pub fn mark_picked_up(&mut self, id: RequestId, now: Duration) -> Result<(), DispatchError> {
        if self.is_picked_up() {
            return Err(DispatchError::AlreadyPickedUp(id));
        }
        self.pickup_time = Some(now);
        Ok(())
    }

    pub fn mark_dropped_off(&mut self, id: RequestId, now: Duration) -> Result<(), DispatchError> {
        let pickup_time = match self.pickup_time {
            Some(t) => t,
            None => return Err(DispatchError::DropoffBeforePickup(id)),
        };
        if self.is_dropped_off() {
            return Err(DispatchError::AlreadyDroppedOff(id));
        }
        self.dropoff_time = Some(now.max(pickup_time));
        Ok(())
    }

    /// Time spent waiting for a car.
    pub fn wait_time(&self) -> Option<Duration> {
        self.pickup_time.map(|t| t.saturating_sub(self.created))
    }

    /// Time spent inside the car.
    pub fn travel_time(&self) -> Option<Duration> {
        match (self.pickup_time, self.dropoff_time) {
            (Some(pickup), Some(dropoff)) => Some(dropoff.saturating_sub(pickup)),
            _ => None,
        }
    }
}
