/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, info, warn};
use serde::Serialize;
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::dispatch::elevator_state::{CarStatus, ElevatorState};
use crate::dispatch::request::Request;
use crate::shared::{Direction, DispatchError, ElevatorId, Floor, RequestId};

/***************************************/
/*               Enums                 */
/***************************************/
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Served {
    Pickup,
    Dropoff,
}

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Assigns passenger requests to cars and decides where every car goes next.
 *
 * Owns the state of every car and the log of every request ever registered. None of the
 * operations are synchronised; a single coordinator thread drives all of them.
 *
 * # Policy
 * - Assignment is greedy load balancing: the usable car with the fewest requests not yet
 *   dropped off wins, ties go to the lowest id. Distance is not considered.
 * - Movement keeps the current direction while there is a pending stop that way, otherwise
 *   reverses. A stationary car heads for the closest pending stop. Equal distances resolve
 *   to the request assigned first.
 * - A failed car hands its waiting passengers to other cars unchanged and its riding
 *   passengers as new transfer requests starting at the floor it failed on.
 */
pub struct DispatchAlgorithm {
    cars: Vec<ElevatorState>,
    requests: Vec<Request>,
    start_floor: Floor,
    epoch: Instant,
}

impl DispatchAlgorithm {
    pub fn new(n_elevators: usize, start_floor: Floor) -> DispatchAlgorithm {
        DispatchAlgorithm {
            cars: (0..n_elevators)
                .map(|id| ElevatorState::new(id, start_floor))
                .collect(),
            requests: Vec::new(),
            start_floor,
            epoch: Instant::now(),
        }
    }

    /// Monotonic time since the dispatcher was created.
    pub fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    pub fn n_elevators(&self) -> usize {
        self.cars.len()
    }

    /// Registers a request and gives it to the least loaded usable car.
    pub fn assign_request(
        &mut self,
        request: Request,
    ) -> Result<(RequestId, ElevatorId), DispatchError> {
        let elevator = self.choose_elevator()?;
        let id = RequestId(self.requests.len());
        self.requests.push(request);
        self.cars[elevator].queue.push(id);

        debug!("Request {} assigned to elevator {}", id, elevator);
        Ok((id, elevator))
    }

    /// Records that a car reached `floor` and completes every pickup and dropoff due there.
    ///
    /// An arrival that matches nothing only moves the car's floor.
    pub fn report_arrival(
        &mut self,
        elevator: ElevatorId,
        floor: Floor,
    ) -> Result<Vec<(RequestId, Served)>, DispatchError> {
        let now = self.now();
        let car = self
            .cars
            .get_mut(elevator)
            .ok_or(DispatchError::UnknownElevator(elevator))?;

        car.floor = floor;
        if !car.usable {
            // A failed car only reports where it is
            return Ok(Vec::new());
        }

        let mut served = Vec::new();
        for &id in car.queue.iter() {
            let request = &mut self.requests[id.0];

            if !request.is_picked_up() && request.source == floor {
                request.mark_picked_up(id, now)?;
                served.push((id, Served::Pickup));
            } else if request.is_picked_up()
                && !request.is_dropped_off()
                && request.destination == floor
            {
                request.mark_dropped_off(id, now)?;
                served.push((id, Served::Dropoff));
            }
        }

        if !served.is_empty() {
            car.halt();
        }

        Ok(served)
    }

    /// Moves a car's floor without serving anything there.
    pub fn track_floor(&mut self, elevator: ElevatorId, floor: Floor) -> Result<(), DispatchError> {
        let car = self
            .cars
            .get_mut(elevator)
            .ok_or(DispatchError::UnknownElevator(elevator))?;
        car.floor = floor;
        Ok(())
    }

    /// Floor of the next pending stop for a car, `None` when there is nothing to do.
    pub fn next_floor(&self, elevator: ElevatorId) -> Result<Option<Floor>, DispatchError> {
        let car = self.car(elevator)?;
        if !car.usable {
            return Ok(None);
        }

        let stops: Vec<Floor> = car
            .queue
            .iter()
            .filter_map(|id| self.requests[id.0].pending_stop())
            .collect();
        let floor = car.floor;

        let target = match car.direction {
            Direction::Up => closest_stop(&stops, floor, Direction::Up)
                .or_else(|| closest_stop(&stops, floor, Direction::Down)),
            Direction::Down => closest_stop(&stops, floor, Direction::Down)
                .or_else(|| closest_stop(&stops, floor, Direction::Up)),
            Direction::Stop => closest_stop(&stops, floor, Direction::Stop),
        };

        Ok(target)
    }

    /// Decides which way a car should travel now and remembers it as the car's direction.
    pub fn next_direction(&mut self, elevator: ElevatorId) -> Result<Direction, DispatchError> {
        let direction = match self.next_floor(elevator)? {
            Some(target) => Direction::between(self.cars[elevator].floor, target),
            None => Direction::Stop,
        };

        self.cars[elevator].direction = direction;
        Ok(direction)
    }

    pub fn has_pending_work(&self, elevator: ElevatorId) -> Result<bool, DispatchError> {
        let car = self.car(elevator)?;
        Ok(car
            .queue
            .iter()
            .any(|id| !self.requests[id.0].is_complete()))
    }

    /// Takes a car out of service and hands its unfinished requests to the other cars.
    ///
    /// Returns where each handed over request went. Fails with `NoUsableElevator` while the car
    /// still has work and no other car can take it; the queue is then left untouched.
    pub fn remove_from_service(
        &mut self,
        elevator: ElevatorId,
    ) -> Result<Vec<(RequestId, ElevatorId)>, DispatchError> {
        let car = self
            .cars
            .get_mut(elevator)
            .ok_or(DispatchError::UnknownElevator(elevator))?;

        if !car.usable && car.queue.is_empty() {
            debug!("Elevator {} is already out of service", elevator);
            return Ok(Vec::new());
        }

        car.usable = false;
        car.halt();
        warn!("Elevator {} removed from service", elevator);

        self.redistribute(elevator)
    }

    /// Puts a car back in service. It only gets new requests from the next assignment on.
    pub fn restore_to_service(&mut self, elevator: ElevatorId) -> Result<(), DispatchError> {
        let car = self
            .cars
            .get_mut(elevator)
            .ok_or(DispatchError::UnknownElevator(elevator))?;

        car.usable = true;
        car.stop_requested = false;
        car.direction = Direction::Stop;
        info!("Elevator {} restored to service", elevator);
        Ok(())
    }

    /// Grows or shrinks the car pool. Cars are added and removed at the end of the id range.
    ///
    /// Returns the reassignments made while shrinking, like `remove_from_service`.
    pub fn reconfigure(
        &mut self,
        n_elevators: usize,
    ) -> Result<Vec<(RequestId, ElevatorId)>, DispatchError> {
        if n_elevators == 0 {
            return Err(DispatchError::EmptyPool);
        }

        let current = self.cars.len();
        if n_elevators >= current {
            for id in current..n_elevators {
                self.cars.push(ElevatorState::new(id, self.start_floor));
            }
            info!("Car pool grown from {} to {} elevators", current, n_elevators);
            return Ok(Vec::new());
        }

        // Everything the removed cars still owe has to fit on the remaining ones
        let leftover_work = (n_elevators..current).any(|id| {
            self.cars[id]
                .queue
                .iter()
                .any(|r| !self.requests[r.0].is_complete())
        });
        let remaining_usable = self.cars[..n_elevators].iter().any(|car| car.usable);
        if leftover_work && !remaining_usable {
            return Err(DispatchError::NoUsableElevator);
        }

        for id in n_elevators..current {
            self.cars[id].usable = false;
            self.cars[id].halt();
        }
        let mut reassigned = Vec::new();
        for id in n_elevators..current {
            reassigned.extend(self.redistribute(id)?);
        }
        self.cars.truncate(n_elevators);

        info!("Car pool shrunk from {} to {} elevators", current, n_elevators);
        Ok(reassigned)
    }

    /***************************************/
    /*              Queries                */
    /***************************************/
    pub fn current_floor(&self, elevator: ElevatorId) -> Result<Floor, DispatchError> {
        Ok(self.car(elevator)?.floor)
    }

    pub fn direction(&self, elevator: ElevatorId) -> Result<Direction, DispatchError> {
        Ok(self.car(elevator)?.direction)
    }

    pub fn is_usable(&self, elevator: ElevatorId) -> Result<bool, DispatchError> {
        Ok(self.car(elevator)?.usable)
    }

    pub fn stop_requested(&self, elevator: ElevatorId) -> Result<bool, DispatchError> {
        Ok(self.car(elevator)?.stop_requested)
    }

    /// Acknowledges a requested stop once the door cycle is over.
    pub fn clear_stop(&mut self, elevator: ElevatorId) -> Result<(), DispatchError> {
        self.cars
            .get_mut(elevator)
            .ok_or(DispatchError::UnknownElevator(elevator))?
            .stop_requested = false;
        Ok(())
    }

    /// Requests assigned to a car that are not yet complete, in assignment order.
    pub fn pending_requests(
        &self,
        elevator: ElevatorId,
    ) -> Result<Vec<(RequestId, Request)>, DispatchError> {
        let car = self.car(elevator)?;
        Ok(car
            .queue
            .iter()
            .filter(|id| !self.requests[id.0].is_complete())
            .map(|&id| (id, self.requests[id.0].clone()))
            .collect())
    }

    pub fn request(&self, id: RequestId) -> Result<&Request, DispatchError> {
        self.requests
            .get(id.0)
            .ok_or(DispatchError::UnknownRequest(id))
    }

    /// Every request ever registered, indexed by `RequestId`.
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn status(&self, elevator: ElevatorId) -> Result<CarStatus, DispatchError> {
        let car = self.car(elevator)?;
        Ok(CarStatus {
            id: car.id,
            floor: car.floor,
            direction: car.direction,
            usable: car.usable,
            pending: car
                .queue
                .iter()
                .filter(|id| !self.requests[id.0].is_complete())
                .copied()
                .collect(),
        })
    }

    pub fn statuses(&self) -> Vec<CarStatus> {
        (0..self.cars.len())
            .filter_map(|id| self.status(id).ok())
            .collect()
    }

    /***************************************/
    /*          Private helpers            */
    /***************************************/
    fn car(&self, elevator: ElevatorId) -> Result<&ElevatorState, DispatchError> {
        self.cars
            .get(elevator)
            .ok_or(DispatchError::UnknownElevator(elevator))
    }

    // Number of requests on a car that still need a dropoff
    fn load(&self, car: &ElevatorState) -> usize {
        car.queue
            .iter()
            .filter(|id| !self.requests[id.0].is_dropped_off())
            .count()
    }

    fn choose_elevator(&self) -> Result<ElevatorId, DispatchError> {
        self.cars
            .iter()
            .filter(|car| car.usable)
            .min_by_key(|car| self.load(car))
            .map(|car| car.id)
            .ok_or(DispatchError::NoUsableElevator)
    }

    // Moves the unfinished work of an unusable car to the usable ones and empties its queue
    fn redistribute(
        &mut self,
        elevator: ElevatorId,
    ) -> Result<Vec<(RequestId, ElevatorId)>, DispatchError> {
        let has_work = self.has_pending_work(elevator)?;
        if has_work && !self.cars.iter().any(|car| car.usable) {
            return Err(DispatchError::NoUsableElevator);
        }

        let now = self.now();
        let floor = self.cars[elevator].floor;
        let queue = std::mem::take(&mut self.cars[elevator].queue);
        let mut reassigned = Vec::new();

        for id in queue {
            let request = &self.requests[id.0];

            if request.is_complete() {
                continue;
            }

            if !request.is_picked_up() {
                let target = self.choose_elevator()?;
                self.cars[target].queue.push(id);
                reassigned.push((id, target));
                info!(
                    "Request {} moved from elevator {} to elevator {}",
                    id, elevator, target
                );
                continue;
            }

            // Passenger is on board: they get off here and call again from this floor
            let destination = request.destination;
            if destination == floor {
                self.requests[id.0].mark_dropped_off(id, now)?;
                continue;
            }

            let transfer = Request::new(
                now,
                floor,
                Direction::between(floor, destination),
                destination,
            )?;
            let (transfer_id, target) = self.assign_request(transfer)?;
            self.requests[id.0].transferred_to = Some(transfer_id);
            reassigned.push((transfer_id, target));
            info!(
                "Passenger of request {} transferred from elevator {} as request {} on elevator {}",
                id, elevator, transfer_id, target
            );
        }

        Ok(reassigned)
    }
}

// Closest stop from `floor` in the given direction, `Stop` searching both ways.
// Ties go to the earliest stop in queue order.
fn closest_stop(stops: &[Floor], floor: Floor, direction: Direction) -> Option<Floor> {
    let mut best: Option<(u8, Floor)> = None;

    for &stop in stops {
        let in_direction = match direction {
            Direction::Up => stop >= floor,
            Direction::Down => stop <= floor,
            Direction::Stop => true,
        };
        if !in_direction {
            continue;
        }

        let distance = stop.abs_diff(floor);
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, stop)),
        }
    }

    best.map(|(_, stop)| stop)
}

#[cfg(test)]
impl DispatchAlgorithm {
    pub fn test_get_car(&self, elevator: ElevatorId) -> &ElevatorState {
        &self.cars[elevator]
    }

    pub fn test_set_direction(&mut self, elevator: ElevatorId, direction: Direction) {
        self.cars[elevator].direction = direction;
    }
}
