/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, warn};
use std::thread::sleep;
use std::time::Duration;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::{ElevatorConfig, FaultConfig};
use crate::shared::{Direction, Floor};

/***************************************/
/*             Public API              */
/***************************************/
#[derive(Error, Debug)]
pub enum ActuationError {
    #[error("car stuck after leaving floor {floor}")]
    Stuck { floor: Floor },

    #[error("cannot move {direction} from floor {floor}, end of shaft")]
    EndOfShaft { floor: Floor, direction: Direction },

    #[error("elevator driver error: {0}")]
    Driver(#[from] std::io::Error),
}

impl ActuationError {
    /// Faults that clear by themselves once the car has been repaired.
    pub fn is_repairable(&self) -> bool {
        matches!(self, ActuationError::Stuck { .. })
    }
}

/**
 * Motor, door and floor sensor of one car.
 *
 * Every call blocks the calling elevator thread until the physical action is done.
 */
pub trait Actuator: Send {
    /// Last floor the car was seen at.
    fn floor(&self) -> Floor;

    /// Travels one floor in `direction` and returns the floor reached.
    fn move_one_floor(&mut self, direction: Direction) -> Result<Floor, ActuationError>;

    fn stop(&mut self);

    fn open_door(&mut self);

    /// Holds the door open for the configured time, then closes it.
    fn close_door(&mut self);

    /// Blocks until a repairable fault is fixed and returns the floor the car is at.
    fn wait_for_repair(&mut self) -> Floor;
}

/**
 * Actuation with simulated timing.
 *
 * Travel takes `travel_time` per floor and the door stays open for `door_open_time`. An
 * optional injected fault makes the car stuck on the move after `after_moves` successful
 * moves; it is repaired `repair_time` later.
 */
pub struct SimulatedActuator {
    floor: Floor,
    n_floors: u8,
    travel_time: Duration,
    door_open_time: Duration,
    fault: Option<FaultConfig>,
    repair_time: Duration,
    moves: u32,
    door_open: bool,
}

impl SimulatedActuator {
    pub fn new(config: &ElevatorConfig, fault: Option<FaultConfig>) -> SimulatedActuator {
        SimulatedActuator {
            floor: config.start_floor,
            n_floors: config.n_floors,
            travel_time: Duration::from_millis(config.travel_time),
            door_open_time: Duration::from_millis(config.door_open_time),
            fault,
            repair_time: Duration::ZERO,
            moves: 0,
            door_open: false,
        }
    }
}

impl Actuator for SimulatedActuator {
    fn floor(&self) -> Floor {
        self.floor
    }

    fn move_one_floor(&mut self, direction: Direction) -> Result<Floor, ActuationError> {
        if self.door_open {
            warn!("Moving with the door open at floor {}", self.floor);
        }

        if let Some(fault) = self.fault.take() {
            if fault.after_moves == self.moves {
                self.repair_time = Duration::from_millis(fault.repair_time);
                return Err(ActuationError::Stuck { floor: self.floor });
            }
            self.fault = Some(fault);
        }

        let next = direction
            .step(self.floor)
            .filter(|f| *f < self.n_floors && direction != Direction::Stop)
            .ok_or(ActuationError::EndOfShaft {
                floor: self.floor,
                direction,
            })?;

        sleep(self.travel_time);
        self.moves += 1;
        self.floor = next;
        Ok(next)
    }

    fn stop(&mut self) {
        debug!("Motor stopped at floor {}", self.floor);
    }

    fn open_door(&mut self) {
        self.door_open = true;
    }

    fn close_door(&mut self) {
        sleep(self.door_open_time);
        self.door_open = false;
    }

    fn wait_for_repair(&mut self) -> Floor {
        sleep(self.repair_time);
        self.floor
    }
}
