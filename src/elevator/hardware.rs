use crate::config::{ElevatorConfig, HardwareConfig};
use crate::elevator::actuation::{ActuationError, Actuator};
use crate::shared::{Direction, Floor};
use driver_rust::elevio::elev::{Elevator, DIRN_DOWN, DIRN_STOP};
use log::{info, warn};
use std::thread::sleep;
use std::time::{Duration, Instant};

/**
 * # Hardware Actuator
 * Drives a physical (or simulated) elevator through the elevator server.
 *
 * Motor, door light and sensors are reached through the `driver-rust` crate. Floor arrival is
 * detected by polling the floor sensor every `poll_period`. A move that does not reach a new
 * floor within `motor_timeout` is reported as a stuck car; the car counts as repaired once an
 * operator presses the stop button.
 *
 * # Fields
 *
 * - `elevator`:        Connection to the elevator server.
 * - `floor`:           Last floor seen by the floor sensor.
 * - `poll_period`:     Sleep between sensor polls.
 * - `door_open_time`:  How long the door stays open before closing.
 * - `motor_timeout`:   Longest allowed travel time between two floors.
 */
pub struct HardwareActuator {
    elevator: Elevator,
    floor: Floor,
    poll_period: Duration,
    door_open_time: Duration,
    motor_timeout: Duration,
}

impl HardwareActuator {
    pub fn new(
        hardware: &HardwareConfig,
        config: &ElevatorConfig,
    ) -> Result<HardwareActuator, ActuationError> {
        let elevator = Elevator::init(&hardware.driver_address, config.n_floors)?;
        let mut actuator = HardwareActuator {
            elevator,
            floor: 0,
            poll_period: Duration::from_millis(hardware.hw_thread_sleep_time),
            door_open_time: Duration::from_millis(config.door_open_time),
            motor_timeout: Duration::from_millis(hardware.motor_timeout),
        };
        actuator.find_initial_floor();
        Ok(actuator)
    }

    // Drive down until the floor sensor sees a floor
    fn find_initial_floor(&mut self) {
        self.elevator.door_light(false);
        if self.elevator.floor_sensor().is_none() {
            self.elevator.motor_direction(DIRN_DOWN);
        }
        loop {
            if let Some(floor) = self.elevator.floor_sensor() {
                self.elevator.motor_direction(DIRN_STOP);
                self.floor = floor;
                info!("Elevator found at floor {}", floor);
                return;
            }
            sleep(self.poll_period);
        }
    }
}

impl Actuator for HardwareActuator {
    fn floor(&self) -> Floor {
        self.floor
    }

    fn move_one_floor(&mut self, direction: Direction) -> Result<Floor, ActuationError> {
        let blocked = match direction {
            Direction::Down => self.floor == 0,
            Direction::Up => self.floor + 1 >= self.elevator.num_floors,
            Direction::Stop => true,
        };
        if blocked {
            return Err(ActuationError::EndOfShaft {
                floor: self.floor,
                direction,
            });
        }

        self.elevator.motor_direction(direction.to_u8());
        let deadline = Instant::now() + self.motor_timeout;

        loop {
            if let Some(floor) = self.elevator.floor_sensor() {
                if floor != self.floor {
                    self.floor = floor;
                    return Ok(floor);
                }
            }
            if Instant::now() > deadline {
                self.elevator.motor_direction(DIRN_STOP);
                return Err(ActuationError::Stuck { floor: self.floor });
            }
            sleep(self.poll_period);
        }
    }

    fn stop(&mut self) {
        self.elevator.motor_direction(DIRN_STOP);
    }

    fn open_door(&mut self) {
        self.elevator.door_light(true);
    }

    fn close_door(&mut self) {
        sleep(self.door_open_time);
        while self.elevator.obstruction() {
            sleep(self.poll_period);
        }
        self.elevator.door_light(false);
    }

    fn wait_for_repair(&mut self) -> Floor {
        warn!("Elevator stuck near floor {}, press stop to clear", self.floor);
        while !self.elevator.stop_button() {
            sleep(self.poll_period);
        }
        if let Some(floor) = self.elevator.floor_sensor() {
            self.floor = floor;
        }
        self.floor
    }
}
