use crate::elevator::actuation::Actuator;
use crate::shared::{Command, Direction, ElevatorEvent, ElevatorId, Event};
use crossbeam_channel as cbc;
use log::{debug, error, info};

/**
 * Runs one car.
 *
 * The `ElevatorFSM` turns coordinator commands into actuator calls and reports what the
 * car did back to the coordinator. It owns no dispatch logic: every move is one floor and
 * the coordinator decides after each arrival what comes next.
 *
 * # Fields
 * - `id`:              Elevator id used in every reported event.
 * - `actuator`:        Motor, door and sensors of the car.
 * - `command_rx`:      Receives commands from the coordinator.
 * - `event_tx`:        Bounded coordinator inbound queue, sending blocks while it is full.
 * - `out_of_service`:  Set while the car has an unrepaired fault.
 */
pub struct ElevatorFSM {
    id: ElevatorId,
    actuator: Box<dyn Actuator>,
    command_rx: cbc::Receiver<Command>,
    event_tx: cbc::Sender<Event>,
    out_of_service: bool,
}

impl ElevatorFSM {
    pub fn new(
        id: ElevatorId,
        actuator: Box<dyn Actuator>,
        command_rx: cbc::Receiver<Command>,
        event_tx: cbc::Sender<Event>,
    ) -> ElevatorFSM {
        ElevatorFSM {
            id,
            actuator,
            command_rx,
            event_tx,
            out_of_service: false,
        }
    }

    pub fn run(mut self) {
        // Tell the coordinator where the car starts
        let floor = self.actuator.floor();
        if !self.report(ElevatorEvent::ArrivedAtFloor(self.id, floor)) {
            return;
        }
        info!("Elevator {} ready at floor {}", self.id, floor);

        // Main loop
        loop {
            let command = match self.command_rx.recv() {
                Ok(command) => command,
                Err(_) => {
                    debug!("Elevator {} command channel closed", self.id);
                    break;
                }
            };

            if !self.handle_command(command) {
                break;
            }
        }

        self.actuator.stop();
        info!("Elevator {} terminated", self.id);
    }

    // Returns false when the elevator should terminate
    fn handle_command(&mut self, command: Command) -> bool {
        debug!("Elevator {} received {:?}", self.id, command);

        match command {
            Command::Move(Direction::Stop) | Command::Stop => {
                self.actuator.stop();
                true
            }
            Command::Move(direction) => self.move_one_floor(direction),
            Command::OpenDoor => {
                self.actuator.open_door();
                self.report(ElevatorEvent::DoorOpened(self.id))
            }
            Command::CloseDoor => {
                self.actuator.close_door();
                self.report(ElevatorEvent::DoorClosed(self.id))
            }
            Command::Shutdown => false,
        }
    }

    fn move_one_floor(&mut self, direction: Direction) -> bool {
        if self.out_of_service {
            error!("Elevator {} is out of service, ignoring move {}", self.id, direction);
            return true;
        }

        match self.actuator.move_one_floor(direction) {
            Ok(floor) => self.report(ElevatorEvent::ArrivedAtFloor(self.id, floor)),
            Err(e) => {
                error!("Elevator {} fault: {}", self.id, e);
                self.actuator.stop();
                self.out_of_service = true;
                if !self.report(ElevatorEvent::Fault(self.id)) {
                    return false;
                }
                if !e.is_repairable() {
                    return true;
                }

                let floor = self.actuator.wait_for_repair();
                info!("Elevator {} repaired at floor {}", self.id, floor);
                self.out_of_service = false;
                self.report(ElevatorEvent::ArrivedAtFloor(self.id, floor))
                    && self.report(ElevatorEvent::FaultCleared(self.id))
            }
        }
    }

    // Returns false when the coordinator is gone
    fn report(&self, event: ElevatorEvent) -> bool {
        match self.event_tx.send(event.into()) {
            Ok(()) => true,
            Err(e) => {
                debug!("Elevator {} could not reach coordinator: {:?}", self.id, e);
                false
            }
        }
    }
}

#[cfg(test)]
impl ElevatorFSM {
    pub fn test_get_id(&self) -> ElevatorId {
        self.id
    }
}
