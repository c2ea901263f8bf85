/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, info, warn};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::coordinator::RunReport;
use crate::dispatch::{DispatchAlgorithm, Request, Served};
use crate::shared::{
    Command, Direction, DispatchError, ElevatorEvent, ElevatorId, Event, Floor, FloorEvent,
    RequestCall,
};

/***************************************/
/*               Enums                 */
/***************************************/
enum Wakeup {
    Inbound(Event),
    Terminate,
    NoEvent,
}

/// What a car is physically busy with, as far as the coordinator knows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Starting,
    Idle,
    Moving,
    DoorCycle,
    OutOfService,
}

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Drives the dispatch algorithm from the inbound event queue.
 *
 * The coordinator is the only owner of the `DispatchAlgorithm`; every dispatch call happens
 * on its thread. Floor and elevator actors reach it through one bounded queue and it talks
 * back to each elevator over that elevator's command channel.
 *
 * The run ends when the request log is exhausted and every car is idle without work, on
 * terminate, or when dispatch halts because no car is usable.
 */
pub struct Coordinator {
    // Private fields
    dispatch: DispatchAlgorithm,
    activity: Vec<Activity>,
    log_exhausted: bool,

    // Channels
    event_rx: cbc::Receiver<Event>,
    command_txs: Vec<cbc::Sender<Command>>,
    coordinator_terminate_rx: cbc::Receiver<()>,
}

impl Coordinator {
    pub fn new(
        dispatch: DispatchAlgorithm,
        event_rx: cbc::Receiver<Event>,
        command_txs: Vec<cbc::Sender<Command>>,
        coordinator_terminate_rx: cbc::Receiver<()>,
    ) -> Coordinator {
        Coordinator {
            activity: vec![Activity::Starting; dispatch.n_elevators()],
            dispatch,
            log_exhausted: false,
            event_rx,
            command_txs,
            coordinator_terminate_rx,
        }
    }

    pub fn run(mut self) -> Result<RunReport, DispatchError> {
        info!("Coordinator running with {} elevators", self.dispatch.n_elevators());

        // Main loop
        loop {
            match self.wait_for_event() {
                Wakeup::Inbound(event) => {
                    debug!("Coordinator received {:?}", event);
                    match self.handle_event(event) {
                        Ok(()) => {}
                        Err(e) if e.is_fatal() => {
                            error!("Dispatch halted: {}", e);
                            self.shutdown();
                            return Err(e);
                        }
                        Err(e) => warn!("Event dropped: {}", e),
                    }
                    debug!("Cars: {:?}", self.dispatch.statuses());
                }
                Wakeup::Terminate => {
                    info!("Coordinator terminated");
                    break;
                }
                Wakeup::NoEvent => {}
            }

            if self.is_finished() {
                info!("All requests handled");
                break;
            }
        }

        self.shutdown();
        Ok(RunReport::from_dispatch(&self.dispatch))
    }

    fn wait_for_event(&self) -> Wakeup {
        cbc::select! {
            recv(self.event_rx) -> event => {
                match event {
                    Ok(event) => Wakeup::Inbound(event),
                    Err(_) => {
                        warn!("Every floor and elevator actor has hung up");
                        Wakeup::Terminate
                    }
                }
            },

            recv(self.coordinator_terminate_rx) -> _ => Wakeup::Terminate,

            default(Duration::from_millis(100)) => Wakeup::NoEvent,
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<(), DispatchError> {
        match event {
            Event::Floor(FloorEvent::NewRequest(call)) => self.on_new_request(call),

            Event::Floor(FloorEvent::LogExhausted) => {
                self.log_exhausted = true;
                Ok(())
            }

            Event::Elevator(ElevatorEvent::ArrivedAtFloor(elevator, floor)) => {
                match self.activity_of(elevator)? {
                    Activity::OutOfService => {
                        // Motion already underway when the car failed, only track where it is
                        self.dispatch.track_floor(elevator, floor)
                    }
                    Activity::DoorCycle => {
                        // Nobody boards or leaves until the door cycle at this floor has run
                        warn!("Elevator {} reported floor {} with its door open", elevator, floor);
                        self.dispatch.track_floor(elevator, floor)
                    }
                    Activity::Starting | Activity::Idle | Activity::Moving => {
                        self.serve_floor(elevator, floor)
                    }
                }
            }

            Event::Elevator(ElevatorEvent::DoorOpened(elevator)) => {
                self.activity_of(elevator)?;
                self.send(elevator, Command::CloseDoor);
                Ok(())
            }

            Event::Elevator(ElevatorEvent::DoorClosed(elevator)) => {
                self.dispatch.clear_stop(elevator)?;
                if !self.dispatch.is_usable(elevator)? {
                    self.activity[elevator] = Activity::OutOfService;
                    return Ok(());
                }
                self.activity[elevator] = Activity::Idle;
                self.dispatch_car(elevator)
            }

            Event::Elevator(ElevatorEvent::Fault(elevator)) => self.on_fault(elevator),

            Event::Elevator(ElevatorEvent::FaultCleared(elevator)) => {
                if self.activity_of(elevator)? != Activity::OutOfService {
                    warn!("Elevator {} cleared a fault it never reported", elevator);
                    return Ok(());
                }
                self.dispatch.restore_to_service(elevator)?;
                self.activity[elevator] = Activity::Idle;
                self.dispatch_car(elevator)
            }
        }
    }

    fn on_new_request(&mut self, call: RequestCall) -> Result<(), DispatchError> {
        let request = match Request::new(
            self.dispatch.now(),
            call.source,
            call.direction,
            call.destination,
        ) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected call: {}", e);
                return Ok(());
            }
        };

        let (id, elevator) = self.dispatch.assign_request(request)?;
        info!(
            "Request {} ({} from floor {} to floor {}) assigned to elevator {}",
            id, call.direction, call.source, call.destination, elevator
        );

        if self.activity[elevator] == Activity::Idle {
            self.dispatch_car(elevator)?;
        }
        Ok(())
    }

    fn on_fault(&mut self, elevator: ElevatorId) -> Result<(), DispatchError> {
        self.activity_of(elevator)?;
        self.activity[elevator] = Activity::OutOfService;

        let reassigned = match self.dispatch.remove_from_service(elevator) {
            Ok(reassigned) => reassigned,
            Err(DispatchError::NoUsableElevator) => {
                error!(
                    "Elevator {} failed with no other elevator in service, its requests wait for the repair",
                    elevator
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        for (id, target) in reassigned {
            debug!("Request {} now on elevator {}", id, target);
            if self.activity[target] == Activity::Idle {
                self.dispatch_car(target)?;
            }
        }
        Ok(())
    }

    // Completes whatever is due at `floor` and decides what the car does next
    fn serve_floor(&mut self, elevator: ElevatorId, floor: Floor) -> Result<(), DispatchError> {
        for (id, served) in self.dispatch.report_arrival(elevator, floor)? {
            match served {
                Served::Pickup => info!("Elevator {} picked up request {} at floor {}", elevator, id, floor),
                Served::Dropoff => info!("Elevator {} dropped off request {} at floor {}", elevator, id, floor),
            }
        }

        if self.dispatch.stop_requested(elevator)? {
            self.send(elevator, Command::Stop);
            self.send(elevator, Command::OpenDoor);
            self.activity[elevator] = Activity::DoorCycle;
            return Ok(());
        }

        self.dispatch_car(elevator)
    }

    // Sends a stopped or moving car towards its next stop, or leaves it idle
    fn dispatch_car(&mut self, elevator: ElevatorId) -> Result<(), DispatchError> {
        let direction = self.dispatch.next_direction(elevator)?;

        match direction {
            Direction::Up | Direction::Down => {
                self.send(elevator, Command::Move(direction));
                self.activity[elevator] = Activity::Moving;
                Ok(())
            }
            Direction::Stop if self.dispatch.has_pending_work(elevator)? => {
                // Next stop is the floor the car is already at
                let floor = self.dispatch.current_floor(elevator)?;
                self.serve_floor(elevator, floor)
            }
            Direction::Stop => {
                if self.activity[elevator] == Activity::Moving {
                    self.send(elevator, Command::Stop);
                }
                self.activity[elevator] = Activity::Idle;
                Ok(())
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.log_exhausted
            && (0..self.dispatch.n_elevators()).all(|id| {
                matches!(
                    self.activity[id],
                    Activity::Starting | Activity::Idle | Activity::OutOfService
                )
                    && !self.dispatch.has_pending_work(id).unwrap_or(false)
            })
    }

    fn activity_of(&self, elevator: ElevatorId) -> Result<Activity, DispatchError> {
        self.activity
            .get(elevator)
            .copied()
            .ok_or(DispatchError::UnknownElevator(elevator))
    }

    fn send(&self, elevator: ElevatorId, command: Command) {
        debug!("Elevator {} <- {:?}", elevator, command);
        if let Err(e) = self.command_txs[elevator].send(command) {
            error!("Failed to send {:?} to elevator {}: {:?}", command, elevator, e);
        }
    }

    fn shutdown(&self) {
        for elevator in 0..self.command_txs.len() {
            self.send(elevator, Command::Shutdown);
        }
    }
}

#[cfg(test)]
impl Coordinator {
    pub fn test_get_activity(&self) -> &[Activity] {
        &self.activity
    }

    pub fn test_get_dispatch(&self) -> &DispatchAlgorithm {
        &self.dispatch
    }
}
