/***************************************/
/*        3rd party libraries          */
/***************************************/
use clap::Arg;
use crossbeam_channel as cbc;
use log::{error, info};
use std::path::Path;
use std::process::exit;
use std::thread::{Builder, JoinHandle};

/***************************************/
/*           Local modules             */
/***************************************/
mod config;
mod coordinator;
mod dispatch;
mod elevator;
mod floor;
mod shared;

use config::{Actuation, Config};
use coordinator::Coordinator;
use dispatch::DispatchAlgorithm;
use elevator::{Actuator, ElevatorFSM, HardwareActuator, SimulatedActuator};
use floor::{FloorActor, RequestLog};
use shared::{Command, Event};

/***************************************/
/*                Main                 */
/***************************************/
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = clap::Command::new("elevator-dispatch")
        .about("Simulates a bank of elevators serving a log of passenger calls")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .default_value("config.toml")
                .help("Configuration file"),
        )
        .arg(
            Arg::new("requests")
                .long("requests")
                .short('r')
                .takes_value(true)
                .help("Request log, overrides floor.request_log"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .takes_value(true)
                .help("Write the run report as JSON to this file"),
        )
        .get_matches();

    // Load the configuration
    let config_path = matches.value_of("config").unwrap_or("config.toml");
    let config = unwrap_or_exit!(config::load_config(Path::new(config_path)));
    let n_elevators = config.dispatch.n_elevators;

    // Initialize channels
    let (event_tx, event_rx) = cbc::bounded::<Event>(config.dispatch.queue_capacity);
    let (_coordinator_terminate_tx, coordinator_terminate_rx) = cbc::unbounded::<()>();

    // Start the elevator modules
    let mut command_txs = Vec::with_capacity(n_elevators);
    let mut elevator_threads = Vec::with_capacity(n_elevators);
    for id in 0..n_elevators {
        let (command_tx, command_rx) = cbc::unbounded::<Command>();
        let actuator = build_actuator(&config, id);
        let elevator_fsm = ElevatorFSM::new(id, actuator, command_rx, event_tx.clone());

        let elevator_thread = Builder::new().name(format!("elevator_{}", id));
        elevator_threads.push(unwrap_or_exit!(
            elevator_thread.spawn(move || elevator_fsm.run())
        ));
        command_txs.push(command_tx);
    }

    // Start the floor module
    let request_log_path = matches
        .value_of("requests")
        .unwrap_or(config.floor.request_log.as_str());
    let request_log = unwrap_or_exit!(RequestLog::open(Path::new(request_log_path)));
    info!("Replaying calls from {}", request_log_path);
    let floor_actor = FloorActor::new(
        request_log,
        config.elevator.n_floors,
        config.floor.time_scale,
        event_tx,
    );
    let floor_thread = Builder::new().name("floor".into());
    let floor_thread = unwrap_or_exit!(floor_thread.spawn(move || floor_actor.run()));

    // Run the coordinator on the main thread
    let dispatch = DispatchAlgorithm::new(n_elevators, config.elevator.start_floor);
    let coordinator = Coordinator::new(dispatch, event_rx, command_txs, coordinator_terminate_rx);

    match coordinator.run() {
        Ok(report) => {
            report.log_summary();
            if let Some(path) = matches.value_of("report") {
                unwrap_or_exit!(report.write_json(Path::new(path)));
                info!("Run report written to {}", path);
            }
            join_all(floor_thread, elevator_threads);
        }
        Err(e) => {
            error!("Simulation aborted: {}", e);
            exit(1);
        }
    }
}

fn build_actuator(config: &Config, id: usize) -> Box<dyn Actuator> {
    match config.elevator.actuation {
        Actuation::Simulated => {
            let fault = config.faults.iter().find(|f| f.elevator == id).cloned();
            Box::new(SimulatedActuator::new(&config.elevator, fault))
        }
        Actuation::Hardware => Box::new(unwrap_or_exit!(HardwareActuator::new(
            &config.hardware,
            &config.elevator
        ))),
    }
}

fn join_all(floor_thread: JoinHandle<()>, elevator_threads: Vec<JoinHandle<()>>) {
    if floor_thread.join().is_err() {
        error!("Floor thread panicked");
    }
    for (id, thread) in elevator_threads.into_iter().enumerate() {
        if thread.join().is_err() {
            error!("Elevator {} thread panicked", id);
        }
    }
}
