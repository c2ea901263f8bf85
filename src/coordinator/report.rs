/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::dispatch::{CarStatus, DispatchAlgorithm, Request};

/***************************************/
/*             Public API              */
/***************************************/
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Final state of a simulation run. `requests[i]` is request `#i`.
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub requests: Vec<Request>,
    pub cars: Vec<CarStatus>,
}

impl RunReport {
    pub fn from_dispatch(dispatch: &DispatchAlgorithm) -> RunReport {
        RunReport {
            requests: dispatch.requests().to_vec(),
            cars: dispatch.statuses(),
        }
    }

    pub fn served(&self) -> usize {
        self.requests.iter().filter(|r| r.is_complete()).count()
    }

    pub fn transferred(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| r.transferred_to.is_some())
            .count()
    }

    pub fn mean_wait_time(&self) -> Option<Duration> {
        mean(self.requests.iter().filter_map(|r| r.wait_time()))
    }

    pub fn mean_travel_time(&self) -> Option<Duration> {
        mean(self.requests.iter().filter_map(|r| r.travel_time()))
    }

    pub fn log_summary(&self) {
        info!(
            "Served {} of {} requests, {} passengers transferred after faults",
            self.served(),
            self.requests.len(),
            self.transferred()
        );
        if let (Some(wait), Some(travel)) = (self.mean_wait_time(), self.mean_travel_time()) {
            info!("Mean wait {:?}, mean travel {:?}", wait, travel);
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn mean(durations: impl Iterator<Item = Duration>) -> Option<Duration> {
    let (total, count) = durations.fold((Duration::ZERO, 0u32), |(total, count), d| {
        (total + d, count + 1)
    });
    if count == 0 {
        None
    } else {
        Some(total / count)
    }
}
