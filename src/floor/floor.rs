use crate::dispatch::request;
use crate::floor::request_log::RequestLogError;
use crate::shared::{Event, FloorEvent, RequestCall};
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::thread::sleep;
use std::time::{Duration, Instant};

/**
 * Replays passenger calls into the coordinator.
 *
 * Calls are sent when their log timestamp comes due, measured from the first call and
 * multiplied by `time_scale` (0 sends everything at once). Calls with floors outside the
 * building or a direction that does not match their floors are dropped with a warning.
 * When the log runs out the coordinator gets `LogExhausted`.
 *
 * # Fields
 * - `requests`:    Source of calls, usually a `RequestLog`.
 * - `n_floors`:    Number of floors in the building.
 * - `time_scale`:  Factor applied to the gaps between timestamps.
 * - `event_tx`:    Bounded coordinator inbound queue.
 */
pub struct FloorActor<I> {
    requests: I,
    n_floors: u8,
    time_scale: f64,
    event_tx: cbc::Sender<Event>,
}

impl<I> FloorActor<I>
where
    I: Iterator<Item = Result<RequestCall, RequestLogError>>,
{
    pub fn new(
        requests: I,
        n_floors: u8,
        time_scale: f64,
        event_tx: cbc::Sender<Event>,
    ) -> FloorActor<I> {
        FloorActor {
            requests,
            n_floors,
            time_scale,
            event_tx,
        }
    }

    pub fn run(self) {
        let FloorActor {
            requests,
            n_floors,
            time_scale,
            event_tx,
        } = self;

        let start = Instant::now();
        let mut first_timestamp: Option<Duration> = None;
        let mut sent = 0usize;

        for entry in requests {
            let call = match entry {
                Ok(call) => call,
                Err(e) => {
                    warn!("Skipping request log entry: {}", e);
                    continue;
                }
            };

            if call.source >= n_floors || call.destination >= n_floors {
                warn!(
                    "Rejected call from floor {} to floor {}, building has {} floors",
                    call.source, call.destination, n_floors
                );
                continue;
            }
            if let Err(e) = request::validate(call.source, call.direction, call.destination) {
                warn!("Rejected call: {}", e);
                continue;
            }

            // Wait until the call is due
            let first = *first_timestamp.get_or_insert(call.timestamp);
            let gap = call.timestamp.saturating_sub(first);
            let due = match Duration::try_from_secs_f64(gap.as_secs_f64() * time_scale)
                .ok()
                .and_then(|offset| start.checked_add(offset))
            {
                Some(due) => due,
                None => {
                    warn!(
                        "Rejected call from floor {} at {:?}, scaled by {} it is never due",
                        call.source, call.timestamp, time_scale
                    );
                    continue;
                }
            };
            let now = Instant::now();
            if due > now {
                sleep(due - now);
            }

            debug!("Floor {} calling {} to floor {}", call.source, call.direction, call.destination);
            if event_tx.send(FloorEvent::NewRequest(call).into()).is_err() {
                warn!("Coordinator gone, floor actor stopping");
                return;
            }
            sent += 1;
        }

        info!("Request log exhausted after {} calls", sent);
        if let Err(e) = event_tx.send(FloorEvent::LogExhausted.into()) {
            debug!("Floor actor could not reach coordinator: {:?}", e);
        }
    }
}
