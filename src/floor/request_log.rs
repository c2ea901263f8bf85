/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, Floor, RequestCall};

/***************************************/
/*             Public API              */
/***************************************/
#[derive(Error, Debug)]
pub enum RequestLogError {
    #[error("failed to read request log: {0}")]
    Io(#[from] std::io::Error),

    #[error("request log line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/**
 * Passenger calls read lazily from a text log.
 *
 * One call per line: `hh:mm:ss.mmm <source floor> <Up|Down> <destination floor>`. Blank lines
 * and lines starting with `#` are skipped. Timestamps must not go backwards; a line that does
 * is reported as a parse error and skipped. The log is consumed as it is iterated and cannot
 * be restarted.
 */
pub struct RequestLog<R> {
    lines: Lines<R>,
    line: usize,
    last_timestamp: Duration,
}

impl RequestLog<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, RequestLogError> {
        let file = File::open(path)?;
        Ok(RequestLog::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RequestLog<R> {
    pub fn new(reader: R) -> RequestLog<R> {
        RequestLog {
            lines: reader.lines(),
            line: 0,
            last_timestamp: Duration::ZERO,
        }
    }

    fn parse_line(&self, text: &str) -> Result<RequestCall, RequestLogError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(self.error(format!("expected 4 fields, found {}", fields.len())));
        }

        let timestamp = parse_timestamp(fields[0]).map_err(|reason| self.error(reason))?;
        let source = parse_floor(fields[1]).map_err(|reason| self.error(reason))?;
        let direction = parse_direction(fields[2]).map_err(|reason| self.error(reason))?;
        let destination = parse_floor(fields[3]).map_err(|reason| self.error(reason))?;

        if timestamp < self.last_timestamp {
            return Err(self.error(format!(
                "timestamp {:?} is earlier than the previous one",
                timestamp
            )));
        }

        Ok(RequestCall {
            timestamp,
            source,
            direction,
            destination,
        })
    }

    fn error(&self, reason: String) -> RequestLogError {
        RequestLogError::Parse {
            line: self.line,
            reason,
        }
    }
}

impl<R: BufRead> Iterator for RequestLog<R> {
    type Item = Result<RequestCall, RequestLogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            let text = text.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let call = self.parse_line(text);
            if let Ok(call) = &call {
                self.last_timestamp = call.timestamp;
            }
            return Some(call);
        }
    }
}

/***************************************/
/*          Private helpers            */
/***************************************/

// hh:mm:ss with an optional fraction of a second, millisecond precision
fn parse_timestamp(text: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid timestamp '{}'", text);

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }
    let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
    let minutes: u64 = parts[1].parse().map_err(|_| invalid())?;

    let (seconds, fraction) = match parts[2].split_once('.') {
        Some((seconds, fraction)) => (seconds, fraction),
        None => (parts[2], ""),
    };
    let seconds: u64 = seconds.parse().map_err(|_| invalid())?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let millis: u64 = format!("{:0<3}", &fraction[..fraction.len().min(3)])
        .parse()
        .map_err(|_| invalid())?;

    let total_millis = hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)?;

    Ok(Duration::from_millis(total_millis))
}

fn parse_floor(text: &str) -> Result<Floor, String> {
    text.parse()
        .map_err(|_| format!("invalid floor '{}'", text))
}

fn parse_direction(text: &str) -> Result<Direction, String> {
    match text.to_ascii_lowercase().as_str() {
        "up" => Ok(Direction::Up),
        "down" => Ok(Direction::Down),
        _ => Err(format!("invalid direction '{}'", text)),
    }
}
