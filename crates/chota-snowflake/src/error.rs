use thiserror::Error;

/// Errors returned by Snowflake initialization and ID generation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid worker id {worker_id}; expected 0..={max_worker_id}")]
    InvalidWorkerId { worker_id: u16, max_worker_id: u16 },
    #[error("epoch is ahead of current clock time: epoch={epoch}, now={now}")]
    EpochAhead {
        epoch: jiff::Timestamp,
        now: jiff::Timestamp,
    },
    #[error("clock moved backwards: last id at {last_millis}ms, clock reads {now_millis}ms")]
    ClockMovedBackwards { last_millis: i64, now_millis: i64 },
    #[error("overtime limit")]
    OverTimeLimit,
    #[error("generator state lock is poisoned")]
    StatePoisoned,
}
