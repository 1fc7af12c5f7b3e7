use crate::{
    clock::{Clock, SystemClock},
    error::Error,
    SnowflakeId,
};
use jiff::Timestamp;
use std::sync::Mutex;
use typed_builder::TypedBuilder;

const MAX_TIMESTAMP_MILLIS: i64 = (1_i64 << 41) - 1;
const MAX_WORKER_ID: u16 = (1 << 10) - 1;
const MAX_SEQUENCE: u16 = (1 << 12) - 1;

/// Default custom epoch, 2015-01-01T00:00:00Z.
pub const DEFAULT_EPOCH: Timestamp = Timestamp::constant(1_420_070_400, 0);

/// Configures a Snowflake generator instance.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SnowflakeSettings {
    /// A worker index in the range `[0, 1023]`, unique per process.
    pub worker_id: u16,
    /// Custom epoch used as the zero point for the 41-bit timestamp field.
    #[builder(default = DEFAULT_EPOCH)]
    pub epoch: Timestamp,
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: Option<i64>,
    sequence: u16,
}

/// Snowflake ID generator.
///
/// Sequence exhaustion within a millisecond blocks until the next
/// millisecond. A clock that moves backwards is treated as fatal for the
/// call: [`Error::ClockMovedBackwards`] is returned and the generator state
/// is left untouched, so generation resumes once the clock catches up.
pub struct Snowflake<C: Clock> {
    epoch_millis: i64,
    worker_id: u16,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl Snowflake<SystemClock> {
    /// Creates a generator backed by the real system clock.
    pub fn new(settings: SnowflakeSettings) -> Result<Self, Error> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Snowflake<C> {
    /// Creates a generator driven by the given clock.
    pub fn with_clock(settings: SnowflakeSettings, clock: C) -> Result<Self, Error> {
        if settings.worker_id > MAX_WORKER_ID {
            return Err(Error::InvalidWorkerId {
                worker_id: settings.worker_id,
                max_worker_id: MAX_WORKER_ID,
            });
        }

        let now = clock.now();
        if settings.epoch > now {
            return Err(Error::EpochAhead {
                epoch: settings.epoch,
                now,
            });
        }

        Ok(Self {
            epoch_millis: settings.epoch.as_millisecond(),
            worker_id: settings.worker_id,
            clock,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    /// The worker id embedded in every generated id.
    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    /// Generates the next unique id.
    pub fn next_id(&self) -> Result<i64, Error> {
        let mut state = self.state.lock().map_err(|_| Error::StatePoisoned)?;

        let mut now = self.clock.now().as_millisecond();
        let mut sequence = 0;

        if let Some(last) = state.last_millis {
            if now < last {
                return Err(Error::ClockMovedBackwards {
                    last_millis: last,
                    now_millis: now,
                });
            }

            if now == last {
                if state.sequence < MAX_SEQUENCE {
                    sequence = state.sequence + 1;
                } else {
                    // Per-millisecond sequence exhausted: wait for the next
                    // millisecond, then start the sequence over.
                    let next = Timestamp::from_millisecond(last + 1)
                        .map_err(|_| Error::OverTimeLimit)?;
                    while now <= last {
                        self.clock.wait_until(next);
                        now = self.clock.now().as_millisecond();
                    }
                }
            }
        }

        let elapsed = now - self.epoch_millis;
        if elapsed > MAX_TIMESTAMP_MILLIS {
            return Err(Error::OverTimeLimit);
        }

        let id = SnowflakeId::new()
            .with_timestamp(elapsed as u64)
            .with_worker_id(self.worker_id)
            .with_sequence(sequence);

        state.last_millis = Some(now);
        state.sequence = sequence;

        Ok(id.as_i64())
    }

    /// Returns the creation time encoded in an id produced by this generator.
    pub fn timestamp_of(&self, id: i64) -> Option<Timestamp> {
        let elapsed = SnowflakeId::from_i64(id).timestamp() as i64;
        Timestamp::from_millisecond(self.epoch_millis + elapsed).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_clock::TestClock;

    fn millis(value: i64) -> Timestamp {
        Timestamp::from_millisecond(value).unwrap()
    }

    fn make_generator(worker_id: u16, clock_millis: i64) -> (Snowflake<TestClock>, TestClock) {
        let settings = SnowflakeSettings::builder()
            .worker_id(worker_id)
            .epoch(millis(0))
            .build();
        let clock = TestClock::new(millis(clock_millis));
        let generator = Snowflake::with_clock(settings, clock.clone()).unwrap();
        (generator, clock)
    }

    #[test]
    fn first_id_has_sequence_zero() {
        let (gen, _) = make_generator(0, 100);
        let id = SnowflakeId::from_i64(gen.next_id().unwrap());
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn same_millisecond_increments_sequence() {
        let (gen, _) = make_generator(0, 100);
        let ids: Vec<_> = (0..3)
            .map(|_| SnowflakeId::from_i64(gen.next_id().unwrap()))
            .collect();
        assert_eq!(ids[0].sequence(), 0);
        assert_eq!(ids[1].sequence(), 1);
        assert_eq!(ids[2].sequence(), 2);
    }

    #[test]
    fn new_millisecond_resets_sequence() {
        let (gen, clock) = make_generator(0, 100);
        gen.next_id().unwrap();
        gen.next_id().unwrap();

        clock.set(millis(101));
        let id = SnowflakeId::from_i64(gen.next_id().unwrap());
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.timestamp(), 101);
    }

    #[test]
    fn sequence_overflow_advances_clock() {
        let (gen, _) = make_generator(0, 100);
        // Exhaust all 4096 ids allocated to millisecond 100.
        for _ in 0..=MAX_SEQUENCE {
            gen.next_id().unwrap();
        }
        let id = SnowflakeId::from_i64(gen.next_id().unwrap());
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.timestamp(), 101);
    }

    #[test]
    fn ids_are_strictly_increasing_on_one_worker() {
        let (gen, _) = make_generator(7, 100);
        let mut previous = gen.next_id().unwrap();
        for _ in 0..10_000 {
            let next = gen.next_id().unwrap();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn worker_id_is_embedded() {
        let (gen, _) = make_generator(1_023, 100);
        let id = SnowflakeId::from_i64(gen.next_id().unwrap());
        assert_eq!(id.worker_id(), 1_023);
    }

    #[test]
    fn distinct_workers_never_collide() {
        let (a, _) = make_generator(1, 100);
        let (b, _) = make_generator(2, 100);
        for _ in 0..100 {
            assert_ne!(a.next_id().unwrap(), b.next_id().unwrap());
        }
    }

    #[test]
    fn invalid_worker_id_is_rejected() {
        let settings = SnowflakeSettings::builder()
            .worker_id(1_024)
            .epoch(millis(0))
            .build();
        let result = Snowflake::with_clock(settings, TestClock::new(millis(100)));
        assert!(matches!(
            result,
            Err(Error::InvalidWorkerId {
                worker_id: 1_024,
                ..
            })
        ));
    }

    #[test]
    fn epoch_in_future_is_rejected() {
        let settings = SnowflakeSettings::builder()
            .worker_id(0)
            .epoch(millis(500))
            .build();
        let result = Snowflake::with_clock(settings, TestClock::new(millis(100)));
        assert!(matches!(result, Err(Error::EpochAhead { .. })));
    }

    #[test]
    fn clock_regression_is_fatal_for_the_call() {
        let (gen, clock) = make_generator(0, 100);
        let before = gen.next_id().unwrap();

        clock.set(millis(90));
        assert_eq!(
            gen.next_id(),
            Err(Error::ClockMovedBackwards {
                last_millis: 100,
                now_millis: 90,
            })
        );

        // Once the clock catches up, generation resumes without duplicates.
        clock.set(millis(100));
        let after = gen.next_id().unwrap();
        assert!(after > before);
        assert_eq!(SnowflakeId::from_i64(after).sequence(), 1);
    }

    #[test]
    fn overtime_limit_returns_error() {
        let (gen, _) = make_generator(0, MAX_TIMESTAMP_MILLIS + 1);
        assert_eq!(gen.next_id(), Err(Error::OverTimeLimit));
    }

    #[test]
    fn timestamp_of_recovers_creation_time() {
        let (gen, _) = make_generator(0, 12_345);
        let id = gen.next_id().unwrap();
        assert_eq!(gen.timestamp_of(id), Some(millis(12_345)));
    }

    #[test]
    fn system_clock_generator_is_unique_across_threads() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let gen = Arc::new(Snowflake::new(SnowflakeSettings::builder().worker_id(0).build()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || {
                    (0..5_000)
                        .map(|_| gen.next_id().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(id >= 0);
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 20_000);
    }
}
