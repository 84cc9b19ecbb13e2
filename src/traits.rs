use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

/// Monotonic time and blocking sleep used by every bounded wait.
pub trait Clock {
    fn now(&mut self) -> Instant;

    fn delay(&mut self, duration: Duration);

    /// Cooperative yield hook, called while waiting on a silent transport.
    ///
    /// Implementations may run other ready work, but must never re-enter the
    /// client that is waiting.
    fn idle(&mut self) {}
}

/// [`Clock`] backed by the embassy time driver and a blocking delay provider.
pub struct EmbassyClock<D> {
    delay: D,
}

impl<D: DelayNs> EmbassyClock<D> {
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> Clock for EmbassyClock<D> {
    fn now(&mut self) -> Instant {
        Instant::now()
    }

    fn delay(&mut self, duration: Duration) {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.delay.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingDelay(std::vec::Vec<u32>);

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    #[test]
    fn long_delays_saturate() {
        let mut clock = EmbassyClock::new(RecordingDelay(std::vec::Vec::new()));
        clock.delay(Duration::from_millis(1500));
        clock.delay(Duration::from_secs(u64::from(u32::MAX) + 1));

        assert_eq!(clock.release().0, [1500, u32::MAX]);
    }
}
