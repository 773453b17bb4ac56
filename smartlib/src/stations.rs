use crate::value_synchronizer::ValueSynchronizer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Only the presence task waits on the station count.
pub const STATION_WATCHERS: usize = 1;

/// Station count shared between the WiFi event handlers and the presence task.
/// Event handlers run outside the executor, hence the critical section mutex.
pub type StationTracker = ValueSynchronizer<STATION_WATCHERS, CriticalSectionRawMutex, StationCount>;

/// Number of WiFi stations currently associated with the access point.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StationCount(u8);

impl StationCount {
    pub const fn new(count: u8) -> Self {
        Self(count)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Level of the presence pin: high while anyone is associated.
    pub const fn presence(self) -> bool {
        self.0 > 0
    }

    pub fn connected(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn disconnected(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    /// Replace the tracked count with the one reported by the driver.
    /// Returns whether the count changed.
    pub fn resync(&mut self, authoritative: u8) -> bool {
        let changed = self.0 != authoritative;
        self.0 = authoritative;
        changed
    }
}

pub fn station_connected(tracker: &StationTracker) {
    tracker.update(StationCount::connected);
}

pub fn station_disconnected(tracker: &StationTracker) {
    tracker.update(StationCount::disconnected);
}

/// Returns whether the tracked count was off.
pub fn resync_stations(tracker: &StationTracker, authoritative: u8) -> bool {
    tracker.update_if(|count| count.resync(authoritative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::{block_on, poll_once};

    #[test]
    fn presence_follows_count() {
        let mut count = StationCount::default();
        assert!(!count.presence());

        count.connected();
        count.connected();
        assert!(count.presence());

        count.disconnected();
        assert!(count.presence());
        count.disconnected();
        assert!(!count.presence());
    }

    #[test]
    fn disconnect_at_zero_stays_zero() {
        let mut count = StationCount::default();
        count.disconnected();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn connect_saturates() {
        let mut count = StationCount::new(u8::MAX);
        count.connected();
        assert_eq!(count.get(), u8::MAX);
    }

    #[test]
    fn resync_reports_change() {
        let mut count = StationCount::new(2);
        assert!(!count.resync(2));
        assert!(count.resync(0));
        assert!(!count.presence());
    }

    #[test]
    fn missed_disconnect_is_corrected_by_resync() {
        let tracker = StationTracker::new(StationCount::default());
        let mut watcher = tracker.watch();

        station_connected(&tracker);
        assert!(block_on(watcher.read()).presence());

        // The disconnect event never arrived, the driver says nobody is left.
        assert!(resync_stations(&tracker, 0));
        assert!(!block_on(watcher.read()).presence());
    }

    #[test]
    fn matching_resync_does_not_wake_presence_task() {
        let tracker = StationTracker::new(StationCount::default());
        station_connected(&tracker);
        let mut watcher = tracker.watch();

        assert!(!resync_stations(&tracker, 1));
        assert!(poll_once(watcher.read()).is_pending());
    }

    #[test]
    fn disconnect_event_notifies_even_at_zero() {
        let tracker = StationTracker::new(StationCount::default());
        let mut watcher = tracker.watch();

        station_disconnected(&tracker);
        assert_eq!(block_on(watcher.read()).get(), 0);
    }
}
