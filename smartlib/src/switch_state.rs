use crate::value_synchronizer::ValueSynchronizer;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;

/// Only the pin task waits on the switches.
pub const SWITCH_WATCHERS: usize = 1;

pub type Switches = ValueSynchronizer<SWITCH_WATCHERS, NoopRawMutex, SwitchState>;

/// One of the two user controlled outputs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SwitchId {
    D2,
    D3,
}

impl SwitchId {
    pub const fn label(self) -> &'static str {
        match self {
            SwitchId::D2 => "D2",
            SwitchId::D3 => "D3",
        }
    }
}

/// Desired level of both outputs, `true` meaning high.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SwitchState {
    pub d2: bool,
    pub d3: bool,
}

impl SwitchState {
    pub const fn get(&self, id: SwitchId) -> bool {
        match id {
            SwitchId::D2 => self.d2,
            SwitchId::D3 => self.d3,
        }
    }

    pub fn set(&mut self, id: SwitchId, on: bool) {
        match id {
            SwitchId::D2 => self.d2 = on,
            SwitchId::D3 => self.d3 = on,
        }
    }
}

/// Sets a single switch and returns the state it ended up in.
pub fn set_switch(switches: &Switches, id: SwitchId, on: bool) -> bool {
    switches.update(|state| state.set(id, on));
    log::info!("{} set to {}", id.label(), if on { "on" } else { "off" });
    switches.read(|state| state.get(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::{block_on, poll_once};

    #[test]
    fn switches_are_independent() {
        let mut state = SwitchState::default();
        state.set(SwitchId::D3, true);

        assert!(state.get(SwitchId::D3));
        assert!(!state.get(SwitchId::D2));

        state.set(SwitchId::D2, true);
        state.set(SwitchId::D3, false);
        assert_eq!(state, SwitchState { d2: true, d3: false });
    }

    #[test]
    fn set_switch_notifies_pin_task() {
        let switches = Switches::new(SwitchState::default());
        let mut watcher = switches.watch();

        assert!(set_switch(&switches, SwitchId::D2, true));
        assert_eq!(block_on(watcher.read()), SwitchState { d2: true, d3: false });

        assert!(!set_switch(&switches, SwitchId::D2, false));
        assert_eq!(block_on(watcher.read()), SwitchState::default());
    }

    #[test]
    fn single_watcher_follows_both_switches() {
        let switches = Switches::new(SwitchState::default());
        let mut watcher = switches.watch();
        assert!(poll_once(watcher.read()).is_pending());

        set_switch(&switches, SwitchId::D3, true);
        assert_eq!(block_on(watcher.read()), SwitchState { d2: false, d3: true });
        assert!(poll_once(watcher.read()).is_pending());

        set_switch(&switches, SwitchId::D2, true);
        set_switch(&switches, SwitchId::D3, false);
        assert_eq!(block_on(watcher.read()), SwitchState { d2: true, d3: false });
    }
}
