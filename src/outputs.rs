use crate::wifi::ap_station_count;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};
use esp_hal::gpio::{Level, Output};
use smartlib::stations::{resync_stations, StationTracker};
use smartlib::switch_state::{SwitchState, Switches};

/// How often the tracked station count is checked against the driver
const RESYNC_PERIOD: Duration = Duration::from_secs(1);

pub fn setup_outputs(
    switches: &'static Switches,
    stations: &'static StationTracker,
    d2: Output<'static>,
    d3: Output<'static>,
    presence: Output<'static>,
    spawner: Spawner,
) {
    spawner.must_spawn(switch_task(switches, d2, d3));
    spawner.must_spawn(presence_task(stations, presence));
}

fn apply_switches(state: SwitchState, d2: &mut Output<'static>, d3: &mut Output<'static>) {
    d2.set_level(Level::from(state.d2));
    d3.set_level(Level::from(state.d3));
}

/// Task that mirrors the switch state onto the D2 and D3 pins
#[embassy_executor::task]
async fn switch_task(
    switches: &'static Switches,
    mut d2: Output<'static>,
    mut d3: Output<'static>,
) -> ! {
    let mut watcher = switches.watch();
    apply_switches(switches.read_clone(), &mut d2, &mut d3);

    loop {
        let state = watcher.read().await;
        apply_switches(state, &mut d2, &mut d3);
    }
}

/// Task that drives the presence pin high while any station is associated.
/// Events can get lost, so the count is also resynced with the driver periodically.
#[embassy_executor::task]
async fn presence_task(stations: &'static StationTracker, mut presence: Output<'static>) -> ! {
    let mut watcher = stations.watch();
    if let Some(count) = ap_station_count() {
        resync_stations(stations, count);
    }
    watcher.skip();

    let count = stations.read_clone();
    presence.set_level(Level::from(count.presence()));
    log::info!("{} station(s) associated", count.get());

    let mut ticker = Ticker::every(RESYNC_PERIOD);
    loop {
        match select(watcher.read(), ticker.next()).await {
            Either::First(count) => {
                presence.set_level(Level::from(count.presence()));
                log::info!("{} station(s) associated", count.get());
            }
            Either::Second(()) => {
                let Some(count) = ap_station_count() else {
                    continue;
                };
                if resync_stations(stations, count) {
                    log::warn!("Station count was off, resynced to {count}");
                }
            }
        }
    }
}
