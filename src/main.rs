#![no_std]
#![no_main]
#![feature(type_alias_impl_trait)]
#![feature(impl_trait_in_assoc_type)]

mod http;
mod outputs;
mod rotating_logger;
mod web_app;
mod wifi;

use crate::http::setup_http_server;
use crate::outputs::setup_outputs;
use crate::rotating_logger::RingBufferLogger;
use crate::web_app::{make_app, web_task, AppRouter};
use crate::wifi::setup_wifi;
use build_time::build_time_local;
use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::Level::Low;
use esp_hal::gpio::{Output, OutputConfig};
use esp_hal::timer::timg::TimerGroup;
use esp_hal::Config;
use esp_hal_embassy::main;
use picoserve::{make_static, Router};
use smartlib::stations::{StationCount, StationTracker};
use smartlib::switch_state::{SwitchState, Switches};

esp_bootloader_esp_idf::esp_app_desc!();

#[main]
async fn main(spawner: Spawner) {
    // Logging init
    let logger = RingBufferLogger::init();

    // Hardware init
    log::info!(
        "Starting initialization with build time {}...",
        build_time_local!("%Y-%m-%dT%H:%M:%S%.f%:z")
    );
    let peripherals = esp_hal::init(Config::default().with_cpu_clock(CpuClock::max()));
    esp_alloc::heap_allocator!(size: 72 * 1024);

    // Setup GPIO pins, everything starts low
    let output_config = OutputConfig::default();
    let presence = Output::new(peripherals.GPIO5, Low, output_config);
    let d2 = Output::new(peripherals.GPIO4, Low, output_config);
    let d3 = Output::new(peripherals.GPIO0, Low, output_config);

    // Setup embassy
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timg0.timer0);

    // Setup app
    let switches = make_static!(Switches, Switches::new(SwitchState::default()));
    let stations = make_static!(StationTracker, StationTracker::new(StationCount::default()));
    setup_outputs(switches, stations, d2, d3, presence, spawner);

    // Setup http
    let app = make_static!(Router<AppRouter>, make_app(switches, logger));
    let stack = setup_wifi(
        peripherals.SYSTIMER,
        peripherals.RNG,
        peripherals.WIFI,
        stations,
        spawner,
    )
    .await
    .unwrap();

    setup_http_server(stack, spawner, app, web_task);

    log::info!("Running...")
}
