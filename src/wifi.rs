use core::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use embassy_executor::Spawner;
use embassy_net::{Config, Ipv4Cidr, Runner, Stack, StackResources, StaticConfigV4};
use embassy_time::{Duration, Timer};
use esp_hal::peripherals::{RNG, SYSTIMER, WIFI};
use esp_hal::rng::Rng;
use esp_hal::timer::systimer::SystemTimer;
use esp_wifi::wifi::event::{self, EventExt};
use esp_wifi::wifi::{
    AccessPointConfiguration, AuthMethod, Configuration, WifiController, WifiDevice, WifiError,
    WifiEvent, WifiState,
};
use esp_wifi::{init, EspWifiController, InitializationError};
use esp_wifi_sys::include::{esp_wifi_ap_get_sta_list, wifi_sta_list_t};
use picoserve::make_static;
use smartlib::stations::{station_connected, station_disconnected, StationTracker};

/// Open network, no password
pub const AP_SSID: &str = "ESP8266-Open";
pub const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
const AP_PREFIX_LEN: u8 = 24;
const MAX_SOCKETS: usize = 16;
const DHCP_LEASES: usize = 16;

#[derive(Debug)]
pub enum WifiSetupError {
    /// The radio driver could not be initialized
    Init(InitializationError),
    /// The controller rejected the access point setup
    Wifi(WifiError),
}

impl From<InitializationError> for WifiSetupError {
    fn from(value: InitializationError) -> Self {
        Self::Init(value)
    }
}

impl From<WifiError> for WifiSetupError {
    fn from(value: WifiError) -> Self {
        Self::Wifi(value)
    }
}

pub async fn setup_wifi(
    systimer: SYSTIMER<'static>,
    rng: RNG<'static>,
    wifi: WIFI<'static>,
    stations: &'static StationTracker,
    spawner: Spawner,
) -> Result<Stack<'static>, WifiSetupError> {
    let timer = SystemTimer::new(systimer).alarm0;
    let mut rng = Rng::new(rng);
    let init: &'static EspWifiController<'static> =
        make_static!(EspWifiController<'static>, init(timer, rng)?);

    let (mut controller, wifi_interface) = esp_wifi::wifi::new(init, wifi)?;
    let ap_interface = wifi_interface.ap;

    let ap_config = Configuration::AccessPoint(AccessPointConfiguration {
        ssid: AP_SSID.into(),
        auth_method: AuthMethod::None,
        ..Default::default()
    });
    controller.set_configuration(&ap_config)?;
    register_station_events(stations);

    let config = Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(AP_ADDRESS, AP_PREFIX_LEN),
        gateway: Some(AP_ADDRESS),
        dns_servers: Default::default(),
    });
    // Init network stack
    let (stack, runner): (Stack<'static>, Runner<_>) = embassy_net::new(
        ap_interface,
        config,
        make_static!(
            StackResources<MAX_SOCKETS>,
            StackResources::<MAX_SOCKETS>::new()
        ),
        (rng.random() as u64) << 32 | rng.random() as u64,
    );
    spawner.must_spawn(access_point_task(controller));
    spawner.must_spawn(net_task(runner));

    log::info!("Waiting for access point...");
    loop {
        if stack.is_link_up() {
            break;
        }
        Timer::after(Duration::from_millis(500)).await;
    }
    log::info!("Access point {AP_SSID} up at {AP_ADDRESS}");

    spawner.must_spawn(dhcp_task(stack));

    Ok(stack)
}

/// Count stations as the driver reports them joining and leaving.
/// The handlers run in the driver's event context, not on the executor.
fn register_station_events(stations: &'static StationTracker) {
    event::ApStaconnected::update_handler(move |_| station_connected(stations));
    event::ApStadisconnected::update_handler(move |_| station_disconnected(stations));
}

/// Number of stations associated with the access point according to the driver,
/// or `None` while the access point is not running.
pub fn ap_station_count() -> Option<u8> {
    // Safety: `wifi_sta_list_t` is plain C data for which all zeroes is a valid value
    let mut list: wifi_sta_list_t = unsafe { core::mem::zeroed() };
    // Safety: the driver only writes into the list we hand it
    let result = unsafe { esp_wifi_ap_get_sta_list(&mut list) };
    if result != 0 {
        return None;
    }
    u8::try_from(list.num).ok()
}

/// Task that keeps the access point running
#[embassy_executor::task]
async fn access_point_task(mut controller: WifiController<'static>) {
    log::info!("Start access point task...");

    loop {
        if let WifiState::ApStarted = esp_wifi::wifi::wifi_state() {
            // wait until the access point goes down
            controller.wait_for_event(WifiEvent::ApStop).await;
            log::info!("Access point stopped, restarting in 5 seconds...");
            Timer::after(Duration::from_millis(5000)).await;
            if matches!(controller.is_started(), Ok(true)) {
                if let Err(e) = controller.stop_async().await {
                    log::warn!("Failed to stop wifi controller: {e:?}");
                }
            }
        }
        if !matches!(controller.is_started(), Ok(true)) {
            log::info!("Starting access point...");
            if let Err(e) = controller.start_async().await {
                log::warn!("Failed to start access point: {e:?}");
                Timer::after(Duration::from_millis(5000)).await;
            }
        } else {
            Timer::after(Duration::from_millis(500)).await;
        }
    }
}

/// Task that hands out addresses on the access point subnet
#[embassy_executor::task]
async fn dhcp_task(stack: Stack<'static>) {
    use edge_dhcp::io::{self, DEFAULT_SERVER_PORT};
    use edge_dhcp::server::{Server, ServerOptions};
    use edge_nal::UdpBind;
    use edge_nal_embassy::{Udp, UdpBuffers};

    let mut buf = [0u8; 1500];
    let mut gw_buf = [Ipv4Addr::UNSPECIFIED];

    let buffers = UdpBuffers::<2, 1024, 1024, 4>::new();
    let unbound_socket = Udp::new(stack, &buffers);
    let mut bound_socket = match unbound_socket
        .bind(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::UNSPECIFIED,
            DEFAULT_SERVER_PORT,
        )))
        .await
    {
        Ok(socket) => socket,
        Err(e) => {
            log::error!("Failed to bind DHCP socket: {e:?}");
            return;
        }
    };

    log::info!("Starting DHCP server");
    loop {
        if let Err(e) = io::server::run(
            &mut Server::<_, DHCP_LEASES>::new_with_et(AP_ADDRESS),
            &ServerOptions::new(AP_ADDRESS, Some(&mut gw_buf)),
            &mut bound_socket,
            &mut buf,
        )
        .await
        {
            log::warn!("DHCP server error: {e:?}");
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

/// Task that runs the network stack
#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
