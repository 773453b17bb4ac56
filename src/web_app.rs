use crate::http::{MAX_CONNECTIONS, PORT};
use crate::rotating_logger::RingBufferLogger;
use crate::wifi::AP_SSID;
use embassy_net::Stack;
use embassy_time::Duration;
use embedded_io_async::Read;
use picoserve::request::Request;
use picoserve::response::{IntoResponse, Response, ResponseWriter, StatusCode};
use picoserve::routing::{get, get_service, PathRouter, RequestHandlerService};
use picoserve::{listen_and_serve, response, Config, ResponseSent, Router};
use smartlib::api::{report_state, set_from_query};
use smartlib::page::{ControlPage, STYLESHEET};
use smartlib::report::{SwitchReport, NO_STORE};
use smartlib::switch_state::{SwitchId, Switches};

pub type AppRouter = impl PathRouter;

#[define_opaque(AppRouter)]
pub fn make_app(
    switches: &'static Switches,
    logger: &'static RingBufferLogger,
) -> Router<AppRouter> {
    picoserve::Router::new()
        .route(
            "/",
            get(move || async move {
                Response::new(StatusCode::OK, ControlPage::new(switches.read_clone(), AP_SSID))
            }),
        )
        .route("/style.css", get_service(response::File::css(STYLESHEET)))
        .route(
            "/api/set",
            get_service(SetSwitchHandler { switches, id: SwitchId::D2 }),
        )
        .route(
            "/api/state",
            get(move || async move { switch_response(report_state(switches, SwitchId::D2)) }),
        )
        .route(
            "/api/setD3",
            get_service(SetSwitchHandler { switches, id: SwitchId::D3 }),
        )
        .route(
            "/api/stateD3",
            get(move || async move { switch_response(report_state(switches, SwitchId::D3)) }),
        )
        .route("/logs", get_service(LogHandler { logger }))
}

fn switch_response(report: SwitchReport) -> impl IntoResponse {
    Response::new(StatusCode::OK, report).with_header("Cache-Control", NO_STORE)
}

struct SetSwitchHandler {
    switches: &'static Switches,
    id: SwitchId,
}

impl RequestHandlerService<()> for SetSwitchHandler {
    async fn call_request_handler_service<R: Read, W: ResponseWriter<Error = R::Error>>(
        &self,
        _state: &(),
        _path_parameters: (),
        request: Request<'_, R>,
        response_writer: W,
    ) -> Result<ResponseSent, W::Error> {
        let query = request.parts.query().map_or("", |query| query.0);
        let result = set_from_query(self.switches, self.id, query);
        let connection = request.body_connection.finalize().await?;

        match result {
            Ok(report) => {
                switch_response(report)
                    .write_to(connection, response_writer)
                    .await
            }
            Err(e) => {
                log::info!("Rejected {} request: {e}", self.id.label());
                Response::new(StatusCode::BAD_REQUEST, e.message())
                    .write_to(connection, response_writer)
                    .await
            }
        }
    }
}

struct LogHandler {
    logger: &'static RingBufferLogger,
}

impl RequestHandlerService<()> for LogHandler {
    async fn call_request_handler_service<R: Read, W: ResponseWriter<Error = R::Error>>(
        &self,
        _state: &(),
        _path_parameters: (),
        request: Request<'_, R>,
        response_writer: W,
    ) -> Result<ResponseSent, W::Error> {
        let logs = self.logger.get_logs();
        let logs = match core::str::from_utf8(logs.as_slice()) {
            Ok(logs) => logs,
            Err(e) => core::str::from_utf8(&logs[..e.valid_up_to()]).unwrap_or_default(),
        };

        logs.write_to(request.body_connection.finalize().await?, response_writer)
            .await
    }
}

#[embassy_executor::task(pool_size = MAX_CONNECTIONS)]
pub async fn web_task(
    id: usize,
    stack: Stack<'static>,
    app: &'static Router<AppRouter>,
    config: &'static Config<Duration>,
) -> ! {
    let mut tcp_rx_buffer = [0; 1024];
    let mut tcp_tx_buffer = [0; 1024];
    let mut http_buffer = [0; 2048];

    listen_and_serve(
        id,
        app,
        config,
        stack,
        PORT,
        &mut tcp_rx_buffer,
        &mut tcp_tx_buffer,
        &mut http_buffer,
    )
    .await
}
