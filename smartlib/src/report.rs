use embedded_io_async::Write;
use picoserve::response::Content;

/// Responses of the switch API must never be served from a cache.
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate, max-age=0";

const ON_BODY: &str = "{\"on\":true}";
const OFF_BODY: &str = "{\"on\":false}";

/// `{"on":<bool>}` body reporting the level of one switch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SwitchReport {
    pub on: bool,
}

impl SwitchReport {
    pub const fn new(on: bool) -> Self {
        Self { on }
    }

    pub const fn body(self) -> &'static str {
        if self.on {
            ON_BODY
        } else {
            OFF_BODY
        }
    }
}

impl Content for SwitchReport {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn content_length(&self) -> usize {
        self.body().len()
    }

    async fn write_content<W: Write>(self, mut writer: W) -> Result<(), W::Error> {
        writer.write_all(self.body().as_bytes()).await
    }
}
