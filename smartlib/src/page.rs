//! The control page is a static template with `{{slot}}` markers that are filled
//! from the current switch state while the response is being written, so the page
//! never has to be assembled in memory.

use crate::switch_state::{SwitchId, SwitchState};
use embedded_io_async::Write;
use picoserve::response::Content;

pub const INDEX_TEMPLATE: &str = include_str!("../resources/index.html");
pub const STYLESHEET: &str = include_str!("../resources/style.css");

const SLOT_OPEN: &str = "{{";
const SLOT_CLOSE: &str = "}}";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    Slot(&'a str),
}

/// Splits a template into literal text and slot names.
/// An unterminated `{{` is kept as literal text.
pub struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    pub const fn new(template: &'a str) -> Self {
        Self { rest: template }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let Some(open) = self.rest.find(SLOT_OPEN) else {
            let text = self.rest;
            self.rest = "";
            return Some(Segment::Text(text));
        };

        if open > 0 {
            let (text, rest) = self.rest.split_at(open);
            self.rest = rest;
            return Some(Segment::Text(text));
        }

        let inner = &self.rest[SLOT_OPEN.len()..];
        match inner.find(SLOT_CLOSE) {
            Some(close) => {
                self.rest = &inner[close + SLOT_CLOSE.len()..];
                Some(Segment::Slot(inner[..close].trim()))
            }
            None => {
                let text = self.rest;
                self.rest = "";
                Some(Segment::Text(text))
            }
        }
    }
}

/// The control page rendered for one switch state.
#[derive(Copy, Clone, Debug)]
pub struct ControlPage {
    state: SwitchState,
    ssid: &'static str,
}

impl ControlPage {
    pub const fn new(state: SwitchState, ssid: &'static str) -> Self {
        Self { state, ssid }
    }

    fn slot(&self, name: &str) -> &'static str {
        let (id, field) = match name.split_once('_') {
            Some(("d2", field)) => (SwitchId::D2, field),
            Some(("d3", field)) => (SwitchId::D3, field),
            _ if name == "ssid" => return self.ssid,
            _ => {
                log::warn!("Unknown template slot {name}");
                return "";
            }
        };
        let on = self.state.get(id);

        match (field, on) {
            ("icon", false) => "off",
            ("icon", true) => match id {
                SwitchId::D2 => "on-blue",
                SwitchId::D3 => "on-yellow",
            },
            ("badge", true) => "status-on",
            ("badge", false) => "status-off",
            ("label", true) => "ON",
            ("label", false) => "OFF",
            ("checked", true) => "checked",
            ("checked", false) => "",
            _ => {
                log::warn!("Unknown template slot {name}");
                ""
            }
        }
    }

    /// The page as a sequence of string pieces, in order.
    pub fn pieces(&self) -> impl Iterator<Item = &str> + '_ {
        self.fill(INDEX_TEMPLATE)
    }

    /// Fills the slots of `template`; unknown slots render empty.
    pub fn fill<'t>(&'t self, template: &'t str) -> impl Iterator<Item = &'t str> + 't {
        Segments::new(template).map(|segment| match segment {
            Segment::Text(text) => text,
            Segment::Slot(name) => self.slot(name),
        })
    }
}

impl Content for ControlPage {
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    fn content_length(&self) -> usize {
        self.pieces().map(str::len).sum()
    }

    async fn write_content<W: Write>(self, mut writer: W) -> Result<(), W::Error> {
        for piece in self.pieces() {
            writer.write_all(piece.as_bytes()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embedded_io_async::ErrorType;

    struct Sink(Vec<u8>);

    impl ErrorType for Sink {
        type Error = Infallible;
    }

    impl Write for Sink {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    fn render(page: ControlPage) -> String {
        let mut sink = Sink(Vec::new());
        block_on(page.write_content(&mut sink)).unwrap();
        String::from_utf8(sink.0).unwrap()
    }

    #[test]
    fn segments_split_text_and_slots() {
        let segments: Vec<_> = Segments::new("a{{ x }}b{{y}}").collect();
        assert_eq!(
            segments,
            [
                Segment::Text("a"),
                Segment::Slot("x"),
                Segment::Text("b"),
                Segment::Slot("y"),
            ]
        );
    }

    #[test]
    fn unterminated_slot_is_text() {
        let segments: Vec<_> = Segments::new("a{{b").collect();
        assert_eq!(segments, [Segment::Text("a"), Segment::Text("{{b")]);
    }

    #[test]
    fn template_has_no_unknown_slots() {
        let page = ControlPage::new(SwitchState::default(), "ssid");
        for segment in Segments::new(INDEX_TEMPLATE) {
            if let Segment::Slot(name) = segment {
                let on = ControlPage::new(SwitchState { d2: true, d3: true }, "ssid");
                assert!(
                    !page.slot(name).is_empty() || !on.slot(name).is_empty(),
                    "slot {name} never renders"
                );
            }
        }
    }

    #[test]
    fn renders_current_state() {
        let html = render(ControlPage::new(
            SwitchState { d2: true, d3: false },
            "ESP8266-Open",
        ));

        assert!(html.contains("led-icon on-blue' id='led2'"));
        assert!(html.contains("status-badge status-on' id='status'>ON<"));
        assert!(html.contains("led-icon off' id='led3'"));
        assert!(html.contains("status-badge status-off' id='statusD3'>OFF<"));
        assert!(html.contains("id='toggle' checked"));
        assert!(!html.contains("id='toggleD3' checked"));
        assert!(html.contains("ESP8266-Open"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn unknown_slot_renders_empty() {
        let page = ControlPage::new(SwitchState { d2: true, d3: true }, "x");
        let filled: String = page.fill("a{{bogus}}b{{ d2_nope }}c{{d4_icon}}").collect();
        assert_eq!(filled, "abc");

        let filled: String = page.fill("{{d2_label}}{{bogus}}{{ssid}}").collect();
        assert_eq!(filled, "ONx");
    }

    #[test]
    fn d3_uses_yellow_icon() {
        let html = render(ControlPage::new(SwitchState { d2: false, d3: true }, "x"));
        assert!(html.contains("led-icon on-yellow' id='led3'"));
        assert!(html.contains("led-icon off' id='led2'"));
    }

    #[test]
    fn content_length_matches_rendered_page() {
        for state in [
            SwitchState::default(),
            SwitchState { d2: true, d3: true },
        ] {
            let page = ControlPage::new(state, "ESP8266-Open");
            assert_eq!(page.content_length(), render(page).len());
        }
    }
}
