use crate::query::{parse_on, QueryError};
use crate::report::SwitchReport;
use crate::switch_state::{set_switch, SwitchId, Switches};

/// `/api/set` and `/api/setD3`: applies the `on` parameter of `query` to one switch.
/// A request without `on` leaves the switches untouched.
pub fn set_from_query(
    switches: &Switches,
    id: SwitchId,
    query: &str,
) -> Result<SwitchReport, QueryError> {
    let on = parse_on(query)?;
    Ok(SwitchReport::new(set_switch(switches, id, on)))
}

/// `/api/state` and `/api/stateD3`
pub fn report_state(switches: &Switches, id: SwitchId) -> SwitchReport {
    SwitchReport::new(switches.read(|state| state.get(id)))
}
