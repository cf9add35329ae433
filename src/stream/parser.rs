//! Marker extraction from alert stream lines
//!
//! Cameras push XML fragments a line at a time, so a line holds at most a
//! few markers and an event's fields arrive spread over several lines. The
//! patterns deliberately start after the opening `<`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::event::Event;

static EVENT_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new("eventType>(.*)</eventType").unwrap());
static EVENT_STATE: Lazy<Regex> = Lazy::new(|| Regex::new("eventState>(.*)</eventState").unwrap());
static ACTIVE_POST_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new("activePostCount>(.*)</activePostCount").unwrap());

fn capture<'a>(pattern: &Regex, line: &'a str) -> Option<&'a str> {
    pattern.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Strip trailing line terminators
pub fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Copy any markers found in `line` into `event`
///
/// Returns true if at least one field was updated. The post count is stored
/// as the parsed value plus one; a count that does not parse counts as zero.
pub fn apply_line(event: &mut Event, line: &str) -> bool {
    let line = trim_line(line);
    let mut matched = false;

    if let Some(event_type) = capture(&EVENT_TYPE, line) {
        event.event_type = event_type.to_string();
        matched = true;
    }
    if let Some(state) = capture(&EVENT_STATE, line) {
        event.state = state.to_string();
        matched = true;
    }
    if let Some(count) = capture(&ACTIVE_POST_COUNT, line) {
        let parsed: i64 = count.parse().unwrap_or(0);
        event.active_count = parsed.saturating_add(1);
        matched = true;
    }

    matched
}
