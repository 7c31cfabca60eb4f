use crate::event_log::XmlElement;

use log::{debug, warn};

pub const RECORD_STATUS_EVENT: &str = "RecordStatusEvent";
pub const PARTICIPANT_JOINED_EVENT: &str = "ParticipantJoinedEvent";
pub const CALLER_NAME_FIELD: &str = "callername";
pub const UNKNOWN_USER: &str = "Unknown user";

/// Finds every element below `root` whose `eventname` attribute equals `event_name`,
/// in document order.
pub fn find_events<'a>(root: &'a XmlElement, event_name: &str) -> Vec<&'a XmlElement> {
    let events: Vec<&XmlElement> = root
        .descendants()
        .filter(|element| element.event_name() == Some(event_name))
        .collect();

    debug!("Found {} `{}` events", events.len(), event_name);
    events
}

/// Resolves a display name for `user_id`.
///
/// The name is taken from the first `callername` of a `ParticipantJoinedEvent`, the log does not
/// reliably pair internal user ids with joins, so `user_id` is only used for diagnostics.
pub fn find_user_name(root: &XmlElement, user_id: Option<&str>) -> String {
    let caller_names: Vec<&str> = find_events(root, PARTICIPANT_JOINED_EVENT)
        .into_iter()
        .flat_map(|event| event.children_named(CALLER_NAME_FIELD))
        .map(|caller| caller.text().unwrap_or_default())
        .collect();

    let Some(first) = caller_names.first() else {
        return UNKNOWN_USER.to_owned();
    };

    if caller_names.iter().any(|name| name != first) {
        warn!(
            "Participants joined under different names, attributing user `{}` to the first one (`{}`)",
            user_id.unwrap_or_default(),
            first
        );
    }

    (*first).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::EventLog;
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    // Tests run on separate threads, each one only sees the warnings it logged itself.
    struct ThreadWarnings;

    impl Log for ThreadWarnings {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Warn
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: ThreadWarnings = ThreadWarnings;
    static LOGGER_INIT: Once = Once::new();

    fn warnings_logged_by(f: impl FnOnce()) -> Vec<String> {
        LOGGER_INIT.call_once(|| {
            log::set_logger(&LOGGER).expect("no other logger in unit tests");
            log::set_max_level(LevelFilter::Warn);
        });

        WARNINGS.with(|w| w.borrow_mut().clear());
        f();
        WARNINGS.with(|w| w.borrow_mut().drain(..).collect())
    }

    const EVENTS: &str = r#"
<recording id="meeting">
  <event timestamp="1" module="PARTICIPANT" eventname="ParticipantJoinedEvent">
    <userId>w_alice</userId>
    <callername>Alice</callername>
  </event>
  <event timestamp="2" module="PARTICIPANT" eventname="RecordStatusEvent">
    <userId>w_alice</userId>
    <status>true</status>
  </event>
  <event timestamp="3" module="PARTICIPANT" eventname="ParticipantJoinedEvent">
    <userId>w_bob</userId>
    <callername>Bob</callername>
  </event>
  <event timestamp="4" module="PARTICIPANT" eventname="RecordStatusEvent">
    <userId>w_alice</userId>
    <status>false</status>
  </event>
</recording>
"#;

    #[test]
    fn test_finds_events_in_document_order() {
        let log = EventLog::parse(EVENTS).unwrap();
        let timestamps: Vec<&str> = find_events(log.root(), RECORD_STATUS_EVENT)
            .into_iter()
            .filter_map(|e| e.attribute("timestamp"))
            .collect();

        assert_eq!(timestamps, vec!["2", "4"]);
    }

    #[test]
    fn test_finds_nested_events_but_not_root() {
        let log = EventLog::parse(
            r#"<wrapper eventname="RecordStatusEvent"><group><event eventname="RecordStatusEvent"/></group></wrapper>"#,
        )
        .unwrap();

        let events = find_events(log.root(), RECORD_STATUS_EVENT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "event");
    }

    #[test]
    fn test_user_name_is_first_caller_name() {
        let log = EventLog::parse(EVENTS).unwrap();
        assert_eq!(find_user_name(log.root(), Some("w_bob")), "Alice");
    }

    #[test]
    fn test_warns_when_caller_names_differ() {
        let log = EventLog::parse(EVENTS).unwrap();

        let warnings = warnings_logged_by(|| {
            assert_eq!(find_user_name(log.root(), Some("w_alice")), "Alice");
        });

        assert_eq!(warnings.len(), 1, "{:?}", warnings);
        assert!(warnings[0].contains("`w_alice`"), "{}", warnings[0]);
        assert!(warnings[0].contains("`Alice`"), "{}", warnings[0]);
    }

    #[test]
    fn test_no_warning_for_a_single_caller_name() {
        let log = EventLog::parse(
            r#"<recording>
                <event eventname="ParticipantJoinedEvent"><callername>Alice</callername></event>
                <event eventname="ParticipantJoinedEvent"><callername>Alice</callername></event>
            </recording>"#,
        )
        .unwrap();

        let warnings = warnings_logged_by(|| {
            assert_eq!(find_user_name(log.root(), Some("w_alice")), "Alice");
        });

        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_unknown_user_without_joins() {
        let log = EventLog::parse(
            r#"<recording><event eventname="RecordStatusEvent"><userId>w_x</userId></event></recording>"#,
        )
        .unwrap();

        assert_eq!(find_user_name(log.root(), Some("w_x")), UNKNOWN_USER);
    }

    #[test]
    fn test_skips_joins_without_caller_name() {
        let log = EventLog::parse(
            r#"<recording>
                <event eventname="ParticipantJoinedEvent"><userId>w_a</userId></event>
                <event eventname="ParticipantJoinedEvent"><callername>Carol</callername></event>
            </recording>"#,
        )
        .unwrap();

        assert_eq!(find_user_name(log.root(), None), "Carol");
    }
}
