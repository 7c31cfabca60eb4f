//! Locates recording start/stop marks (`RecordStatusEvent`) in the `events.xml` log that
//! BigBlueButton writes for every recorded meeting, and renders them as a report together with
//! a template for adding marks by hand.
//!
//! ```no_run
//! use bbb_record_events::{EventLog, OutputFormat, RecordingReport};
//!
//! let log = EventLog::from_path("events.xml").unwrap();
//! let report = RecordingReport::new("events.xml", &log);
//!
//! report.write(&mut std::io::stdout(), OutputFormat::Text).unwrap();
//! ```
pub mod err;
pub mod event_log;
pub mod report;
pub mod search;
pub mod settings;
pub mod source;

pub use event_log::{EventLog, XmlAttribute, XmlElement};
pub use report::{EditTemplate, RecordingReport, ReportField, ReportedEvent};
pub use search::{find_events, find_user_name};
pub use settings::{OutputFormat, ReportSettings};
pub use source::EventsSource;
