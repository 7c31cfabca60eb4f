use crate::err::Result;
use crate::event_log::{EventLog, XmlElement};
use crate::search::{RECORD_STATUS_EVENT, find_events, find_user_name};
use crate::settings::OutputFormat;

use quick_xml::escape::escape;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "####################";

pub const NOT_STARTED_MESSAGE: &str = "Record was not started";

/// Human readable label for the text of a `<status>` field.
pub fn status_label(status: Option<&str>) -> &'static str {
    match status {
        Some("true") => "Started",
        _ => "Stopped",
    }
}

/// A child of a reported event, `annotation` holds the resolved user name or status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportField {
    pub tag: String,
    pub text: Option<String>,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedEvent {
    pub index: usize,
    #[serde(serialize_with = "serialize_attributes")]
    pub attributes: Vec<(String, String)>,
    pub fields: Vec<ReportField>,
}

fn serialize_attributes<S: Serializer>(
    attributes: &[(String, String)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(attributes.iter().map(|(name, value)| (name, value)))
}

impl ReportedEvent {
    fn from_element(index: usize, event: &XmlElement, root: &XmlElement) -> Self {
        let attributes = event
            .attributes
            .iter()
            .map(|attr| (attr.name.clone(), attr.value.clone()))
            .collect();

        let fields = event
            .children
            .iter()
            .map(|child| {
                let annotation = match child.name.as_str() {
                    "userId" => Some(find_user_name(root, child.text())),
                    "status" => Some(status_label(child.text()).to_owned()),
                    _ => None,
                };

                ReportField {
                    tag: child.name.clone(),
                    text: child.text().map(str::to_owned),
                    annotation,
                }
            })
            .collect();

        ReportedEvent {
            index,
            attributes,
            fields,
        }
    }
}

/// Block of XML that can be pasted into `events.xml` to add a recording mark by hand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditTemplate {
    pub timestamp: String,
    pub user_id: String,
    /// `true` starts the recording, `false` stops it.
    pub status: bool,
}

impl EditTemplate {
    pub fn new(timestamp: impl Into<String>, user_id: impl Into<String>, status: bool) -> Self {
        EditTemplate {
            timestamp: timestamp.into(),
            user_id: user_id.into(),
            status,
        }
    }
}

impl fmt::Display for EditTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f, "# To start/stop recording use the templated below")?;
        writeln!(f, "# Do not forget to set the correct timestamp,")?;
        writeln!(f, "# userId (e.g. w_jkbe7vlnnwgc)")?;
        writeln!(f, "# and status (true for start; false for stop)")?;
        writeln!(
            f,
            "  <event timestamp=\"{}\" module=\"PARTICIPANT\" eventname=\"{}\">",
            escape(self.timestamp.as_str()),
            RECORD_STATUS_EVENT
        )?;
        writeln!(f, "    <userId>{}</userId>", escape(self.user_id.as_str()))?;
        writeln!(f, "    <status>{}</status>", self.status)?;
        write!(f, "  </event>")
    }
}

#[derive(Debug, Clone)]
pub struct RecordingReport {
    file: PathBuf,
    events: Vec<ReportedEvent>,
    template: EditTemplate,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: String,
    recording_started: bool,
    events: &'a [ReportedEvent],
    template: String,
}

impl RecordingReport {
    pub fn new(file: impl Into<PathBuf>, log: &EventLog) -> Self {
        let root = log.root();
        let events = find_events(root, RECORD_STATUS_EVENT)
            .into_iter()
            .enumerate()
            .map(|(index, event)| ReportedEvent::from_element(index, event, root))
            .collect();

        RecordingReport {
            file: file.into(),
            events,
            template: EditTemplate::default(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn events(&self) -> &[ReportedEvent] {
        &self.events
    }

    pub fn recording_started(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn write(&self, output: &mut dyn Write, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => self.write_text(output)?,
            OutputFormat::Json => self.write_json(output)?,
        }
        Ok(())
    }

    pub fn write_text(&self, output: &mut dyn Write) -> io::Result<()> {
        writeln!(output, "Opening file: ")?;
        writeln!(output, "{}", self.file.display())?;

        if self.events.is_empty() {
            writeln!(output, "{}", NOT_STARTED_MESSAGE)?;
        }

        for event in &self.events {
            writeln!(output, "{}", SEPARATOR)?;
            writeln!(output, "Event {}", event.index)?;

            for (name, value) in &event.attributes {
                writeln!(output, "{} {}", name, value)?;
            }

            for field in &event.fields {
                let mut line = field.tag.clone();
                for part in [&field.text, &field.annotation].into_iter().flatten() {
                    line.push(' ');
                    line.push_str(part);
                }
                writeln!(output, "{}", line)?;
            }
        }

        writeln!(output, "{}", self.template)
    }

    pub fn write_json(&self, output: &mut dyn Write) -> Result<()> {
        let report = JsonReport {
            file: self.file.display().to_string(),
            recording_started: self.recording_started(),
            events: &self.events,
            template: self.template.to_string(),
        };

        serde_json::to_writer_pretty(&mut *output, &report)?;
        writeln!(output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render_text(xml: &str) -> String {
        let log = EventLog::parse(xml).unwrap();
        let mut out = vec![];
        RecordingReport::new("events.xml", &log)
            .write_text(&mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(Some("true")), "Started");
        assert_eq!(status_label(Some("false")), "Stopped");
        assert_eq!(status_label(Some("TRUE")), "Stopped");
        assert_eq!(status_label(None), "Stopped");
    }

    #[test]
    fn test_text_report_for_started_recording() {
        let out = render_text(
            r#"<recording>
  <event timestamp="5" module="PARTICIPANT" eventname="ParticipantJoinedEvent">
    <userId>w_alice</userId>
    <callername>Alice</callername>
  </event>
  <event timestamp="9" module="PARTICIPANT" eventname="RecordStatusEvent">
    <userId>w_alice</userId>
    <status>true</status>
  </event>
</recording>"#,
        );

        let expected = "Opening file: \nevents.xml\n\
####################
Event 0
timestamp 9
module PARTICIPANT
eventname RecordStatusEvent
userId w_alice Alice
status true Started
####################
# To start/stop recording use the templated below
# Do not forget to set the correct timestamp,
# userId (e.g. w_jkbe7vlnnwgc)
# and status (true for start; false for stop)
  <event timestamp=\"\" module=\"PARTICIPANT\" eventname=\"RecordStatusEvent\">
    <userId></userId>
    <status>false</status>
  </event>
";

        assert_eq!(out, expected);
    }

    #[test]
    fn test_text_report_without_record_events() {
        let out = render_text(r#"<recording><event eventname="ParticipantJoinedEvent"/></recording>"#);

        assert!(out.contains(NOT_STARTED_MESSAGE));
        assert!(!out.contains("Event 0"));
        assert!(out.contains("<status>false</status>"));
    }

    #[test]
    fn test_fields_without_text() {
        let out = render_text(
            r#"<recording><event eventname="RecordStatusEvent"><status/><userId/><note>x</note></event></recording>"#,
        );

        assert!(out.contains("\nstatus Stopped\n"), "{}", out);
        assert!(out.contains("\nuserId Unknown user\n"), "{}", out);
        assert!(out.contains("\nnote x\n"), "{}", out);
    }

    #[test]
    fn test_template_escapes_values() {
        let template = EditTemplate::new("1590000000", "w_<x>", true).to_string();

        assert!(template.contains(r#"<event timestamp="1590000000" module="PARTICIPANT""#));
        assert!(template.contains("<userId>w_&lt;x&gt;</userId>"));
        assert!(template.contains("<status>true</status>"));
        assert!(template.ends_with("</event>"));
    }

    #[test]
    fn test_json_report() {
        let log = EventLog::parse(
            r#"<recording><event timestamp="7" eventname="RecordStatusEvent"><status>false</status></event></recording>"#,
        )
        .unwrap();
        let mut out = vec![];
        RecordingReport::new("events.xml", &log)
            .write_json(&mut out)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["file"], "events.xml");
        assert_eq!(value["recording_started"], true);
        assert_eq!(value["events"][0]["index"], 0);
        assert_eq!(value["events"][0]["attributes"]["timestamp"], "7");
        assert_eq!(value["events"][0]["fields"][0]["tag"], "status");
        assert_eq!(value["events"][0]["fields"][0]["text"], "false");
        assert_eq!(value["events"][0]["fields"][0]["annotation"], "Stopped");
        assert!(value["template"].as_str().unwrap().contains("RecordStatusEvent"));
    }
}
