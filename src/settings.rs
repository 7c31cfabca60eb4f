use std::path::{Path, PathBuf};

/// Where BigBlueButton keeps raw (unprocessed) recordings, one directory per meeting.
pub const DEFAULT_RECORDINGS_DIR: &str = "/var/bigbluebutton/recording/raw";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    recordings_dir: PathBuf,
    output_format: OutputFormat,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            recordings_dir: PathBuf::from(DEFAULT_RECORDINGS_DIR),
            output_format: OutputFormat::default(),
        }
    }
}

impl ReportSettings {
    pub fn new() -> Self {
        ReportSettings::default()
    }

    pub fn recordings_dir(mut self, recordings_dir: impl Into<PathBuf>) -> Self {
        self.recordings_dir = recordings_dir.into();
        self
    }

    pub fn output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn get_recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    pub fn get_output_format(&self) -> OutputFormat {
        self.output_format
    }
}
