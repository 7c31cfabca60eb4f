use crate::err::{Error, Result};

use log::info;
use std::path::{Path, PathBuf};

const EVENTS_FILE_NAME: &str = "events.xml";

/// Where the events of a meeting are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventsSource {
    /// An explicitly given `events.xml`.
    File(PathBuf),
    /// The raw recording of a meeting, located by its id under the recordings directory.
    Meeting { uuid: String, path: PathBuf },
}

impl EventsSource {
    /// An explicit file takes precedence over a meeting id.
    pub fn resolve(
        file: Option<&Path>,
        uuid: Option<&str>,
        recordings_dir: &Path,
    ) -> Result<Self> {
        match (file, uuid) {
            (Some(file), uuid) => {
                if let Some(uuid) = uuid {
                    info!(
                        "Both a file and meeting `{}` were given, using {}",
                        uuid,
                        file.display()
                    );
                }
                Ok(EventsSource::File(file.to_path_buf()))
            }
            (None, Some(uuid)) => Ok(EventsSource::Meeting {
                uuid: uuid.to_owned(),
                path: recordings_dir.join(uuid).join(EVENTS_FILE_NAME),
            }),
            (None, None) => Err(Error::NoInputSpecified),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            EventsSource::File(path) => path,
            EventsSource::Meeting { path, .. } => path,
        }
    }
}
