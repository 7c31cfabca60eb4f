use anyhow::{Context, Result, bail, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;
use log::{Level, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use bbb_record_events::settings::DEFAULT_RECORDINGS_DIR;
use bbb_record_events::{EventLog, EventsSource, OutputFormat, RecordingReport, ReportSettings};

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

struct RecordEventsDump {
    settings: ReportSettings,
    file: Option<PathBuf>,
    uuid: Option<String>,
    output_target: Option<PathBuf>,
    confirm_overwrite: bool,
    verbosity_level: Option<Level>,
}

impl RecordEventsDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Self {
        let output_format = match matches
            .get_one::<String>("output-format")
            .map(String::as_str)
        {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        };

        // `--recordings-dir` has a default value, so it is always present.
        let recordings_dir = matches
            .get_one::<PathBuf>("recordings-dir")
            .cloned()
            .unwrap_or_default();

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(Level::Info),
            2 => Some(Level::Debug),
            3 => Some(Level::Trace),
            _ => {
                eprintln!("using more than  -vvv does not affect verbosity level");
                Some(Level::Trace)
            }
        };

        RecordEventsDump {
            settings: ReportSettings::new()
                .recordings_dir(recordings_dir)
                .output_format(output_format),
            file: matches.get_one::<PathBuf>("file").cloned(),
            uuid: matches.get_one::<String>("uuid").cloned(),
            output_target: matches.get_one::<PathBuf>("output-target").cloned(),
            confirm_overwrite: !matches.get_flag("no-confirm-overwrite"),
            verbosity_level,
        }
    }

    /// Main entry point for `RecordEventsDump`
    pub fn run(&self) -> Result<()> {
        self.try_to_initialize_logging();

        let source = EventsSource::resolve(
            self.file.as_deref(),
            self.uuid.as_deref(),
            self.settings.get_recordings_dir(),
        )?;
        info!("Opening file {}", source.path().display());

        let log = EventLog::from_path(source.path())
            .with_context(|| format!("Failed to load events from {}", source.path().display()))?;

        let report = RecordingReport::new(source.path(), &log);
        if !report.recording_started() {
            info!("No `RecordStatusEvent` found in {}", source.path().display());
        }

        let mut output: Box<dyn Write> = match &self.output_target {
            Some(path) => Box::new(
                Self::create_output_file(path, self.confirm_overwrite).with_context(|| {
                    format!(
                        "An error occurred while creating output file at `{}`",
                        path.display()
                    )
                })?,
            ),
            None => Box::new(io::stdout()),
        };

        report.write(&mut *output, self.settings.get_output_format())?;
        output.flush()?;

        Ok(())
    }

    /// If `prompt` is passed, will display a confirmation prompt before overwriting files.
    fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
        let p = path.as_ref();

        if p.is_dir() {
            bail!(
                "There is a directory at {}, refusing to overwrite",
                p.display()
            );
        }

        if p.exists() {
            if prompt {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to override output file at {}",
                        p.display()
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| {
                        format_err!("Failed to write confirmation prompt to term caused by\n{}", e)
                    })?;

                if !confirmed {
                    bail!("Cancelled");
                }
            }
            return Ok(File::create(p)?);
        }

        // Ok to assume p is not an existing directory
        match p.parent() {
            Some(parent) => {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
                Ok(File::create(p)?)
            }
            None => bail!("Output file cannot be root."),
        }
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level.to_level_filter(),
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {}", e);
            }
        }
    }
}

fn cli() -> Command {
    Command::new("BBB record events")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Search for recording start/stop events in a BigBlueButton events.xml")
        .long_about(indoc!(r#"
            Search for recording start/stop events in a BigBlueButton events.xml.

            Every `RecordStatusEvent` is printed with its attributes and fields, followed by a
            template that can be pasted into events.xml to add a missing start/stop mark before
            the recording is processed again.
        "#))
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("EVENTS.XML")
                .value_parser(clap::value_parser!(PathBuf))
                .help("events.xml file"),
        )
        .arg(
            Arg::new("uuid")
                .short('u')
                .long("uuid")
                .value_name("UUID")
                .help("UUID of the meeting. You can use either file name or uuid. File name overrides uuid."),
        )
        .arg(
            Arg::new("recordings-dir")
                .long("recordings-dir")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_RECORDINGS_DIR)
                .help("Directory holding raw recordings, used to locate the events.xml of a UUID."),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Sets the output format")
                .long_help(indoc!(r#"
                    Sets the output format:
                        "text" - prints a human readable report.
                        "json" - prints the same report as a JSON object.
                "#)),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Writes output to the file specified instead of stdout, errors will still be printed to stderr. \
                       Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`. \
                       Will create parent directories if needed."),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace"),
        )
}

fn main() {
    let matches = cli().get_matches();

    let app = RecordEventsDump::from_cli_matches(&matches);
    if let Err(e) = app.run() {
        eprintln!("{:?}", e);
        exit(1);
    }
}
