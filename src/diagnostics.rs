//! Diagnostic message routing.
//!
//! A [`Diagnostics`] instance sends each reported message to the channels
//! selected by its [`OutputLevel`]: an append-only log file, standard output
//! and modal message boxes. Every message is also written to the debugger,
//! whatever the level, so nothing is lost when output is turned off for end
//! users.
//!
//! Reporting never fails. A channel that cannot be written to is skipped and
//! the failure is logged through `tracing`.
//!
//! # Examples
//!
//! ```no_run
//! use zenutils::diagnostics::{Diagnostics, OutputLevel};
//!
//! let mut diagnostics = Diagnostics::new(None, "1.2.3.4");
//! if !diagnostics.set_output(OutputLevel::FROM_REGISTRY) {
//!     diagnostics.set_output(OutputLevel::LOG_FILE | OutputLevel::CONSOLE);
//! }
//! diagnostics.report("service started");
//! ```
//!
//! Each log line has the form `<version> <YYYY/MM/DD::HH:MM:SS> <message>`
//! and ends with `\r\n`.

use bitflags::bitflags;
use chrono::{DateTime, Local, TimeZone};
use std::{ffi::CStr, fmt::Display, path::PathBuf};
use widestring::U16String;

use crate::{
    file::TextFile,
    platform::{MessageStyle, NativePlatform, Platform},
    registry::{ConfigStore, RootKey, system_store},
    string::{self, CodePage},
    sys::user_data_path,
};

/// Timestamp format of log lines.
const LOG_TIME_FORMAT: &str = "%Y/%m/%d::%H:%M:%S";

bitflags! {
    /// Channels a [`Diagnostics`] instance reports to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputLevel: u32 {
        /// Append to the log file.
        const LOG_FILE = 0x01;
        /// Show a message box. This blocks until it is dismissed.
        const POPUPS = 0x02;
        /// Write to standard output.
        const CONSOLE = 0x04;
        /// Reserved. Has no effect.
        const EVENT_LOG = 0x08;
        /// Read the level from the configuration store instead.
        ///
        /// This is only meaningful as an argument to [`Diagnostics::set_output`].
        const FROM_REGISTRY = 0x10;
    }
}

impl OutputLevel {
    /// Report to the debugger only.
    pub const NONE: OutputLevel = OutputLevel::empty();
}

/// Where the output level is stored and how reports are presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsSettings {
    /// Root of the key holding the output level
    pub registry_root: RootKey,
    /// Path of the key holding the output level
    pub registry_path: String,
    /// Name of the integer value holding the output level
    pub registry_value: String,
    /// Title of message boxes
    pub popup_title: String,
    /// Log file name in the documents folder, when none is given
    pub log_file_name: String,
    /// Encoding of the log file
    pub log_code_page: CodePage,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            registry_root: RootKey::LocalMachine,
            registry_path: r"SOFTWARE\Zenware".to_owned(),
            registry_value: "Diagnostics".to_owned(),
            popup_title: "Zenware".to_owned(),
            log_file_name: "Zenware.log".to_owned(),
            log_code_page: CodePage::Utf8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LogLocation {
    /// `log_file_name` from the settings, in the documents folder
    Default,
    /// A file name in the documents folder
    Named(String),
    Path(PathBuf),
}

/// Routes diagnostic messages to the configured channels.
///
/// The output level starts as [`OutputLevel::NONE`]. Instances are not
/// synchronized; share one between threads only behind a lock.
pub struct Diagnostics {
    version: String,
    log_location: LogLocation,
    level: OutputLevel,
    settings: DiagnosticsSettings,
    store: Box<dyn ConfigStore>,
    platform: Box<dyn Platform>,
}

impl Diagnostics {
    /// Create an instance logging to `base_file_name` in the user's documents
    /// folder, or to the default log file name if `None`. Lines are tagged
    /// with `version`.
    pub fn new(base_file_name: Option<&str>, version: impl Into<String>) -> Self {
        let log_location = match base_file_name {
            Some(name) => LogLocation::Named(name.to_owned()),
            None => LogLocation::Default,
        };
        Self::with_location(log_location, version.into())
    }

    /// Create an instance logging to `path`.
    pub fn with_log_path(path: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self::with_location(LogLocation::Path(path.into()), version.into())
    }

    fn with_location(log_location: LogLocation, version: String) -> Self {
        Self {
            version,
            log_location,
            level: OutputLevel::NONE,
            settings: DiagnosticsSettings::default(),
            store: system_store(),
            platform: Box::new(NativePlatform),
        }
    }

    pub fn with_settings(mut self, settings: DiagnosticsSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Read the output level from `store` instead of the system store.
    pub fn with_config_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.store = store;
        self
    }

    /// Report through `platform` instead of [`NativePlatform`].
    pub fn with_platform(mut self, platform: Box<dyn Platform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn settings(&self) -> &DiagnosticsSettings {
        &self.settings
    }

    pub fn output_level(&self) -> OutputLevel {
        self.level
    }

    /// Path of the log file, or `None` if the documents folder is unknown.
    pub fn log_path(&self) -> Option<PathBuf> {
        match &self.log_location {
            LogLocation::Default => user_data_path(&self.settings.log_file_name),
            LogLocation::Named(name) => user_data_path(name),
            LogLocation::Path(path) => Some(path.clone()),
        }
    }

    /// Set the output level.
    ///
    /// A level containing [`OutputLevel::FROM_REGISTRY`] is a request to read
    /// the level from the configuration store, and any other bits in it are
    /// discarded: `LOG_FILE | FROM_REGISTRY` behaves like `FROM_REGISTRY`.
    /// If the stored value is missing, zero or unreadable, the level becomes
    /// [`OutputLevel::NONE`] and `false` is returned. Any other level is
    /// adopted as is.
    pub fn set_output(&mut self, level: OutputLevel) -> bool {
        if !level.contains(OutputLevel::FROM_REGISTRY) {
            self.level = level;
            return true;
        }

        match self.stored_level() {
            Some(stored) => {
                self.level = stored;
                true
            }
            None => {
                self.level = OutputLevel::NONE;
                false
            }
        }
    }

    /// The non-zero level held in the configuration store, if any.
    fn stored_level(&self) -> Option<OutputLevel> {
        let settings = &self.settings;
        let value = self.store.read_dword(
            settings.registry_root,
            &settings.registry_path,
            &settings.registry_value,
        );

        match value {
            Ok(Some(bits)) if bits != 0 => {
                let level = OutputLevel::from_bits_truncate(bits) - OutputLevel::FROM_REGISTRY;
                debug!(bits, ?level, "output level read from configuration store");
                Some(level)
            }
            Ok(_) => None,
            Err(error) => {
                warn!(%error, path = %settings.registry_path, "failed to read output level");
                None
            }
        }
    }

    /// Report `message` to the debugger and to each enabled channel, in the
    /// order log file, console, message box.
    pub fn report(&self, message: &str) {
        self.platform.debug_output(message);

        if self.level.contains(OutputLevel::LOG_FILE) {
            self.write_log(message);
        }
        if self.level.contains(OutputLevel::CONSOLE) {
            self.platform.console(message);
        }
        if self.level.contains(OutputLevel::POPUPS) {
            self.platform
                .show_message(&self.settings.popup_title, message, MessageStyle::Ok);
        }
    }

    /// Report a message in the ambient ANSI code page.
    ///
    /// A message no code page can decode only reaches the debugger, with
    /// invalid bytes replaced.
    pub fn report_multi_byte(&self, message: &CStr) {
        match string::unicode_string(message) {
            Ok(message) => self.report(&message.to_string_lossy()),
            Err(error) => {
                warn!(%error, "dropped undecodable message");
                self.platform
                    .debug_output(&String::from_utf8_lossy(message.to_bytes()));
            }
        }
    }

    /// Report the description of system error `code` as `<hex code>:
    /// <description>`, looking in the message table of `module` first.
    ///
    /// Returns `false`, without reporting anything, if no description is
    /// found.
    pub fn report_error(&self, module: Option<&str>, code: u32) -> bool {
        match self.platform.error_description(module, code) {
            Some(description) => {
                self.report(&format!("{code:x}: {description}"));
                true
            }
            None => {
                trace!(code, "no description for error");
                false
            }
        }
    }

    /// Report the calling thread's last error, as [`Diagnostics::report_error`].
    pub fn report_last_error(&self, module: Option<&str>) -> bool {
        let code = self.platform.last_error();
        self.report_error(module, code)
    }

    /// Report the last error, then `Exception: <module> <message>`.
    pub fn report_exception(&self, module: &str, message: Option<&str>) {
        let message = message.unwrap_or("Undefined: ");
        self.report_last_error(None);
        self.report(&format!("Exception: {module} {message}"));
    }

    /// Report `<hex code>: <text>`. Negative codes are shown in two's
    /// complement.
    pub fn report_generic_error(&self, text: &str, code: i32) -> bool {
        self.report_formatted(format_args!("{code:x}: {text}"))
    }

    /// Report `<info>: <text>`.
    pub fn report_string(&self, info: &str, text: &str) -> bool {
        self.report_formatted(format_args!("{info}: {text}"))
    }

    /// Report `0x<value>: <info>`, with the value as eight hex digits.
    pub fn report_value(&self, info: &str, value: usize) -> bool {
        self.report_formatted(format_args!("0x{value:08X}: {info}"))
    }

    /// Always returns `true`.
    fn report_formatted(&self, message: impl Display) -> bool {
        self.report(&message.to_string());
        true
    }

    fn write_log(&self, message: &str) {
        let Some(path) = self.log_path() else {
            warn!("no documents folder, dropped log line");
            return;
        };

        let line = U16String::from_str(&log_line(&self.version, &Local::now(), message));
        let bytes = match string::to_multi_byte(&line, self.settings.log_code_page) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(%error, "failed to encode log line");
                return;
            }
        };

        if let Err(error) = TextFile::new(&path).append(bytes.as_bytes()) {
            warn!(%error, path = %path.display(), "failed to append log line");
        }
    }
}

/// Format one log line, including the trailing `\r\n`. NULs become spaces,
/// since encoding stops at the first one.
fn log_line<Tz: TimeZone>(version: &str, time: &DateTime<Tz>, message: &str) -> String
where
    Tz::Offset: Display,
{
    let line = format!("{version} {} {message}\r\n", time.format(LOG_TIME_FORMAT));
    line.replace('\0', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{platform::DialogResult, registry::MemoryStore};
    use chrono::{NaiveDateTime, Timelike, Utc};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Debug(String),
        Console(String),
        Popup { title: String, body: String },
    }

    /// Records output instead of showing it. Clones share the record.
    #[derive(Clone, Default)]
    struct RecordingPlatform {
        events: Arc<Mutex<Vec<Event>>>,
        last_error: u32,
    }

    impl RecordingPlatform {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
            self.events().iter().filter(|event| matches(event)).count()
        }
    }

    impl Platform for RecordingPlatform {
        fn debug_output(&self, text: &str) {
            self.events.lock().unwrap().push(Event::Debug(text.into()));
        }

        fn console(&self, text: &str) {
            self.events.lock().unwrap().push(Event::Console(text.into()));
        }

        fn show_message(&self, title: &str, body: &str, _style: MessageStyle) -> DialogResult {
            self.events.lock().unwrap().push(Event::Popup {
                title: title.into(),
                body: body.into(),
            });
            DialogResult::Ok
        }

        fn error_description(&self, _module: Option<&str>, code: u32) -> Option<String> {
            (code != 0xDEAD).then(|| format!("Description {code}"))
        }

        fn last_error(&self) -> u32 {
            self.last_error
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        log_path: PathBuf,
        platform: RecordingPlatform,
        diagnostics: Diagnostics,
    }

    fn fixture(store: MemoryStore) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("diagnostics.log");
        let platform = RecordingPlatform::default();
        let diagnostics = Diagnostics::with_log_path(&log_path, "1.2.3.4")
            .with_config_store(Box::new(store))
            .with_platform(Box::new(platform.clone()));

        Fixture {
            _dir: dir,
            log_path,
            platform,
            diagnostics,
        }
    }

    fn log_lines(path: &std::path::Path) -> Vec<String> {
        match std::fs::read_to_string(path) {
            Ok(contents) => contents.split_terminator("\r\n").map(str::to_owned).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn store_with_level(value: u32) -> MemoryStore {
        let settings = DiagnosticsSettings::default();
        let store = MemoryStore::new();
        store
            .write_dword(
                settings.registry_root,
                &settings.registry_path,
                &settings.registry_value,
                value,
            )
            .unwrap();
        store
    }

    #[test]
    fn test_default_settings() {
        let settings = DiagnosticsSettings::default();
        assert_eq!(settings.registry_root, RootKey::LocalMachine);
        assert_eq!(settings.registry_path, r"SOFTWARE\Zenware");
        assert_eq!(settings.registry_value, "Diagnostics");
        assert_eq!(settings.popup_title, "Zenware");
        assert_eq!(settings.log_file_name, "Zenware.log");
        assert_eq!(settings.log_code_page, CodePage::Utf8);
    }

    #[test]
    fn test_initial_level() {
        let f = fixture(MemoryStore::new());
        assert_eq!(f.diagnostics.output_level(), OutputLevel::NONE);
        assert_eq!(f.diagnostics.version(), "1.2.3.4");
        assert_eq!(f.diagnostics.log_path(), Some(f.log_path.clone()));
    }

    #[test]
    fn test_log_path_in_documents() {
        let Some(documents) = dirs::document_dir() else {
            return;
        };

        let diagnostics = Diagnostics::new(None, "1.0");
        assert_eq!(diagnostics.log_path(), Some(documents.join("Zenware.log")));

        let diagnostics = Diagnostics::new(Some(r"\Custom.log"), "1.0");
        assert_eq!(diagnostics.log_path(), Some(documents.join("Custom.log")));

        let settings = DiagnosticsSettings {
            log_file_name: "Other.log".into(),
            ..Default::default()
        };
        let diagnostics = Diagnostics::new(None, "1.0").with_settings(settings);
        assert_eq!(diagnostics.log_path(), Some(documents.join("Other.log")));
    }

    #[test]
    fn test_flag_independence() {
        let mut f = fixture(MemoryStore::new());
        assert!(f.diagnostics.set_output(OutputLevel::LOG_FILE | OutputLevel::CONSOLE));

        f.diagnostics.report("hello");

        assert_eq!(log_lines(&f.log_path).len(), 1);
        assert_eq!(f.platform.count(|e| matches!(e, Event::Console(_))), 1);
        assert_eq!(f.platform.count(|e| matches!(e, Event::Popup { .. })), 0);
        assert_eq!(f.platform.count(|e| matches!(e, Event::Debug(_))), 1);
    }

    #[test]
    fn test_channel_order() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics
            .set_output(OutputLevel::POPUPS | OutputLevel::CONSOLE | OutputLevel::EVENT_LOG);

        f.diagnostics.report("ready");

        assert_eq!(
            f.platform.events(),
            [
                Event::Debug("ready".into()),
                Event::Console("ready".into()),
                Event::Popup {
                    title: "Zenware".into(),
                    body: "ready".into()
                },
            ]
        );
        // Event log has no effect
        assert!(log_lines(&f.log_path).is_empty());
    }

    #[test]
    fn test_debug_output_always() {
        let f = fixture(MemoryStore::new());
        f.diagnostics.report("quiet");

        assert_eq!(f.platform.events(), [Event::Debug("quiet".into())]);
        assert!(!f.log_path.exists());
    }

    #[test]
    fn test_idempotent_configuration() {
        let mut f = fixture(MemoryStore::new());
        assert!(f.diagnostics.set_output(OutputLevel::LOG_FILE));
        let once = f.diagnostics.output_level();
        assert!(f.diagnostics.set_output(OutputLevel::LOG_FILE));
        assert_eq!(f.diagnostics.output_level(), once);
        assert_eq!(once, OutputLevel::LOG_FILE);
    }

    #[test]
    fn test_registry_absent() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics.set_output(OutputLevel::CONSOLE);

        assert!(!f.diagnostics.set_output(OutputLevel::FROM_REGISTRY));
        assert_eq!(f.diagnostics.output_level(), OutputLevel::NONE);
    }

    #[test]
    fn test_registry_directive_discards_other_bits() {
        let mut f = fixture(MemoryStore::new());
        assert!(!f.diagnostics.set_output(OutputLevel::LOG_FILE | OutputLevel::FROM_REGISTRY));
        assert_eq!(f.diagnostics.output_level(), OutputLevel::NONE);

        f.diagnostics.report("dropped");
        assert!(log_lines(&f.log_path).is_empty());
    }

    #[test]
    fn test_registry_zero_same_as_absent() {
        // A stored zero cannot be told apart from a missing value
        let mut f = fixture(store_with_level(0));
        f.diagnostics.set_output(OutputLevel::CONSOLE);

        assert!(!f.diagnostics.set_output(OutputLevel::FROM_REGISTRY));
        assert_eq!(f.diagnostics.output_level(), OutputLevel::NONE);
    }

    #[test]
    fn test_registry_level() {
        let mut f = fixture(store_with_level(0x05));
        assert!(f.diagnostics.set_output(OutputLevel::FROM_REGISTRY));
        assert_eq!(f.diagnostics.output_level(), OutputLevel::LOG_FILE | OutputLevel::CONSOLE);

        // The directive bit is not kept, nor are unknown bits
        let mut f = fixture(store_with_level(0x114));
        assert!(f.diagnostics.set_output(OutputLevel::FROM_REGISTRY | OutputLevel::POPUPS));
        assert_eq!(f.diagnostics.output_level(), OutputLevel::CONSOLE);
    }

    #[test]
    fn test_registry_custom_location() {
        let store = MemoryStore::new();
        store
            .write_dword(RootKey::CurrentUser, r"SOFTWARE\Acme", "Trace", 0x02)
            .unwrap();
        let settings = DiagnosticsSettings {
            registry_root: RootKey::CurrentUser,
            registry_path: r"SOFTWARE\Acme".into(),
            registry_value: "Trace".into(),
            ..Default::default()
        };

        let mut f = fixture(store);
        f.diagnostics = f.diagnostics.with_settings(settings);
        assert!(f.diagnostics.set_output(OutputLevel::FROM_REGISTRY));
        assert_eq!(f.diagnostics.output_level(), OutputLevel::POPUPS);
    }

    #[test]
    fn test_end_to_end_log_line() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics.set_output(OutputLevel::LOG_FILE);

        let before = Local::now().naive_local().with_nanosecond(0).unwrap();
        f.diagnostics.report("hello");
        let after = Local::now().naive_local();

        let contents = std::fs::read(&f.log_path).unwrap();
        assert!(contents.ends_with(b" hello\r\n"));

        let lines = log_lines(&f.log_path);
        assert_eq!(lines.len(), 1);
        let rest = lines[0].strip_prefix("1.2.3.4 ").unwrap();
        let (timestamp, message) = rest.split_once(' ').unwrap();
        assert_eq!(message, "hello");

        let logged = NaiveDateTime::parse_from_str(timestamp, LOG_TIME_FORMAT).unwrap();
        assert!(before <= logged && logged <= after, "{logged} outside {before}..{after}");
    }

    #[test]
    fn test_log_appends() {
        let mut f = fixture(MemoryStore::new());
        std::fs::write(&f.log_path, b"existing\r\n").unwrap();
        f.diagnostics.set_output(OutputLevel::LOG_FILE);

        f.diagnostics.report("one");
        f.diagnostics.report("two");

        let lines = log_lines(&f.log_path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing");
        assert!(lines[1].ends_with(" one"));
        assert!(lines[2].ends_with(" two"));
    }

    #[test]
    fn test_log_embedded_nul() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics.set_output(OutputLevel::LOG_FILE);

        f.diagnostics.report("a\0b");
        f.diagnostics.report("next");

        let lines = log_lines(&f.log_path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" a b"));
        assert!(lines[1].ends_with(" next"));
    }

    #[test]
    fn test_log_code_page() {
        let mut f = fixture(MemoryStore::new());
        let settings = DiagnosticsSettings {
            log_code_page: CodePage::ShiftJis,
            ..Default::default()
        };
        f.diagnostics = f.diagnostics.with_settings(settings);
        f.diagnostics.set_output(OutputLevel::LOG_FILE);

        f.diagnostics.report("日本語");

        let contents = std::fs::read(&f.log_path).unwrap();
        assert!(contents.ends_with(&[b' ', 0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA, b'\r', b'\n']));
    }

    #[test]
    fn test_log_line_format() {
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(
            log_line("2.0.1", &time, "started"),
            "2.0.1 2024/03/05::07:08:09 started\r\n"
        );
    }

    #[test]
    fn test_report_error() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics.set_output(OutputLevel::CONSOLE);

        assert!(f.diagnostics.report_error(None, 0x5B4));
        assert!(!f.diagnostics.report_error(Some("netmsg.dll"), 0xDEAD));

        assert_eq!(
            f.platform.events(),
            [
                Event::Debug("5b4: Description 1460".into()),
                Event::Console("5b4: Description 1460".into()),
            ]
        );
    }

    #[test]
    fn test_report_exception() {
        let mut f = fixture(MemoryStore::new());
        f.platform.last_error = 0x20;
        f.diagnostics = f.diagnostics.with_platform(Box::new(f.platform.clone()));
        f.diagnostics.set_output(OutputLevel::CONSOLE);

        f.diagnostics.report_exception("Installer", None);
        f.diagnostics.report_exception("Installer", Some("copy failed"));

        let console: Vec<Event> = f
            .platform
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Console(_)))
            .collect();
        assert_eq!(
            console,
            [
                Event::Console("20: Description 32".into()),
                Event::Console("Exception: Installer Undefined: ".into()),
                Event::Console("20: Description 32".into()),
                Event::Console("Exception: Installer copy failed".into()),
            ]
        );
    }

    #[test]
    fn test_formatted_reports() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics.set_output(OutputLevel::CONSOLE);

        assert!(f.diagnostics.report_generic_error("failed", -1));
        assert!(f.diagnostics.report_generic_error("busy", 0x80));
        assert!(f.diagnostics.report_string("User", "zen"));
        assert!(f.diagnostics.report_value("bytes", 255));

        let console: Vec<String> = f
            .platform
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Console(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(
            console,
            ["ffffffff: failed", "80: busy", "User: zen", "0x000000FF: bytes"]
        );
    }

    #[test]
    fn test_report_multi_byte() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics.set_output(OutputLevel::CONSOLE);

        f.diagnostics.report_multi_byte(c"plain text");
        assert!(f.platform.events().contains(&Event::Console("plain text".into())));
    }

    #[test]
    #[cfg(not(windows))]
    fn test_report_multi_byte_undecodable() {
        let mut f = fixture(MemoryStore::new());
        f.diagnostics.set_output(OutputLevel::CONSOLE);

        // Invalid in the ambient code page, UTF-8 and US-ASCII
        f.diagnostics.report_multi_byte(c"bad \xff\xfe");
        assert_eq!(
            f.platform.events(),
            vec![Event::Debug("bad \u{FFFD}\u{FFFD}".into())]
        );
    }
}
