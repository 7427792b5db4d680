// DVR Manager Constants
// Enigma2 recording layout and defaults. Changing the extension lists changes
// which files the drop pipeline ledgers and removes.

// Primary media file of a recording
pub const VIDEO_EXTENSION: &str = ".ts";

// EPG sidecar written by the receiver next to every recording
pub const META_EXTENSION: &str = ".ts.meta";

// Every file the receiver writes for one recording, appended to the basepath
pub const RECORDING_EXTENSIONS: [&str; 6] = [".eit", ".ts", ".ts.ap", ".ts.cuts", ".ts.meta", ".ts.sc"];

// Paths (relative to the working directory unless configured)
pub const DB_FILENAME: &str = "recordings.sqlite3";
pub const LEDGER_FILENAME: &str = "dropped";
pub const CONFIG_FILENAME: &str = "config.json";

// Default external player
pub const DEFAULT_PLAYER: &str = "vlc";

// Groupkey transliterations applied after lower-casing.
// Decomposed umlauts (base letter + U+0308) fold to the same digraph as the precomposed form.
pub const DEFAULT_TRANSLITERATIONS: [(&str, &str); 7] = [
    ("ä", "ae"),
    ("ö", "oe"),
    ("ü", "ue"),
    ("a\u{308}", "ae"),
    ("o\u{308}", "oe"),
    ("u\u{308}", "ue"),
    ("ß", "ss"),
];

// Basename layout: "YYYYMMDD HHMM - <channel> - <title>"
pub const BASENAME_SEPARATOR: &str = " - ";
pub const BASENAME_TIME_FORMAT: &str = "%Y%m%d %H%M";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// Technical field sentinel for "could not be determined"
pub const UNKNOWN_DURATION: i64 = -1;

// List rendering
pub const BYTES_PER_GIB: f64 = 1_073_741_824.0;
pub const LIST_CHANNEL_WIDTH: usize = 10;
pub const LIST_TITLE_WIDTH: usize = 42;
