//! Command line options.

use std::path::PathBuf;

/// Options parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub ticks: u64,
    pub players: usize,
    /// Force the water policy, overriding the config file.
    pub water: Option<bool>,
    pub help: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: None,
            ticks: 200,
            players: 4,
            water: None,
            help: false,
        }
    }
}

impl Options {
    /// Parse options from the process arguments.
    pub fn from_args() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse options from `args`, program name excluded. Unknown arguments
    /// and unparsable values are ignored.
    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let args: Vec<String> = args.into_iter().collect();

        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match args[i].as_str() {
                "-c" | "--config" => {
                    if let Some(path) = value {
                        options.config = Some(PathBuf::from(path));
                        i += 1;
                    }
                }
                "-t" | "--ticks" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        options.ticks = v;
                        i += 1;
                    }
                }
                "-p" | "--players" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        options.players = v;
                        i += 1;
                    }
                }
                "--solid-water" => options.water = Some(true),
                "--no-solid-water" => options.water = Some(false),
                "-h" | "--help" => options.help = true,
                _ => {}
            }
            i += 1;
        }

        options
    }
}
