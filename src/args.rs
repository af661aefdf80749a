//! Command-line argument parsing and processing.
//!
//! Without a subcommand suncontact runs the daemon. Subcommands either talk to
//! a running daemon over the bridge socket (`status`, `set`, `identify`,
//! `watch`) or compute something offline from the configuration (`periods`,
//! `next`).

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        /// Keep accessory state in memory only
        ephemeral: bool,
        timestamps: bool,
    },
    /// Print accessory status from the running daemon
    StatusCommand {
        config_dir: Option<String>,
        accessory: Option<String>,
        json: bool,
    },
    /// Write a characteristic
    SetCommand {
        config_dir: Option<String>,
        accessory: String,
        characteristic: String,
        value: String,
    },
    /// Ask an accessory to identify itself
    IdentifyCommand {
        config_dir: Option<String>,
        accessory: String,
    },
    /// Stream sensor and schedule events
    WatchCommand {
        config_dir: Option<String>,
        json: bool,
    },
    /// List the solar period catalog
    PeriodsCommand,
    /// Compute next occurrences offline from the configuration
    NextCommand {
        config_dir: Option<String>,
        accessory: Option<String>,
        at: Option<String>,
    },
    /// Detailed help for one command
    HelpCommand { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

/// Flags that may appear anywhere on the command line.
#[derive(Default)]
struct Flags {
    debug_enabled: bool,
    display_help: bool,
    display_version: bool,
    ephemeral: bool,
    timestamps: bool,
    json: bool,
    config_dir: Option<String>,
    at: Option<String>,
    unknown_arg_found: bool,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from std::env::args())
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut flags = Flags::default();
        let mut positionals: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg_str = args_vec[i].as_str();
            match arg_str {
                "--help" | "-h" => flags.display_help = true,
                "--version" | "-V" | "-v" => flags.display_version = true,
                "--debug" | "-d" => flags.debug_enabled = true,
                "--ephemeral" | "-e" => flags.ephemeral = true,
                "--timestamps" | "-t" => flags.timestamps = true,
                "--json" | "-j" => flags.json = true,
                "--config" | "-c" => match args_vec.get(i + 1) {
                    Some(dir) if !dir.starts_with('-') => {
                        flags.config_dir = Some(dir.clone());
                        i += 1;
                    }
                    _ => {
                        log_warning!("Missing directory for --config. Usage: --config <directory>");
                        flags.unknown_arg_found = true;
                    }
                },
                "--at" => match args_vec.get(i + 1) {
                    Some(time) => {
                        flags.at = Some(time.clone());
                        i += 1;
                    }
                    None => {
                        log_warning!("Missing time for --at. Usage: --at \"YYYY-MM-DD HH:MM:SS\"");
                        flags.unknown_arg_found = true;
                    }
                },
                // Negative offsets such as `set Sunset offset -15` are values
                _ if arg_str.starts_with('-') && arg_str.parse::<i64>().is_err() => {
                    log_warning!("Unknown option: {arg_str}");
                    flags.unknown_arg_found = true;
                }
                _ => positionals.push(args_vec[i].clone()),
            }
            i += 1;
        }

        let action = if flags.display_version {
            CliAction::ShowVersion
        } else if flags.unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if flags.display_help {
            match positionals.first() {
                Some(command) => CliAction::HelpCommand {
                    command: Some(command.clone()),
                },
                None => CliAction::ShowHelp,
            }
        } else {
            Self::command_action(positionals, flags)
        };

        ParsedArgs { action }
    }

    fn command_action(positionals: Vec<String>, flags: Flags) -> CliAction {
        let mut positionals = positionals.into_iter();
        let Some(command) = positionals.next() else {
            return CliAction::Run {
                debug_enabled: flags.debug_enabled,
                config_dir: flags.config_dir,
                ephemeral: flags.ephemeral,
                timestamps: flags.timestamps,
            };
        };
        let rest: Vec<String> = positionals.collect();
        let config_dir = flags.config_dir;

        let expect_at_most = |max: usize| {
            if rest.len() > max {
                log_warning!("Unexpected argument: {}", rest[max]);
                false
            } else {
                true
            }
        };

        match command.as_str() {
            "status" | "st" if expect_at_most(1) => CliAction::StatusCommand {
                config_dir,
                accessory: rest.first().cloned(),
                json: flags.json,
            },
            "set" | "s" => match rest.as_slice() {
                [accessory, characteristic, value] => CliAction::SetCommand {
                    config_dir,
                    accessory: accessory.clone(),
                    characteristic: characteristic.clone(),
                    value: value.clone(),
                },
                _ => {
                    log_warning!(
                        "Usage: suncontact set <accessory> <period|offset|enabled> <value>"
                    );
                    CliAction::ShowHelpDueToError
                }
            },
            "identify" | "i" => match rest.as_slice() {
                [accessory] => CliAction::IdentifyCommand {
                    config_dir,
                    accessory: accessory.clone(),
                },
                _ => {
                    log_warning!("Usage: suncontact identify <accessory>");
                    CliAction::ShowHelpDueToError
                }
            },
            "watch" | "w" if expect_at_most(0) => CliAction::WatchCommand {
                config_dir,
                json: flags.json,
            },
            "periods" | "p" if expect_at_most(0) => CliAction::PeriodsCommand,
            "next" | "n" if expect_at_most(1) => CliAction::NextCommand {
                config_dir,
                accessory: rest.first().cloned(),
                at: flags.at,
            },
            "help" | "h" if expect_at_most(1) => CliAction::HelpCommand {
                command: rest.first().cloned(),
            },
            "status" | "st" | "watch" | "w" | "periods" | "p" | "next" | "n" | "help" | "h" => {
                CliAction::ShowHelpDueToError
            }
            _ => {
                log_warning!("Unknown command: {command}");
                CliAction::ShowHelpDueToError
            }
        }
    }
}
