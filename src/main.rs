//! Main application entry point.
//!
//! Parses the command line and dispatches: without a command the daemon runs
//! in the foreground through [`Suncontact`]; every other action is a one-shot
//! command from `suncontact::commands`.

use std::path::PathBuf;

use suncontact::args::{CliAction, ParsedArgs};
use suncontact::commands;
use suncontact::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use suncontact::{Suncontact, log_end, log_error_exit, log_version};

fn main() {
    let parsed_args = ParsedArgs::parse(std::env::args());

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            log_version!();
            log_end!();
            Ok(())
        }
        CliAction::ShowHelp => {
            commands::help::display_usage();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            commands::help::display_usage();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Run {
            debug_enabled,
            config_dir,
            ephemeral,
            timestamps,
        } => {
            let mut runner =
                Suncontact::new(debug_enabled).with_config_dir(config_dir.map(PathBuf::from));
            if ephemeral {
                runner = runner.ephemeral();
            }
            if timestamps {
                runner = runner.with_timestamps();
            }
            runner.run()
        }
        CliAction::StatusCommand {
            config_dir,
            accessory,
            json,
        } => commands::status::handle_status_command(
            config_dir.as_deref(),
            accessory.as_deref(),
            json,
        ),
        CliAction::SetCommand {
            config_dir,
            accessory,
            characteristic,
            value,
        } => commands::set::handle_set_command(
            config_dir.as_deref(),
            &accessory,
            &characteristic,
            &value,
        ),
        CliAction::IdentifyCommand {
            config_dir,
            accessory,
        } => commands::identify::handle_identify_command(config_dir.as_deref(), &accessory),
        CliAction::WatchCommand { config_dir, json } => {
            commands::watch::handle_watch_command(config_dir.as_deref(), json)
        }
        CliAction::PeriodsCommand => commands::periods::handle_periods_command(),
        CliAction::NextCommand {
            config_dir,
            accessory,
            at,
        } => commands::next::handle_next_command(
            config_dir.as_deref(),
            accessory.as_deref(),
            at.as_deref(),
        ),
    };

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            log_error_exit!("{e:#}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}
