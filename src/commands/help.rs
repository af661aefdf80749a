//! Help command implementation for suncontact.
//!
//! Shows general usage, the command overview, or detailed help for one
//! command.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "status" | "st" => log_block_start!("Usage: suncontact status [OPTIONS] [ACCESSORY]"),
        "set" | "s" => {
            log_block_start!("Usage: suncontact set <ACCESSORY> <period|offset|enabled> <VALUE>")
        }
        "identify" | "i" => log_block_start!("Usage: suncontact identify <ACCESSORY>"),
        "watch" | "w" => log_block_start!("Usage: suncontact watch [OPTIONS]"),
        "periods" | "p" => log_block_start!("Usage: suncontact periods"),
        "next" | "n" => log_block_start!("Usage: suncontact next [OPTIONS] [ACCESSORY]"),
        _ => log_block_start!("Usage: suncontact [OPTIONS] [COMMAND]"),
    }
}

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("help") | Some("h") => display_help_help(),
        Some("identify") | Some("i") => super::identify::display_help(),
        Some("next") | Some("n") => super::next::display_help(),
        Some("periods") | Some("p") => super::periods::display_help(),
        Some("set") | Some("s") => super::set::display_help(),
        Some("status") | Some("st") => super::status::display_help(),
        Some("watch") | Some("w") => super::watch::display_help(),
        Some(unknown) => {
            log_pipe!();
            log_warning!("Unknown command: {unknown}");
            display_general_help();
        }
    }
    Ok(())
}

/// Display the top-level usage with options and commands.
pub fn display_usage() {
    log_version!();
    log_block_start!("Usage: suncontact [OPTIONS] [COMMAND]");
    log_block_start!("Without a command the daemon runs in the foreground.");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>   Use a custom configuration directory");
    log_indented!("-d, --debug          Enable detailed debug output");
    log_indented!("-e, --ephemeral      Keep accessory state in memory only");
    log_indented!("-t, --timestamps     Prefix log lines with the wall-clock time");
    log_indented!("-h, --help           Print help information");
    log_indented!("-V, --version        Print version information");
    list_commands();
    log_end!();
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    list_commands();
    log_pipe!();
    log_info!("Use 'suncontact help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'suncontact --help' to see all options and general usage.");
    log_end!();
}

fn list_commands() {
    log_block_start!("Available Commands:");
    log_indented!("status, st [ACCESSORY]         Show accessory state from the daemon");
    log_indented!("set, s <ACC> <CHAR> <VALUE>    Write period, offset or enabled");
    log_indented!("identify, i <ACCESSORY>        Ask an accessory to identify itself");
    log_indented!("watch, w                       Stream sensor and schedule events");
    log_indented!("periods, p                     List the solar period catalog");
    log_indented!("next, n [ACCESSORY]            Compute upcoming events offline");
    log_indented!("help, h [COMMAND]              Show detailed help for a command");
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: suncontact help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("suncontact help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("suncontact help set");
    log_indented!("suncontact help next");
    log_end!();
}
