//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&bigip_config::config_path().display().to_string(), false);
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = bigip_config::load_config()?;
            let shown = cfg.redacted().to_toml()?;
            output::print_output(&shown, global.quiet);
            Ok(())
        }
    }
}
