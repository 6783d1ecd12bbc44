//! Command dispatch: bridges CLI args -> driver commands -> output formatting.

pub mod config_cmd;
pub mod network;
pub mod util;

use bigip_core::{Answer, Command as DriverCommand, Driver, HttpConnector};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    driver: &Driver<HttpConnector>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Ready => run(driver, DriverCommand::Ready, global).await,
        Command::Maintain => run(driver, DriverCommand::Maintain, global).await,
        Command::Usage => run(driver, DriverCommand::ExternalNetworkResourceUsage, global).await,
        Command::IpAssoc(args) => network::ip_assoc(driver, &args, global).await,
        Command::LbConfig(args) => network::lb_config(driver, &args, global).await,
        Command::Startup => {
            let info = driver.startup_info();
            let out = output::render_single(
                &global.output,
                &info,
                |i| {
                    format!(
                        "Name:       {}\nZone:       {}\nAddress:    {}\nGUID:       {}\nHost type:  {}\nVersion:    {}",
                        i.name, i.zone_id, i.private_ip_address, i.guid, i.host_type, i.version
                    )
                },
                |i| i.guid.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Execute a driver command, print its answer, and fail on an unsuccessful one.
pub(crate) async fn run(
    driver: &Driver<HttpConnector>,
    command: DriverCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let name = command.name().to_owned();
    tracing::debug!(command = %name, "executing driver command");

    let answer = driver.execute(command).await;
    output::print_output(&output::render_answer(&global.output, &answer), global.quiet);
    check(&name, &answer)
}

fn check(name: &str, answer: &Answer) -> Result<(), CliError> {
    if answer.is_success() {
        return Ok(());
    }
    let details = match answer {
        Answer::Status {
            details: Some(d), ..
        } => d.clone(),
        Answer::Usage { error: Some(e), .. } => e.clone(),
        Answer::IpAssoc { results } => format!(
            "{} of {} addresses failed",
            results.iter().filter(|r| r.as_str() == bigip_core::command::FAILED_RESULT).count(),
            results.len()
        ),
        Answer::Unsupported { command } => format!("the driver does not handle '{command}'"),
        _ => "no details reported".into(),
    };
    Err(CliError::CommandFailed {
        command: name.to_owned(),
        details,
    })
}
