//! Guest network and load-balancer rule handlers.

use bigip_core::{
    Command as DriverCommand, Driver, HttpConnector, IpAssocCommand, LoadBalancerConfigCommand,
};

use crate::cli::{FileArgs, GlobalOpts};
use crate::error::CliError;

use super::util::read_payload;

pub async fn ip_assoc(
    driver: &Driver<HttpConnector>,
    args: &FileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let payload: IpAssocCommand = read_payload(&args.file)?;
    if payload.addresses.is_empty() {
        return Err(CliError::Validation {
            field: "addresses".into(),
            reason: "the payload lists no addresses".into(),
        });
    }
    super::run(driver, DriverCommand::IpAssoc(payload), global).await
}

pub async fn lb_config(
    driver: &Driver<HttpConnector>,
    args: &FileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let payload: LoadBalancerConfigCommand = read_payload(&args.file)?;
    super::run(driver, DriverCommand::LoadBalancerConfig(payload), global).await
}
