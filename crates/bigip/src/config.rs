//! Profile selection and flag overrides on top of `bigip_config`.
//!
//! This is the single boundary where CLI config types cross into core:
//! the result is a complete `DriverConfig`.

use std::time::Duration;

use bigip_config::{Config, Profile};
use bigip_core::{DriverConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the driver configuration for this invocation.
///
/// The active profile supplies everything; `--host`, `--username`,
/// `--insecure` and `--timeout` override it. Without a profile, `--host`
/// alone is enough and the remaining identity fields fall back to values
/// derived from the host.
pub fn build_driver_config(global: &GlobalOpts, cfg: &Config) -> Result<DriverConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let profile = match (cfg.profiles.get(&profile_name), global.host.as_deref()) {
        (Some(profile), _) => profile.clone(),
        (None, Some(host)) => adhoc_profile(host),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: bigip_config::config_path().display().to_string(),
            });
        }
    };

    let profile = apply_overrides(profile, global);
    let mut driver = bigip_config::profile_to_driver_config(&profile, &profile_name, &cfg.defaults)?;

    if global.insecure {
        driver.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        driver.timeout = Duration::from_secs(secs);
    }
    Ok(driver)
}

fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    profile
}

/// Profile for a host given only on the command line.
fn adhoc_profile(host: &str) -> Profile {
    Profile {
        host: host.to_owned(),
        zone_id: "default".into(),
        guid: format!("bigip-{host}"),
        public_interface: "1.1".into(),
        private_interface: "1.2".into(),
        ..Profile::default()
    }
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
