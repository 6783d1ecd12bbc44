// ── Driver ──
//
// Entry point for the provisioning layer. Routes each command to its
// handler, serializes mutating commands per instance, and re-runs a
// failed command from scratch on a fresh session while the retry budget
// lasts. Every command gets an answer; failures are reported, not raised.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::appliance::StatisticsApi;
use crate::command::{
    Answer, Command, FAILED_RESULT, IpAssocCommand, LoadBalancerConfigCommand,
};
use crate::config::DriverConfig;
use crate::error::{CoreError, PartialFailure};
use crate::reconcile::Reconciler;
use crate::session::{Connector, SessionManager};
use crate::usage;

/// Kind of host this driver announces itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum HostType {
    ExternalLoadBalancer,
}

/// Announcement sent once the driver is connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartupInfo {
    pub name: String,
    pub zone_id: String,
    pub private_ip_address: String,
    pub guid: String,
    pub host_type: HostType,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPing {
    pub host_type: HostType,
    pub host_id: u64,
}

/// A failed attempt that the retry loop can inspect.
trait AttemptError: From<CoreError> {
    fn cause(&self) -> &CoreError;
}

impl AttemptError for CoreError {
    fn cause(&self) -> &CoreError {
        self
    }
}

impl AttemptError for PartialFailure {
    fn cause(&self) -> &CoreError {
        &self.error
    }
}

// ── Driver ───────────────────────────────────────────────────────────

/// Drives one appliance. Cheaply cloneable via `Arc<DriverInner>`.
pub struct Driver<C: Connector> {
    inner: Arc<DriverInner<C>>,
}

impl<C: Connector> Clone for Driver<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DriverInner<C: Connector> {
    config: DriverConfig,
    sessions: SessionManager<C>,
    /// Write side for mutating commands, read side for usage queries.
    exec_lock: RwLock<()>,
}

impl<C: Connector> Driver<C> {
    /// Validate `config` and log in.
    pub async fn connect(config: DriverConfig, connector: C) -> Result<Self, CoreError> {
        config.validate()?;
        let sessions = SessionManager::new(connector);
        sessions.acquire().await.map_err(|e| {
            CoreError::config(format!(
                "unable to log in to load balancer {}: {e}",
                config.host
            ))
        })?;
        info!(name = %config.name, host = %config.host, "driver connected");
        Ok(Self {
            inner: Arc::new(DriverInner {
                config,
                sessions,
                exec_lock: RwLock::new(()),
            }),
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.inner.config
    }

    pub fn sessions(&self) -> &SessionManager<C> {
        &self.inner.sessions
    }

    pub fn startup_info(&self) -> StartupInfo {
        let config = &self.inner.config;
        StartupInfo {
            name: config.name.clone(),
            zone_id: config.zone_id.clone(),
            private_ip_address: config.host.clone(),
            guid: config.guid.clone(),
            host_type: HostType::ExternalLoadBalancer,
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }

    pub fn ping(&self, host_id: u64) -> StatusPing {
        StatusPing {
            host_type: HostType::ExternalLoadBalancer,
            host_id,
        }
    }

    /// Log out and drop the session.
    pub async fn shutdown(&self) {
        self.inner.sessions.release().await;
        info!(name = %self.inner.config.name, "driver shut down");
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Run `command` and answer it.
    pub async fn execute(&self, command: Command) -> Answer {
        debug!(command = command.name(), "executing command");
        match command {
            Command::Ready => Answer::Ready,
            Command::Maintain => Answer::Maintain,
            Command::IpAssoc(cmd) => {
                let _guard = self.inner.exec_lock.write().await;
                self.ip_assoc(&cmd).await
            }
            Command::LoadBalancerConfig(cmd) => {
                let _guard = self.inner.exec_lock.write().await;
                self.load_balancer_config(&cmd).await
            }
            Command::ExternalNetworkResourceUsage => {
                let _guard = self.inner.exec_lock.read().await;
                self.usage().await
            }
            Command::Other { name } => {
                warn!(command = %name, "unsupported command");
                Answer::Unsupported { command: name }
            }
        }
    }

    async fn ip_assoc(&self, cmd: &IpAssocCommand) -> Answer {
        let inline = self.inner.config.inline;
        let interface = self.inner.config.private_interface.as_str();
        let outcome = self
            .with_retry("ip_assoc", |session| async move {
                Reconciler::new(&*session, inline, interface)
                    .ip_assoc(cmd)
                    .await
            })
            .await;

        match outcome {
            Ok(results) => Answer::IpAssoc { results },
            Err(PartialFailure { mut completed, .. }) => {
                let remaining = cmd.addresses.len().saturating_sub(completed.len());
                completed.extend(std::iter::repeat_n(FAILED_RESULT.to_owned(), remaining));
                Answer::IpAssoc { results: completed }
            }
        }
    }

    async fn load_balancer_config(&self, cmd: &LoadBalancerConfigCommand) -> Answer {
        let inline = self.inner.config.inline;
        let interface = self.inner.config.private_interface.as_str();
        let outcome = self
            .with_retry("load_balancer_config", |session| async move {
                Reconciler::new(&*session, inline, interface)
                    .apply_load_balancers(cmd)
                    .await
            })
            .await;

        match outcome {
            Ok(()) => Answer::Status {
                success: true,
                details: None,
            },
            Err(e) => Answer::Status {
                success: false,
                details: Some(e.to_string()),
            },
        }
    }

    async fn usage(&self) -> Answer {
        let inline = self.inner.config.inline;
        let outcome = self
            .with_retry("external_network_resource_usage", |session| async move {
                Ok::<_, CoreError>(StatisticsApi::virtual_server_statistics(&*session).await?)
            })
            .await;

        match outcome {
            Ok(entries) => Answer::Usage {
                ip_bytes: usage::aggregate(&entries, inline),
                error: None,
            },
            Err(e) => Answer::Usage {
                ip_bytes: std::collections::BTreeMap::new(),
                error: Some(e.to_string()),
            },
        }
    }

    // ── Retry loop ───────────────────────────────────────────────────

    /// Run `attempt` until it succeeds, fails for good, or the retry
    /// budget is spent. Each retry logs in again and starts over.
    async fn with_retry<T, E, F, Fut>(&self, command: &str, mut attempt: F) -> Result<T, E>
    where
        E: AttemptError,
        F: FnMut(Arc<C::Session>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let sessions = &self.inner.sessions;
        let mut remaining = self.inner.config.num_retries;
        loop {
            let result = match sessions.session().await {
                Ok(session) => attempt(session).await,
                Err(e) => Err(E::from(e)),
            };
            let failure = match result {
                Ok(value) => {
                    info!(command, "command completed");
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let cause = failure.cause();
            if !cause.is_retryable() || remaining == 0 {
                error!(command, error = %cause, "command failed");
                return Err(failure);
            }
            remaining -= 1;
            warn!(command, remaining, error = %cause, "retrying command");

            if let Err(auth) = sessions.acquire().await {
                error!(command, error = %auth, "re-authentication failed; giving up");
                return Err(failure);
            }
        }
    }
}
