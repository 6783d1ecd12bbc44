// ── Session lifecycle ──
//
// A session is one authenticated handle to the appliance. It is never
// pooled or kept alive: after any failure the driver asks for a brand new
// one, which replaces the current session atomically.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use bigip_api::transport::{TlsMode, TransportConfig};
use bigip_api::ApplianceClient;

use crate::appliance::Appliance;
use crate::config::{DriverConfig, TlsVerification};
use crate::error::CoreError;

/// Opens authenticated sessions against one appliance.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Session: Appliance + 'static;

    /// Exchange credentials for a new session.
    async fn connect(&self) -> Result<Self::Session, CoreError>;

    /// End `session` on the appliance. Best effort.
    async fn disconnect(&self, _session: &Self::Session) -> Result<(), CoreError> {
        Ok(())
    }
}

// ── HTTP connector ───────────────────────────────────────────────────

/// Production connector: token login over the appliance's control API.
pub struct HttpConnector {
    config: DriverConfig,
}

impl HttpConnector {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_to_transport(&self.config.tls),
            timeout: self.config.timeout,
        }
    }
}

/// Map core TLS config to the api transport TLS mode.
fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Session = ApplianceClient;

    async fn connect(&self) -> Result<ApplianceClient, CoreError> {
        let base_url = self.config.base_url()?;
        let client = ApplianceClient::new(base_url, &self.transport())?;
        client
            .login(&self.config.username, &self.config.password)
            .await
            .map_err(|e| CoreError::Auth {
                message: e.to_string(),
            })?;
        Ok(client)
    }

    async fn disconnect(&self, session: &ApplianceClient) -> Result<(), CoreError> {
        session.logout().await.map_err(CoreError::from)
    }
}

// ── Session manager ──────────────────────────────────────────────────

/// Holds the driver's single current session.
pub struct SessionManager<C: Connector> {
    connector: C,
    current: ArcSwapOption<C::Session>,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            current: ArcSwapOption::empty(),
        }
    }

    /// Log in and install the new session as the current one.
    ///
    /// Any previous session is dropped without logging out; after a
    /// failure its token is usually already dead.
    pub async fn acquire(&self) -> Result<Arc<C::Session>, CoreError> {
        let session = self.connector.connect().await.map_err(|e| match e {
            CoreError::Auth { .. } => e,
            other => CoreError::Auth {
                message: other.to_string(),
            },
        })?;
        let session = Arc::new(session);
        self.current.store(Some(Arc::clone(&session)));
        info!("appliance session established");
        Ok(session)
    }

    /// The installed session, if any.
    pub fn current(&self) -> Option<Arc<C::Session>> {
        self.current.load_full()
    }

    /// The installed session, logging in first when there is none.
    pub async fn session(&self) -> Result<Arc<C::Session>, CoreError> {
        match self.current() {
            Some(session) => Ok(session),
            None => self.acquire().await,
        }
    }

    /// Log out best-effort and clear the current session.
    pub async fn release(&self) {
        let Some(session) = self.current.swap(None) else {
            return;
        };
        match self.connector.disconnect(&session).await {
            Ok(()) => debug!("appliance session released"),
            Err(e) => warn!(error = %e, "logout failed; dropping session anyway"),
        }
    }
}
