// Token authentication
//
// `POST /mgmt/shared/authn/login` exchanges credentials for a token that
// is sent as `X-F5-Auth-Token` on every later request. Tokens expire on
// the appliance side; expiry shows up as HTTP 401 on a normal call.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::{ApplianceClient, decode};
use crate::error::Error;
use crate::models::LoginResponse;

const LOGIN_PROVIDER: &str = "tmos";

impl ApplianceClient {
    /// Authenticate with username/password and store the issued token.
    ///
    /// Any previously held token is dropped first, so a failed login
    /// leaves the client logged out.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        self.set_token(None);
        let url = self.mgmt_url(&["shared", "authn", "login"])?;
        debug!(%url, username, "logging in");

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "loginProviderName": LOGIN_PROVIDER,
        });

        let resp = self.http().post(url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {text}"),
            });
        }

        let text = resp.text().await?;
        let login: LoginResponse = decode(&text)?;
        self.set_token(Some(SecretString::from(login.token.token)));

        debug!("login successful");
        Ok(())
    }

    /// Revoke the current token. A client without a token is a no-op.
    pub async fn logout(&self) -> Result<(), Error> {
        let Some(token) = self.token() else {
            return Ok(());
        };
        let url = self.mgmt_url(&["shared", "authz", "tokens", token.expose_secret()])?;
        debug!("logging out");

        let result = self.delete(url).await;
        self.set_token(None);
        result
    }
}
