// System endpoints: configuration save

use serde_json::json;
use tracing::debug;

use crate::client::ApplianceClient;
use crate::error::Error;
use crate::models::SaveMode;

impl ApplianceClient {
    /// Persist the running configuration layer selected by `mode`.
    ///
    /// `POST /mgmt/tm/sys/config` with `{"command": "save", "options": [...]}`
    pub async fn save_configuration(&self, mode: SaveMode) -> Result<(), Error> {
        let url = self.collection_url("sys", "config")?;
        debug!(?mode, "saving configuration");
        let mut option = serde_json::Map::new();
        option.insert(mode.as_option().to_owned(), json!(""));
        self.post(
            url,
            &json!({
                "command": "save",
                "options": [option],
            }),
        )
        .await
    }
}
