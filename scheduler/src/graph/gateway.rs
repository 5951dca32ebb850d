use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::{use_space, GraphError, GraphPool, GraphSession};

/// Where the HTTP gateway lives and which graphd it should connect to.
#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub gateway_url: String,
    pub graph_host: String,
    pub graph_port: u16,
    pub user: String,
    pub password: String,
}

/// Sessions over the NebulaGraph HTTP gateway.
///
/// Every session gets its own cookie-scoped client, which is how the gateway
/// tells graphd sessions apart.
pub struct GatewayPool {
    settings: GatewaySettings,
    ready: AtomicBool,
}

#[derive(Serialize)]
struct ConnectRequest<'a> {
    address: &'a str,
    port: u16,
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

impl GatewayResponse {
    fn into_result(self) -> Result<(), GraphError> {
        if self.code == 0 {
            Ok(())
        } else {
            Err(GraphError::Rejected {
                code: self.code,
                message: self.message,
            })
        }
    }
}

impl GatewayPool {
    pub fn new(settings: GatewaySettings) -> Self {
        Self {
            settings,
            ready: AtomicBool::new(false),
        }
    }

    /// Verifies the gateway accepts our credentials and starts handing out
    /// sessions.
    pub async fn init(&self) -> Result<(), GraphError> {
        let mut session = self.connect().await?;
        session.release().await;

        self.ready.store(true, Ordering::SeqCst);
        info!(
            "Graph pool initialized against {}:{}",
            self.settings.graph_host, self.settings.graph_port
        );

        Ok(())
    }

    /// Refuses new sessions. Open sessions stay valid until released.
    pub fn shutdown(&self) {
        if self.ready.swap(false, Ordering::SeqCst) {
            info!("Graph pool shut down");
        }
    }

    async fn connect(&self) -> Result<GatewaySession, GraphError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        let base_url = self.settings.gateway_url.trim_end_matches('/').to_string();

        let response: GatewayResponse = client
            .post(format!("{base_url}/api/db/connect"))
            .json(&ConnectRequest {
                address: &self.settings.graph_host,
                port: self.settings.graph_port,
                username: &self.settings.user,
                password: &self.settings.password,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.into_result()?;

        Ok(GatewaySession { client, base_url })
    }
}

#[async_trait]
impl GraphPool for GatewayPool {
    async fn session(&self, space: &str) -> Result<Box<dyn GraphSession>, GraphError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(GraphError::NotInitialized);
        }

        let mut session = self.connect().await?;
        if let Err(error) = session.execute(&use_space(space)).await {
            session.release().await;
            return Err(error);
        }

        Ok(Box::new(session))
    }
}

struct GatewaySession {
    client: reqwest::Client,
    base_url: String,
}

#[async_trait]
impl GraphSession for GatewaySession {
    async fn execute(&mut self, statement: &str) -> Result<(), GraphError> {
        debug!("Executing nGQL: {statement}");

        let response: GatewayResponse = self
            .client
            .post(format!("{}/api/db/exec", self.base_url))
            .json(&json!({ "gql": statement }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_result()
    }

    async fn release(&mut self) {
        let result = self
            .client
            .post(format!("{}/api/db/disconnect", self.base_url))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        if let Err(error) = result {
            warn!("Failed to release graph session: {error:?}");
        }
    }
}
