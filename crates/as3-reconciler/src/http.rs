//! HTTP transport to the appliance's AS3 endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::ApplianceConfig;
use crate::error::{SubmitError, SubmitResult};
use crate::submitter::{PostEvent, PostResponse, Submitter, VersionSource};

const DECLARE_PATH: &str = "/mgmt/shared/appsvcs/declare";
const INFO_PATH: &str = "/mgmt/shared/appsvcs/info";

/// `GET /info` payload
#[derive(Debug, Deserialize)]
struct InfoResponse {
    version: String,
    release: String,
}

/// Posts declarations over HTTPS with basic auth
pub struct HttpSubmitter {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    log_response: bool,
}

impl HttpSubmitter {
    pub fn new(config: &ApplianceConfig) -> SubmitResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.ssl_insecure)
            .build()
            .map_err(|e| SubmitError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            log_response: config.log_response,
        })
    }

    fn declare_url(&self, tenants: Option<&[String]>) -> String {
        match tenants.filter(|t| !t.is_empty()) {
            Some(tenants) => format!("{}{}/{}", self.base_url, DECLARE_PATH, tenants.join(",")),
            None => format!("{}{}", self.base_url, DECLARE_PATH),
        }
    }

    async fn send_declaration(
        &self,
        declaration: &str,
        tenants: Option<&[String]>,
    ) -> SubmitResult<(u16, String)> {
        let response = self
            .client
            .post(self.declare_url(tenants))
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .body(declaration.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn post_config(&self, declaration: &str, tenants: Option<&[String]>) -> PostResponse {
        let (status, body) = match self.send_declaration(declaration, tenants).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Failed to post declaration to appliance");
                return PostResponse::rejected(PostEvent::Error);
            }
        };

        if self.log_response {
            debug!(status, body = %body, "AS3 response");
        }

        match PostEvent::from_status(status) {
            PostEvent::Ok => PostResponse::accepted(),
            event => {
                error!(status, event = %event, body = %body, "AS3 declaration rejected");
                PostResponse::rejected(event)
            }
        }
    }
}

#[async_trait]
impl VersionSource for HttpSubmitter {
    async fn appliance_version(&self) -> SubmitResult<(String, String)> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, INFO_PATH))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let info: InfoResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::Decode(e.to_string()))?;
        Ok((info.version, info.release))
    }
}
