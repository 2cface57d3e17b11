use tokio_util::sync::CancellationToken;

use super::client::Client;
use super::error::ClientError;
use super::types::{LatestTopicsPayload, TopicDetail};

/// Topic operations.
pub struct Topics<'a> {
    client: &'a Client,
}

impl<'a> Topics<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Latest topics along with the users they reference.
    ///
    /// # Errors
    ///
    /// Propagates any [`ClientError`].
    pub async fn list_latest(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LatestTopicsPayload, ClientError> {
        let request = self.client.get_request("/latest.json")?;
        let response = self
            .client
            .execute::<LatestTopicsPayload>(request, cancel)
            .await?;
        Ok(response.payload)
    }

    /// A single topic including its post stream.
    ///
    /// # Errors
    ///
    /// Propagates any [`ClientError`].
    pub async fn show(&self, id: &str, cancel: &CancellationToken) -> Result<TopicDetail, ClientError> {
        let request = self.client.get_request(&format!("/t/{id}.json"))?;
        let response = self.client.execute::<TopicDetail>(request, cancel).await?;
        Ok(response.payload)
    }
}
