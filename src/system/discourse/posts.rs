use reqwest::Method;
use tokio_util::sync::CancellationToken;

use super::client::Client;
use super::error::ClientError;
use super::types::{CreatePostModel, PostModel};

/// Post operations.
pub struct Posts<'a> {
    client: &'a Client,
}

impl<'a> Posts<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a topic (when `category` and `title` are set) or a reply.
    ///
    /// # Errors
    ///
    /// Propagates any [`ClientError`].
    pub async fn create(
        &self,
        model: &CreatePostModel,
        cancel: &CancellationToken,
    ) -> Result<PostModel, ClientError> {
        let request = self
            .client
            .new_request(Method::POST, "/posts.json", Some(model))?;
        let response = self.client.execute::<PostModel>(request, cancel).await?;
        Ok(response.payload)
    }
}
