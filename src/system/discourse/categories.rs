use tokio_util::sync::CancellationToken;

use super::client::Client;
use super::error::ClientError;
use super::types::{CategoriesPayload, CategoryList};

/// Category operations.
pub struct Categories<'a> {
    client: &'a Client,
}

impl<'a> Categories<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List top-level categories with their subcategories.
    ///
    /// # Errors
    ///
    /// Propagates any [`ClientError`].
    pub async fn list(&self, cancel: &CancellationToken) -> Result<CategoryList, ClientError> {
        let request = self
            .client
            .get_request("/categories.json?include_subcategories=true")?;
        let response = self
            .client
            .execute::<CategoriesPayload>(request, cancel)
            .await?;
        Ok(response.payload.category_list)
    }
}
