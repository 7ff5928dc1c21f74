//! Element reads

use action_locator::{ErrorKind, LocatorError, Query, RetryOptions};
use tracing::debug;

use crate::primitives::Actions;
use crate::types::ActionOptions;

impl Actions {
    /// Whether the element is present and visible. Absence reads as `false`
    /// instead of an error, and no retries are made.
    pub async fn is_visible(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<bool, LocatorError> {
        let options = ActionOptions {
            resolve: options.resolve.clone().throw_on_not_found(false),
            retry: Some(RetryOptions::none()),
        };

        match self
            .read_element("visibility", query, &options, |element| async move {
                element.is_visible().await
            })
            .await
        {
            Ok(visible) => Ok(visible.unwrap_or(false)),
            Err(err) if err.root_kind() == ErrorKind::SelfHealingFailed => {
                debug!(query = %query, error = %err, "treating exhausted catalog as not visible");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_text(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<Option<String>, LocatorError> {
        let text = self
            .read_element("text", query, options, |element| async move {
                element.text_content().await
            })
            .await?;
        Ok(text.flatten())
    }

    pub async fn get_input_value(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<Option<String>, LocatorError> {
        let value = self
            .read_element("value", query, options, |element| async move {
                element.input_value().await
            })
            .await?;
        Ok(value.flatten())
    }

    pub async fn get_attribute(
        &self,
        query: &Query,
        name: &str,
        options: &ActionOptions,
    ) -> Result<Option<String>, LocatorError> {
        let value = self
            .read_element(name, query, options, |element| async move {
                element.get_attribute(name).await
            })
            .await?;
        Ok(value.flatten())
    }
}
