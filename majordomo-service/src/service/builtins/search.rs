//! Web search capabilities.

use serde_json::json;

use super::{BuiltinContext, require_endpoint};
use crate::error::CapabilityError;
use crate::tools::{Arguments, CapabilityOutput};

impl BuiltinContext {
    pub(super) async fn web_search(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let query = args.required_str("query")?;
        let dynamic = self.runtime_config.dynamic();
        require_endpoint(
            &dynamic.integrations.search_base_url,
            "integrations.search_base_url",
        )?;

        let result = self
            .search
            .search(&dynamic.integrations, query)
            .await
            .map_err(|e| CapabilityError::backend(format!("Search failed: {}", e)))?;
        Ok(CapabilityOutput::Json(json!({ "result": result })))
    }

    pub(super) async fn get_news(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let dynamic = self.runtime_config.dynamic();
        let topic = args
            .str("topic")
            .unwrap_or(&dynamic.integrations.default_news_topic);
        require_endpoint(
            &dynamic.integrations.search_base_url,
            "integrations.search_base_url",
        )?;

        let result = self
            .search
            .news(&dynamic.integrations, topic)
            .await
            .map_err(|e| CapabilityError::backend(format!("News search failed: {}", e)))?;
        Ok(CapabilityOutput::Json(json!({ "result": result })))
    }
}
