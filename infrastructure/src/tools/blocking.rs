//! Adapters for synchronous providers.
//!
//! Vendor SDKs and local file readers are often blocking. Wrapping them in
//! a [`BlockingToolAdapter`] moves each call onto tokio's blocking thread
//! pool so a slow provider does not stall other agents' turns.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tribunal_domain::{AdapterError, Params, ToolAdapter, ToolDefinition};

type BlockingFn = dyn Fn(&Params) -> Result<Value, AdapterError> + Send + Sync;

pub struct BlockingToolAdapter {
    definition: ToolDefinition,
    call: Arc<BlockingFn>,
}

impl BlockingToolAdapter {
    pub fn new<F>(definition: ToolDefinition, call: F) -> Self
    where
        F: Fn(&Params) -> Result<Value, AdapterError> + Send + Sync + 'static,
    {
        Self {
            definition,
            call: Arc::new(call),
        }
    }
}

#[async_trait]
impl ToolAdapter for BlockingToolAdapter {
    fn describe(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn invoke(&self, params: &Params) -> Result<Value, AdapterError> {
        let call = self.call.clone();
        let params = params.clone();
        tokio::task::spawn_blocking(move || call(&params))
            .await
            .map_err(|e| AdapterError::Failed(format!("blocking adapter task failed: {}", e)))?
    }
}
