//! Toolkit node declaration and runtime
//!
//! A `ToolkitNode` ties together the descriptive metadata of a node, the
//! resolved schemas of its three slots, and the callbacks that run it:
//!
//! ```ignore
//! let mut node = ToolkitNode::new("replace", "Replace occurrences of a substring")
//!     .with_tag(Tag::Utilities);
//! node.set_input::<Inputs>()?
//!     .set_param::<Params>()?
//!     .set_output::<Outputs>()?;
//! node.on_call(|inputs: Inputs, params: Params| async move { ... });
//! ```
//!
//! Requests go through `call`, which validates both payloads, runs the
//! startup hook at most once, then runs the execute callback.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{Result, SdkError};
use crate::metadata::{fields_from_schema, MetaDataBase};
use crate::model::{model_schema, PortModel};
use crate::resolve::resolve;
use crate::schema::{normalize, CustomJsonSchema};
use crate::types::{Slot, SupportedProviders, Tag};

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

type ExecuteFn = dyn Fn(Value, Value) -> BoxFuture<Value> + Send + Sync;
type StartupFn = dyn Fn(Value) -> BoxFuture<()> + Send + Sync;

/// A parameter-change callback: receives the node's current metadata and
/// returns the refreshed metadata
pub type CallbackFn = dyn Fn(MetaDataBase) -> BoxFuture<MetaDataBase> + Send + Sync;

type Validator = fn(&Value) -> std::result::Result<(), serde_json::Error>;

fn validate_as<T: DeserializeOwned>(value: &Value) -> std::result::Result<(), serde_json::Error> {
    T::deserialize(value).map(|_| ())
}

fn decode<T: DeserializeOwned>(slot: Slot, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| SdkError::Validation {
        slot,
        message: e.to_string(),
    })
}

/// A declared node
pub struct ToolkitNode {
    metadata: MetaDataBase,
    schemas: HashMap<Slot, CustomJsonSchema>,
    validators: HashMap<Slot, Validator>,
    output_components: bool,
    execute: Option<Arc<ExecuteFn>>,
    startup: Option<Arc<StartupFn>>,
    started: Mutex<bool>,
    callbacks: HashMap<String, Arc<CallbackFn>>,
}

impl ToolkitNode {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            metadata: MetaDataBase::new(name, description),
            schemas: HashMap::new(),
            validators: HashMap::new(),
            output_components: false,
            execute: None,
            startup: None,
            started: Mutex::new(false),
            callbacks: HashMap::new(),
        }
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.metadata.cost = cost;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.metadata.tag = Some(tag);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.metadata.icon = Some(icon.into());
        self
    }

    pub fn with_auth(mut self, provider: SupportedProviders) -> Self {
        self.metadata.auth = Some(provider);
        self
    }

    pub fn require_worker(mut self, require: bool) -> Self {
        self.metadata.require_worker = Some(require);
        self
    }

    pub fn is_input(mut self, is_input: bool) -> Self {
        self.metadata.is_input = Some(is_input);
        self
    }

    pub fn is_output(mut self, is_output: bool) -> Self {
        self.metadata.is_output = Some(is_output);
        self
    }

    pub fn is_group_node(mut self, is_group_node: bool) -> Self {
        self.metadata.is_group_node = Some(is_group_node);
        self
    }

    /// Attach default components to output ports as well.
    ///
    /// Takes effect for outputs declared after this call.
    pub fn with_output_components(mut self, enabled: bool) -> Self {
        self.output_components = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Borrow the live metadata
    pub fn metadata(&self) -> &MetaDataBase {
        &self.metadata
    }

    /// Snapshot of the node's metadata
    pub fn get_metadata(&self) -> MetaDataBase {
        self.metadata.clone()
    }

    /// Serialize the metadata as JSON, omitting absent optionals
    pub fn dump_metadata(&self) -> Result<String> {
        self.metadata.to_json()
    }

    /// The resolved schema behind a slot, if one was declared
    pub fn resolved_schema(&self, slot: Slot) -> Option<&CustomJsonSchema> {
        self.schemas.get(&slot)
    }

    pub fn set_input<T: PortModel>(&mut self) -> Result<&mut Self> {
        self.set_model::<T>(Slot::Inputs)
    }

    pub fn set_param<T: PortModel>(&mut self) -> Result<&mut Self> {
        self.set_model::<T>(Slot::Params)
    }

    pub fn set_output<T: PortModel>(&mut self) -> Result<&mut Self> {
        self.set_model::<T>(Slot::Outputs)
    }

    fn set_model<T: PortModel>(&mut self, slot: Slot) -> Result<&mut Self> {
        let raw = model_schema::<T>()?;
        self.set_schema(slot, &raw)?;
        self.validators.insert(slot, validate_as::<T>);
        Ok(self)
    }

    /// Declare a slot from a raw JSON Schema document.
    ///
    /// Replaces whatever the slot held before. Payloads for a slot declared
    /// this way are not checked beyond being forwarded to the callbacks.
    pub fn set_schema(&mut self, slot: Slot, raw: &Value) -> Result<&mut Self> {
        let with_components = slot != Slot::Outputs || self.output_components;
        let schema = resolve(normalize(raw)?, with_components)?;
        let fields = fields_from_schema(&schema)?;

        log::debug!(
            "Node '{}': declared {} {} field(s)",
            self.metadata.name,
            fields.len(),
            slot
        );

        *self.metadata.fields_mut(slot) = fields;
        self.schemas.insert(slot, schema);
        self.validators.remove(&slot);
        Ok(self)
    }

    /// Register the execute callback
    pub fn on_call<I, P, O, F, Fut>(&mut self, callback: F) -> &mut Self
    where
        I: DeserializeOwned + Send + 'static,
        P: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(I, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        let callback = Arc::new(callback);
        self.execute = Some(Arc::new(move |inputs: Value, params: Value| {
            let callback = callback.clone();
            Box::pin(async move {
                let inputs: I = decode(Slot::Inputs, inputs)?;
                let params: P = decode(Slot::Params, params)?;
                let outputs = callback(inputs, params).await.map_err(as_execution)?;
                serde_json::to_value(outputs).map_err(|e| as_execution(e.into()))
            }) as BoxFuture<Value>
        }));
        self
    }

    /// Register the one-time startup hook; it receives the first request's params
    pub fn on_startup<P, F, Fut>(&mut self, hook: F) -> &mut Self
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let hook = Arc::new(hook);
        self.startup = Some(Arc::new(move |params: Value| {
            let hook = hook.clone();
            Box::pin(async move {
                let params: P = decode(Slot::Params, params)?;
                hook(params).await.map_err(|e| match e {
                    SdkError::Startup(_) => e,
                    other => SdkError::Startup(other.to_string()),
                })
            }) as BoxFuture<()>
        }));
        self
    }

    /// Register a callback fired when any of the `triggers` params change.
    ///
    /// Every trigger must already be a declared parameter.
    pub fn callback<F, Fut>(&mut self, triggers: &[&str], id: impl Into<String>, callback: F) -> Result<&mut Self>
    where
        F: Fn(MetaDataBase) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MetaDataBase>> + Send + 'static,
    {
        let id = id.into();
        for trigger in triggers {
            self.metadata.field(Slot::Params, trigger)?;
        }
        for trigger in triggers {
            if let Some(field) = self.metadata.params.get_mut(*trigger) {
                field.callback_id = Some(id.clone());
            }
        }

        let callback = Arc::new(callback);
        self.callbacks.insert(
            id,
            Arc::new(move |metadata: MetaDataBase| {
                let callback = callback.clone();
                Box::pin(async move { callback(metadata).await }) as BoxFuture<MetaDataBase>
            }),
        );
        Ok(self)
    }

    pub fn callback_ids(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }

    pub fn get_callback(&self, id: &str) -> Option<Arc<CallbackFn>> {
        self.callbacks.get(id).cloned()
    }

    /// Run a registered callback against the current metadata
    pub async fn run_callback(&self, id: &str) -> Result<MetaDataBase> {
        let callback = self
            .get_callback(id)
            .ok_or_else(|| SdkError::UnknownCallback(id.to_string()))?;
        callback(self.get_metadata()).await
    }

    pub async fn is_started(&self) -> bool {
        *self.started.lock().await
    }

    /// Run the startup hook if it has not completed yet.
    ///
    /// Concurrent callers wait on the same lock, so the hook runs at most
    /// once. A failed hook leaves the node unstarted and is retried by the
    /// next request. A node without a hook is started by its first request.
    pub async fn startup(&self, params: &Value) -> Result<()> {
        let mut started = self.started.lock().await;
        if *started {
            return Ok(());
        }
        let Some(hook) = &self.startup else {
            *started = true;
            return Ok(());
        };

        log::info!("Starting node '{}'", self.metadata.name);
        if let Err(e) = hook(params.clone()).await {
            log::error!("Node '{}' failed to start: {}", self.metadata.name, e);
            return Err(e);
        }
        *started = true;
        Ok(())
    }

    /// Check a payload against the slot's model
    pub fn validate(&self, slot: Slot, value: &Value) -> Result<()> {
        match self.validators.get(&slot) {
            Some(validator) => validator(value).map_err(|e| SdkError::Validation {
                slot,
                message: e.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Handle one request: validate, start up if needed, execute.
    ///
    /// A node without an execute callback answers with an empty object.
    pub async fn call(&self, inputs: Value, params: Value) -> Result<Value> {
        self.validate(Slot::Inputs, &inputs)?;
        self.validate(Slot::Params, &params)?;
        self.startup(&params).await?;

        let Some(execute) = &self.execute else {
            return Ok(Value::Object(serde_json::Map::new()));
        };

        log::debug!("Executing node '{}'", self.metadata.name);
        execute(inputs, params)
            .await
            .inspect_err(|e| log::warn!("Node '{}' failed: {}", self.metadata.name, e))
    }
}

/// Failures inside the execute callback are server errors, whatever the callback raised
fn as_execution(err: SdkError) -> SdkError {
    match err {
        SdkError::Execution(_) => err,
        other => SdkError::Execution(other.to_string()),
    }
}

impl std::fmt::Debug for ToolkitNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolkitNode")
            .field("name", &self.metadata.name)
            .field("has_execute", &self.execute.is_some())
            .field("has_startup", &self.startup.is_some())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
