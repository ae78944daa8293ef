//! Resource traits and the provider registry

use crate::data::ResourceData;
use crate::diagnostics::Diagnostics;
use crate::error::SdkError;
use crate::schema::ResourceSchema;
use crate::validation::{apply_defaults, validate_config, Config};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// A managed object type
///
/// `M` is the meta value produced by [`Configure`], usually an API client.
#[async_trait]
pub trait Resource<M: ?Sized + Send + Sync>: Send + Sync {
    fn schema(&self) -> ResourceSchema;

    async fn create(&self, d: &mut ResourceData, meta: &M) -> anyhow::Result<()>;

    /// Clearing the id drops the object from state
    async fn read(&self, d: &mut ResourceData, meta: &M) -> anyhow::Result<()>;

    async fn update(&self, d: &mut ResourceData, meta: &M) -> anyhow::Result<()>;

    async fn delete(&self, d: &mut ResourceData, meta: &M) -> anyhow::Result<()>;
}

/// A read-only query type
#[async_trait]
pub trait DataSource<M: ?Sized + Send + Sync>: Send + Sync {
    fn schema(&self) -> ResourceSchema;

    async fn read(&self, d: &mut ResourceData, meta: &M) -> anyhow::Result<()>;
}

/// Builds the meta value from the provider block
#[async_trait]
pub trait Configure<M: ?Sized + Send + Sync>: Send + Sync {
    fn schema(&self) -> ResourceSchema;

    /// Warnings go into `diags`; failures are returned
    async fn configure(&self, d: &ResourceData, diags: &mut Diagnostics) -> anyhow::Result<Arc<M>>;
}

/// Result of a lifecycle call: the new state (null when the object is gone)
/// and any diagnostics
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub state: Value,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    fn failed(err: impl Display) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(err.to_string());
        Self {
            state: Value::Null,
            diagnostics,
        }
    }
}

/// Every schema the provider exposes
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub provider: ResourceSchema,
    pub resources: BTreeMap<String, ResourceSchema>,
    pub data_sources: BTreeMap<String, ResourceSchema>,
}

struct Registered<T: ?Sized> {
    handler: Arc<T>,
    schema: ResourceSchema,
    attributes: Arc<crate::schema::SchemaMap>,
}

impl<T: ?Sized> Registered<T> {
    fn new(handler: Arc<T>, schema: ResourceSchema) -> Self {
        let attributes = Arc::new(schema.attributes.clone());
        Self {
            handler,
            schema,
            attributes,
        }
    }
}

/// Registry of resource and data source types sharing one meta value
pub struct Provider<M: ?Sized + Send + Sync> {
    name: String,
    configurer: Registered<dyn Configure<M>>,
    resources: BTreeMap<String, Registered<dyn Resource<M>>>,
    data_sources: BTreeMap<String, Registered<dyn DataSource<M>>>,
    meta: RwLock<Option<Arc<M>>>,
}

impl<M: ?Sized + Send + Sync + 'static> Provider<M> {
    pub fn new(name: impl Into<String>, configurer: impl Configure<M> + 'static) -> Self {
        let schema = configurer.schema();
        let handler: Arc<dyn Configure<M>> = Arc::new(configurer);
        Self {
            name: name.into(),
            configurer: Registered::new(handler, schema),
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
            meta: RwLock::new(None),
        }
    }

    pub fn resource(mut self, type_name: &str, resource: impl Resource<M> + 'static) -> Self {
        let schema = resource.schema();
        let handler: Arc<dyn Resource<M>> = Arc::new(resource);
        self.resources.insert(type_name.to_string(), Registered::new(handler, schema));
        self
    }

    pub fn data_source(mut self, type_name: &str, data_source: impl DataSource<M> + 'static) -> Self {
        let schema = data_source.schema();
        let handler: Arc<dyn DataSource<M>> = Arc::new(data_source);
        self.data_sources
            .insert(type_name.to_string(), Registered::new(handler, schema));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: self.configurer.schema.clone(),
            resources: self
                .resources
                .iter()
                .map(|(k, r)| (k.clone(), r.schema.clone()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(k, r)| (k.clone(), r.schema.clone()))
                .collect(),
        }
    }

    /// Install a meta value directly, bypassing `configure`
    pub async fn set_meta(&self, meta: Arc<M>) {
        *self.meta.write().await = Some(meta);
    }

    async fn meta(&self) -> Result<Arc<M>, SdkError> {
        self.meta.read().await.clone().ok_or(SdkError::NotConfigured)
    }

    pub async fn configure(&self, mut config: Config) -> Diagnostics {
        let attributes = &self.configurer.attributes;
        let mut diags = apply_defaults(attributes, &mut config);
        diags.extend(validate_config(attributes, &config));
        if diags.has_errors() {
            return diags;
        }

        let d = ResourceData::new(Arc::clone(attributes), config);
        match self.configurer.handler.configure(&d, &mut diags).await {
            Ok(meta) => {
                info!("Provider {} configured", self.name);
                self.set_meta(meta).await;
            }
            Err(e) => {
                error!("Failed to configure provider {}: {:#}", self.name, e);
                diags.push_error(&e);
            }
        }
        diags
    }

    fn resource_entry(&self, type_name: &str) -> Result<&Registered<dyn Resource<M>>, SdkError> {
        self.resources
            .get(type_name)
            .ok_or_else(|| SdkError::UnknownResource(type_name.to_string()))
    }

    fn data_source_entry(&self, type_name: &str) -> Result<&Registered<dyn DataSource<M>>, SdkError> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| SdkError::UnknownDataSource(type_name.to_string()))
    }

    pub fn validate_resource_config(&self, type_name: &str, config: &Config) -> Diagnostics {
        match self.resource_entry(type_name) {
            Ok(entry) => defaulted_validation(&entry.attributes, config.clone()).1,
            Err(e) => Outcome::failed(e).diagnostics,
        }
    }

    pub fn validate_data_source_config(&self, type_name: &str, config: &Config) -> Diagnostics {
        match self.data_source_entry(type_name) {
            Ok(entry) => defaulted_validation(&entry.attributes, config.clone()).1,
            Err(e) => Outcome::failed(e).diagnostics,
        }
    }

    pub async fn create(&self, type_name: &str, config: Config) -> Outcome {
        let (entry, meta) = match self.prepare_resource(type_name).await {
            Ok(found) => found,
            Err(e) => return Outcome::failed(e),
        };
        let (config, mut diagnostics) = defaulted_validation(&entry.attributes, config);
        if diagnostics.has_errors() {
            return Outcome {
                state: Value::Null,
                diagnostics,
            };
        }

        debug!("Creating {}", type_name);
        let mut d = ResourceData::new(Arc::clone(&entry.attributes), config);
        if let Err(e) = entry.handler.create(&mut d, meta.as_ref()).await {
            error!("Failed to create {}: {:#}", type_name, e);
            diagnostics.push_error(&e);
        }
        // Partial state survives a failed create once an id is known
        Outcome {
            state: d.state(),
            diagnostics,
        }
    }

    pub async fn read(&self, type_name: &str, state: &Value) -> Outcome {
        let (entry, meta) = match self.prepare_resource(type_name).await {
            Ok(found) => found,
            Err(e) => return Outcome::failed(e),
        };
        let mut d = ResourceData::from_state(Arc::clone(&entry.attributes), state);
        if d.id().is_empty() {
            return Outcome::default();
        }
        let mut diagnostics = Diagnostics::new();
        match entry.handler.read(&mut d, meta.as_ref()).await {
            Ok(()) => Outcome {
                state: d.state(),
                diagnostics,
            },
            Err(e) => {
                error!("Failed to read {} {}: {:#}", type_name, d.id(), e);
                diagnostics.push_error(&e);
                Outcome {
                    state: state.clone(),
                    diagnostics,
                }
            }
        }
    }

    pub async fn update(&self, type_name: &str, prior_state: &Value, config: Config) -> Outcome {
        let (entry, meta) = match self.prepare_resource(type_name).await {
            Ok(found) => found,
            Err(e) => return Outcome::failed(e),
        };
        let (config, mut diagnostics) = defaulted_validation(&entry.attributes, config);
        if diagnostics.has_errors() {
            return Outcome {
                state: prior_state.clone(),
                diagnostics,
            };
        }

        let mut d = ResourceData::for_update(Arc::clone(&entry.attributes), prior_state, &config);
        debug!("Updating {} {}", type_name, d.id());
        match entry.handler.update(&mut d, meta.as_ref()).await {
            Ok(()) => Outcome {
                state: d.state(),
                diagnostics,
            },
            Err(e) => {
                error!("Failed to update {} {}: {:#}", type_name, d.id(), e);
                diagnostics.push_error(&e);
                Outcome {
                    state: prior_state.clone(),
                    diagnostics,
                }
            }
        }
    }

    pub async fn delete(&self, type_name: &str, state: &Value) -> Outcome {
        let (entry, meta) = match self.prepare_resource(type_name).await {
            Ok(found) => found,
            Err(e) => return Outcome::failed(e),
        };
        let mut d = ResourceData::from_state(Arc::clone(&entry.attributes), state);
        if d.id().is_empty() {
            return Outcome::default();
        }
        debug!("Deleting {} {}", type_name, d.id());
        let mut diagnostics = Diagnostics::new();
        match entry.handler.delete(&mut d, meta.as_ref()).await {
            Ok(()) => Outcome {
                state: Value::Null,
                diagnostics,
            },
            Err(e) => {
                error!("Failed to delete {} {}: {:#}", type_name, d.id(), e);
                diagnostics.push_error(&e);
                Outcome {
                    state: state.clone(),
                    diagnostics,
                }
            }
        }
    }

    /// Pass-through import: the id becomes the state id, then `read` fills the rest
    pub async fn import(&self, type_name: &str, id: &str) -> Outcome {
        let entry = match self.resource_entry(type_name) {
            Ok(entry) => entry,
            Err(e) => return Outcome::failed(e),
        };
        if !entry.schema.importable {
            return Outcome::failed(SdkError::ImportNotSupported(type_name.to_string()));
        }

        let mut state = Map::new();
        state.insert("id".to_string(), Value::String(id.to_string()));
        let mut outcome = self.read(type_name, &Value::Object(state)).await;
        if outcome.state.is_null() && !outcome.diagnostics.has_errors() {
            outcome
                .diagnostics
                .error("Cannot import non-existent remote object");
        }
        outcome
    }

    pub async fn read_data_source(&self, type_name: &str, config: Config) -> Outcome {
        let entry = match self.data_source_entry(type_name) {
            Ok(entry) => entry,
            Err(e) => return Outcome::failed(e),
        };
        let meta = match self.meta().await {
            Ok(meta) => meta,
            Err(e) => return Outcome::failed(e),
        };
        let (config, mut diagnostics) = defaulted_validation(&entry.attributes, config);
        if diagnostics.has_errors() {
            return Outcome {
                state: Value::Null,
                diagnostics,
            };
        }

        let mut d = ResourceData::new(Arc::clone(&entry.attributes), config);
        if let Err(e) = entry.handler.read(&mut d, meta.as_ref()).await {
            error!("Failed to read data source {}: {:#}", type_name, e);
            diagnostics.push_error(&e);
            return Outcome {
                state: Value::Null,
                diagnostics,
            };
        }
        Outcome {
            state: d.state(),
            diagnostics,
        }
    }

    async fn prepare_resource(
        &self,
        type_name: &str,
    ) -> Result<(&Registered<dyn Resource<M>>, Arc<M>), SdkError> {
        let entry = self.resource_entry(type_name)?;
        let meta = self.meta().await?;
        Ok((entry, meta))
    }
}

fn defaulted_validation(
    attributes: &crate::schema::SchemaMap,
    mut config: Config,
) -> (Config, Diagnostics) {
    let mut diags = apply_defaults(attributes, &mut config);
    diags.extend(validate_config(attributes, &config));
    (config, diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use anyhow::bail;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory key/value store standing in for an API client
    #[derive(Default)]
    struct Store {
        items: Mutex<HashMap<String, String>>,
        next: Mutex<u64>,
    }

    struct StoreConfigure;

    #[async_trait]
    impl Configure<Store> for StoreConfigure {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new([("endpoint", Schema::string().required())])
        }

        async fn configure(&self, d: &ResourceData, diags: &mut Diagnostics) -> anyhow::Result<Arc<Store>> {
            if d.get_string("endpoint") == "legacy" {
                diags.warning("legacy endpoint", "");
            }
            Ok(Arc::new(Store::default()))
        }
    }

    struct Item;

    #[async_trait]
    impl Resource<Store> for Item {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new([
                ("value", Schema::string().required()),
                ("fail", Schema::bool().optional()),
            ])
            .importable()
        }

        async fn create(&self, d: &mut ResourceData, meta: &Store) -> anyhow::Result<()> {
            let id = {
                let mut next = meta.next.lock().unwrap();
                *next += 1;
                next.to_string()
            };
            meta.items.lock().unwrap().insert(id.clone(), d.get_string("value"));
            d.set_id(id);
            if d.get_bool("fail") {
                bail!("failed after create");
            }
            Ok(())
        }

        async fn read(&self, d: &mut ResourceData, meta: &Store) -> anyhow::Result<()> {
            let value = meta.items.lock().unwrap().get(d.id()).cloned();
            match value {
                Some(v) => d.set("value", v)?,
                None => d.set_id(""),
            }
            Ok(())
        }

        async fn update(&self, d: &mut ResourceData, meta: &Store) -> anyhow::Result<()> {
            meta.items
                .lock()
                .unwrap()
                .insert(d.id().to_string(), d.get_string("value"));
            self.read(d, meta).await
        }

        async fn delete(&self, d: &mut ResourceData, meta: &Store) -> anyhow::Result<()> {
            meta.items.lock().unwrap().remove(d.id());
            Ok(())
        }
    }

    fn provider() -> Provider<Store> {
        Provider::new("store", StoreConfigure).resource("store_item", Item)
    }

    fn cfg(v: Value) -> Config {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn lifecycle_requires_configure() {
        let p = provider();
        let out = p.create("store_item", cfg(json!({"value": "a"}))).await;
        assert_eq!(out.diagnostics.error_summaries(), vec!["provider has not been configured"]);

        let diags = p.configure(cfg(json!({"endpoint": "legacy"}))).await;
        assert!(!diags.has_errors());
        assert_eq!(diags.len(), 1);
    }

    #[tokio::test]
    async fn create_read_update_delete() {
        let p = provider();
        p.configure(cfg(json!({"endpoint": "x"}))).await;

        let created = p.create("store_item", cfg(json!({"value": "a"}))).await;
        assert!(created.diagnostics.is_empty());
        assert_eq!(created.state["id"], json!("1"));

        let updated = p
            .update("store_item", &created.state, cfg(json!({"value": "b"})))
            .await;
        assert_eq!(updated.state["value"], json!("b"));

        let read = p.read("store_item", &updated.state).await;
        assert_eq!(read.state, updated.state);

        let deleted = p.delete("store_item", &read.state).await;
        assert!(deleted.state.is_null());

        let gone = p.read("store_item", &read.state).await;
        assert!(gone.state.is_null());
        assert!(gone.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn failed_create_keeps_partial_state() {
        let p = provider();
        p.configure(cfg(json!({"endpoint": "x"}))).await;

        let out = p
            .create("store_item", cfg(json!({"value": "a", "fail": true})))
            .await;
        assert_eq!(out.diagnostics.error_summaries(), vec!["failed after create"]);
        assert_eq!(out.state["id"], json!("1"));
    }

    #[tokio::test]
    async fn import_of_missing_object_fails() {
        let p = provider();
        p.configure(cfg(json!({"endpoint": "x"}))).await;

        let out = p.import("store_item", "99").await;
        assert_eq!(
            out.diagnostics.error_summaries(),
            vec!["Cannot import non-existent remote object"]
        );

        p.create("store_item", cfg(json!({"value": "a"}))).await;
        let out = p.import("store_item", "1").await;
        assert_eq!(out.state["value"], json!("a"));
    }

    #[tokio::test]
    async fn unknown_types_and_invalid_config() {
        let p = provider();
        p.configure(cfg(json!({"endpoint": "x"}))).await;

        let out = p.read("store_thing", &json!({"id": "1"})).await;
        assert_eq!(out.diagnostics.error_summaries(), vec!["unknown resource type: store_thing"]);

        let diags = p.validate_resource_config("store_item", &cfg(json!({})));
        assert_eq!(
            diags.error_summaries(),
            vec!["The argument \"value\" is required, but no definition was found."]
        );
    }
}
