//! Shared registry and world fixtures.

use std::sync::Arc;
use tether_core::{fields, RecordId, RecordRef, Value};
use tether_link::{LinkConfig, LinkOutcome, LinkResult, Linker};
use tether_notify::{PubSub, RequestContext};
use tether_registry::{AttrDef, Registry, RegistryBuilder};
use tether_store::{EntityStore, MemoryStore};

/// Install a test subscriber once. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Farm has many Animals (inverse `farm`) and many-to-many Tags (inverse
/// `farms`). Tag keys are named `tag_id`.
pub fn farm_registry() -> Registry {
    let mut builder = RegistryBuilder::new();
    builder
        .add_type("Farm")
        .attr(AttrDef::new("name", "String").required())
        .has_many("animals", "Animal", "farm")
        .many_to_many("tags", "Tag", Some("farms"))
        .done()
        .expect("Farm type");
    builder
        .add_type("Animal")
        .attr(AttrDef::new("name", "String").required())
        .attr(AttrDef::new("species", "String"))
        .attr(AttrDef::new("legs", "Int").with_default(Value::Int(4)))
        .done()
        .expect("Animal type");
    builder
        .add_type("Tag")
        .primary_key("tag_id")
        .attr(AttrDef::new("label", "String"))
        .many_to_many("farms", "Farm", Some("tags"))
        .done()
        .expect("Tag type");
    builder.build().expect("farm registry")
}

/// A registry, a store seeded with one farm, a hub, and a linker over them.
pub struct World {
    pub registry: Arc<Registry>,
    pub memory: Arc<MemoryStore>,
    pub hub: Arc<PubSub>,
    pub linker: Linker,
    pub farm: RecordRef,
}

impl World {
    pub fn new() -> Self {
        Self::build(LinkConfig::default(), |memory| memory as Arc<dyn EntityStore>)
    }

    pub fn with_config(config: LinkConfig) -> Self {
        Self::build(config, |memory| memory as Arc<dyn EntityStore>)
    }

    /// Wrap the memory store before handing it to the linker.
    pub fn with_store<S, F>(wrap: F) -> Self
    where
        S: EntityStore + 'static,
        F: FnOnce(Arc<MemoryStore>) -> S,
    {
        Self::build(LinkConfig::default(), |memory| {
            Arc::new(wrap(memory)) as Arc<dyn EntityStore>
        })
    }

    fn build<F>(config: LinkConfig, wrap: F) -> Self
    where
        F: FnOnce(Arc<MemoryStore>) -> Arc<dyn EntityStore>,
    {
        init_tracing();
        let registry = Arc::new(farm_registry());
        let memory = Arc::new(MemoryStore::new(registry.clone()));
        let key = memory
            .insert("Farm", fields! { "name" => "Sunny Acres" })
            .expect("seed farm");
        let hub = Arc::new(PubSub::new());
        let linker = Linker::new(registry.clone(), wrap(memory.clone()))
            .with_notifier(hub.clone())
            .with_config(config);
        Self {
            registry,
            memory,
            hub,
            linker,
            farm: RecordRef::new("Farm", key),
        }
    }

    /// Insert an animal directly, bypassing the linker.
    pub fn animal(&self, name: &str) -> RecordId {
        self.memory
            .insert("Animal", fields! { "name" => name })
            .expect("seed animal")
    }

    /// Insert a tag directly, bypassing the linker.
    pub fn tag(&self, label: &str) -> RecordId {
        self.memory
            .insert("Tag", fields! { "label" => label })
            .expect("seed tag")
    }

    /// Route parameters naming the seeded farm.
    pub fn params(&self, extra: serde_json::Value) -> serde_json::Value {
        let mut params = serde_json::Map::new();
        params.insert("parentid".into(), self.farm.key.raw().into());
        if let serde_json::Value::Object(extra) = extra {
            params.extend(extra);
        }
        serde_json::Value::Object(params)
    }

    /// Link into one of the seeded farm's relations from route parameters.
    pub async fn link(&self, relation: &str, extra: serde_json::Value) -> LinkResult<LinkOutcome> {
        self.link_with(relation, extra, RequestContext::new()).await
    }

    pub async fn link_with(
        &self,
        relation: &str,
        extra: serde_json::Value,
        context: RequestContext,
    ) -> LinkResult<LinkOutcome> {
        self.linker
            .link_params("Farm", relation, self.params(extra), context)
            .await
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
