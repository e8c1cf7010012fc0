//! Engine context: one instance per process, wired at startup.

use std::sync::Arc;

use tracing::info;

use crate::cache::ExpiringCache;
use crate::config::Settings;
use crate::render::{ContentGenerator, RenderResolver, RouteRules};
use crate::security::SecurityLedger;
use crate::store::TieredStore;

const SOURCE: &str = "engine";

/// The engine's four components behind shared handles.
///
/// Constructed once at process start and passed by reference to every
/// consumer; tests construct fresh instances instead of sharing globals.
/// The presentation layer never sees a fatal error from anything reachable
/// through this context — the worst case is stale or absent content.
#[derive(Clone)]
pub struct Engine {
    store: Arc<TieredStore>,
    cache: ExpiringCache,
    resolver: Arc<RenderResolver>,
    ledger: Arc<SecurityLedger>,
}

impl Engine {
    /// Build the engine over the standard local-first medium chain.
    pub async fn open(
        settings: &Settings,
        rules: RouteRules,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let store = Arc::new(TieredStore::local_first(&settings.storage.root));
        Self::open_with_store(settings, rules, generator, store).await
    }

    /// Build the engine over an explicit store (tests inject medium chains).
    pub async fn open_with_store(
        settings: &Settings,
        rules: RouteRules,
        generator: Arc<dyn ContentGenerator>,
        store: Arc<TieredStore>,
    ) -> Self {
        let cache = ExpiringCache::new(store.clone(), settings.cache.default_ttl);
        let resolver = Arc::new(RenderResolver::new(
            rules,
            generator,
            cache.clone(),
            settings.cache.ssg_ttl,
            settings.cache.ssr_ttl,
        ));
        let ledger = Arc::new(SecurityLedger::open(store.clone(), &settings.security).await);

        info!(
            target_module = SOURCE,
            storage_root = %settings.storage.root.display(),
            "Engine opened"
        );

        Self {
            store,
            cache,
            resolver,
            ledger,
        }
    }

    pub fn store(&self) -> &TieredStore {
        &self.store
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    pub fn resolver(&self) -> &RenderResolver {
        &self.resolver
    }

    pub fn ledger(&self) -> &SecurityLedger {
        &self.ledger
    }
}
