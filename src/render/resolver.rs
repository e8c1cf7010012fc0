//! The rendering-mode resolver.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::future::join_all;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::cache::keys::{self, RouteParams};
use crate::cache::ExpiringCache;
use crate::error::ResolveError;

use super::artifact::{ContentGenerator, PageArtifact};
use super::classify::{RouteClass, RouteRules};
use crate::lock::{mutex_lock, rw_read, rw_write};

const SOURCE: &str = "render::resolver";

const METRIC_RENDER_MEMORY_HIT_TOTAL: &str = "brezza_render_memory_hit_total";
const METRIC_RENDER_GENERATE_TOTAL: &str = "brezza_render_generate_total";
const METRIC_RENDER_FALLBACK_TOTAL: &str = "brezza_render_fallback_total";

/// Decides how a route's content is produced and caches the result.
///
/// Three cache tiers sit between a caller and the generator: an in-process
/// memory map (unbounded, process lifetime), the expiring cache under
/// `ssg:`/`ssr:` keys, and finally generation itself. Resolution output is
/// idempotent with respect to regeneration, so invalidation does not need to
/// be atomic across tiers.
pub struct RenderResolver {
    rules: RouteRules,
    generator: Arc<dyn ContentGenerator>,
    cache: ExpiringCache,
    memory: RwLock<HashMap<String, PageArtifact>>,
    in_flight: Mutex<HashSet<String>>,
    ssg_ttl: Duration,
    ssr_ttl: Duration,
}

impl RenderResolver {
    pub fn new(
        rules: RouteRules,
        generator: Arc<dyn ContentGenerator>,
        cache: ExpiringCache,
        ssg_ttl: Duration,
        ssr_ttl: Duration,
    ) -> Self {
        Self {
            rules,
            generator,
            cache,
            memory: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            ssg_ttl,
            ssr_ttl,
        }
    }

    /// Classify a route. Pure and stateless.
    pub fn classify(&self, route: &str) -> RouteClass {
        self.rules.classify(route)
    }

    /// Resolve a route to a page artifact.
    ///
    /// Memory cache first, then the persisted tier, then generation. The
    /// memory cache is populated unconditionally after generation. For
    /// non-adaptive routes a generation failure propagates; adaptive routes
    /// fall back to the dynamic path.
    pub async fn resolve(
        &self,
        route: &str,
        params: &RouteParams,
    ) -> Result<PageArtifact, ResolveError> {
        let memory_key = memory_key(route, params);
        if let Some(artifact) = rw_read(&self.memory, SOURCE, "resolve").get(&memory_key) {
            counter!(METRIC_RENDER_MEMORY_HIT_TOTAL).increment(1);
            return Ok(artifact.clone());
        }

        let artifact = match self.rules.classify(route) {
            RouteClass::Static => self.resolve_static(route).await?,
            RouteClass::Dynamic => self.resolve_dynamic(route, params).await?,
            RouteClass::Adaptive => match self.resolve_static(route).await {
                Ok(artifact) => artifact,
                Err(err) => {
                    // Availability over freshness: serve the dynamic path
                    // rather than propagating the static failure.
                    warn!(
                        target_module = SOURCE,
                        route,
                        error = %err,
                        "Static path failed, falling back to dynamic"
                    );
                    counter!(METRIC_RENDER_FALLBACK_TOTAL).increment(1);
                    self.resolve_dynamic(route, params).await?
                }
            },
        };

        rw_write(&self.memory, SOURCE, "resolve")
            .insert(memory_key, artifact.clone());
        Ok(artifact)
    }

    async fn resolve_static(&self, route: &str) -> Result<PageArtifact, ResolveError> {
        let key = keys::ssg(route);
        if let Some(artifact) = self.cache.get::<PageArtifact>(&key).await {
            return Ok(artifact);
        }

        let content = self
            .generator
            .generate_static(route)
            .await
            .map_err(|err| ResolveError::generation(route, err))?;
        counter!(METRIC_RENDER_GENERATE_TOTAL, "tier" => "static").increment(1);

        let artifact = PageArtifact::from(content);
        self.cache.set(&key, &artifact, Some(self.ssg_ttl)).await;
        Ok(artifact)
    }

    async fn resolve_dynamic(
        &self,
        route: &str,
        params: &RouteParams,
    ) -> Result<PageArtifact, ResolveError> {
        let key = keys::ssr(route, params);
        if let Some(artifact) = self.cache.get::<PageArtifact>(&key).await {
            return Ok(artifact);
        }

        let content = self
            .generator
            .generate_dynamic(route, params)
            .await
            .map_err(|err| ResolveError::generation(route, err))?;
        counter!(METRIC_RENDER_GENERATE_TOTAL, "tier" => "dynamic").increment(1);

        let artifact = PageArtifact::from(content);
        self.cache.set(&key, &artifact, Some(self.ssr_ttl)).await;
        Ok(artifact)
    }

    /// Invalidate one route, or everything when `route` is `None`.
    ///
    /// Not atomic across tiers: a concurrent resolution may repopulate a
    /// tier between steps, which regeneration idempotence tolerates.
    pub async fn invalidate(&self, route: Option<&str>) {
        match route {
            Some(route) => {
                let prefix = format!("{route}:");
                rw_write(&self.memory, SOURCE, "invalidate")
                    .retain(|key, _| !key.starts_with(&prefix));

                self.cache.remove(&keys::page(route)).await;
                self.cache.remove(&keys::ssg(route)).await;
                self.cache.clear(&keys::ssr_route_prefix(route)).await;
                debug!(target_module = SOURCE, route, "Route invalidated");
            }
            None => {
                rw_write(&self.memory, SOURCE, "invalidate").clear();
                self.cache.clear(keys::PAGE_PREFIX).await;
                self.cache.clear(keys::SSG_PREFIX).await;
                self.cache.clear(keys::SSR_PREFIX).await;
                debug!(target_module = SOURCE, "Full cache invalidated");
            }
        }
    }

    /// Resolve a batch of routes ahead of demand.
    ///
    /// Routes already being preloaded are skipped; the rest resolve
    /// concurrently with settle-all semantics, so one failure does not abort
    /// the batch. Returns the number of routes that resolved.
    pub async fn preload(&self, routes: Vec<String>) -> usize {
        let accepted: Vec<String> = {
            let mut in_flight = mutex_lock(&self.in_flight, SOURCE, "preload");
            routes
                .into_iter()
                .filter(|route| {
                    let fresh = in_flight.insert(route.clone());
                    if !fresh {
                        debug!(target_module = SOURCE, route, "Preload already in flight");
                    }
                    fresh
                })
                .collect()
        };

        let params = RouteParams::new();
        let results = join_all(accepted.iter().map(|route| {
            let params = &params;
            async move { (route, self.resolve(route, params).await) }
        }))
        .await;

        let mut warmed = 0;
        {
            let mut in_flight = mutex_lock(&self.in_flight, SOURCE, "preload");
            for (route, result) in results {
                in_flight.remove(route.as_str());
                match result {
                    Ok(_) => warmed += 1,
                    Err(err) => {
                        warn!(
                            target_module = SOURCE,
                            route,
                            error = %err,
                            "Preload failed for route"
                        );
                    }
                }
            }
        }

        info!(target_module = SOURCE, warmed, "Preload batch settled");
        warmed
    }
}

fn memory_key(route: &str, params: &RouteParams) -> String {
    format!("{route}:{:016x}", keys::hash_params(params))
}
