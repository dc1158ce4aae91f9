//! Registry composing module and core stores
//!
//! The registry is constructed explicitly and passed by reference. It owns
//! the fetcher, the report cache and the deduplicator and injects them into
//! every store, so all stores in one registry share a single cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use shared::{store_info, ModuleSlug, ReportRequest, ReportResult};
use crate::core::core_stores::{CoreSiteStore, CoreUiStore, CoreUserStore};
use crate::core::module_store::ModuleStore;
use crate::error::{DatastoreError, DatastoreResult};
use crate::services::{ReportCache, RequestDeduplicator};
use crate::traits::ApiFetcher;

pub struct Registry<F: ApiFetcher + 'static> {
    fetcher: Arc<F>,
    dedup: Arc<RequestDeduplicator>,
    modules: BTreeMap<ModuleSlug, Arc<ModuleStore<F>>>,
    site: CoreSiteStore<F>,
    user: CoreUserStore<F>,
    ui: CoreUiStore,
}

impl<F: ApiFetcher + 'static> Registry<F> {
    /// Registry with a store for every known module
    pub fn new(fetcher: F) -> Self {
        Self::with_modules(fetcher, ModuleSlug::ALL)
    }

    /// Registry with stores for the given modules only
    pub fn with_modules<I>(fetcher: F, modules: I) -> Self
    where
        I: IntoIterator<Item = ModuleSlug>,
    {
        let fetcher = Arc::new(fetcher);
        let cache = Arc::new(ReportCache::new());
        let dedup = Arc::new(RequestDeduplicator::new(cache));

        let modules: BTreeMap<_, _> = modules
            .into_iter()
            .map(|slug| {
                let store = ModuleStore::new(slug, Arc::clone(&fetcher), Arc::clone(&dedup));
                (slug, Arc::new(store))
            })
            .collect();

        store_info!("registry", modules = modules.len(), "registry initialised");

        Self {
            site: CoreSiteStore::new(Arc::clone(&fetcher), Arc::clone(&dedup)),
            user: CoreUserStore::new(Arc::clone(&fetcher), Arc::clone(&dedup)),
            ui: CoreUiStore::new(),
            fetcher,
            dedup,
            modules,
        }
    }

    /// Store registered under `slug`
    pub fn module(&self, slug: ModuleSlug) -> DatastoreResult<&Arc<ModuleStore<F>>> {
        self.modules
            .get(&slug)
            .ok_or(DatastoreError::ModuleNotRegistered { module: slug })
    }

    pub fn modules(&self) -> impl Iterator<Item = &Arc<ModuleStore<F>>> {
        self.modules.values()
    }

    pub fn is_registered(&self, slug: ModuleSlug) -> bool {
        self.modules.contains_key(&slug)
    }

    pub fn site(&self) -> &CoreSiteStore<F> {
        &self.site
    }

    pub fn user(&self) -> &CoreUserStore<F> {
        &self.user
    }

    pub fn ui(&self) -> &CoreUiStore {
        &self.ui
    }

    pub fn cache(&self) -> &Arc<ReportCache> {
        self.dedup.cache()
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    /// Forward a report request to the store owning its module
    pub async fn get_report(&self, request: ReportRequest) -> DatastoreResult<ReportResult> {
        self.module(request.module)?.get_report(request).await
    }

    /// Drop every cached result and forget every in-flight fetch
    pub fn invalidate_all(&self) -> usize {
        let cleared = self.dedup.invalidate(|_| true);
        store_info!("registry", cleared, "all cached results invalidated");
        cleared
    }
}
