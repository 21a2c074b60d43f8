//! Scoped browsing contexts on the run's shared browser.
//!
//! Every page session leases one isolated context and hands it back through
//! [`PoolManager::release`]. A lease that is dropped without release (a
//! cancelled future, a panic unwinding) still closes its context in the
//! background so no cookies or recordings leak into the next session.

use crate::error::ProbeError;
use crate::renderer::{RenderContext, Renderer};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// A leased browsing context.
pub struct ContextHandle {
    context: Option<Box<dyn RenderContext>>,
    _permit: tokio::sync::OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl ContextHandle {
    pub fn context(&self) -> Result<&dyn RenderContext, ProbeError> {
        self.context
            .as_deref()
            .ok_or_else(|| ProbeError::Session("browsing context already released".into()))
    }

    pub fn context_mut(&mut self) -> Result<&mut (dyn RenderContext + 'static), ProbeError> {
        self.context
            .as_deref_mut()
            .ok_or_else(|| ProbeError::Session("browsing context already released".into()))
    }

    fn take(&mut self) -> Option<Box<dyn RenderContext>> {
        self.context.take()
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);

        let Some(context) = self.context.take() else {
            return;
        };
        warn!("browsing context dropped without release, closing in background");
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = context.close().await {
                        warn!("background context close failed: {e}");
                    }
                });
            }
            Err(_) => warn!("no runtime available, browsing context leaked"),
        }
    }
}

/// Hands out isolated contexts, at most `max_contexts` at a time.
pub struct PoolManager {
    renderer: Arc<dyn Renderer>,
    semaphore: Arc<Semaphore>,
    max_contexts: usize,
    counters: Arc<Counters>,
}

impl PoolManager {
    pub fn new(renderer: Arc<dyn Renderer>, max_contexts: usize) -> Self {
        let max_contexts = max_contexts.max(1);
        Self {
            renderer,
            semaphore: Arc::new(Semaphore::new(max_contexts)),
            max_contexts,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Sequential pool: one context at a time.
    pub fn sequential(renderer: Arc<dyn Renderer>) -> Self {
        Self::new(renderer, 1)
    }

    /// Lease a fresh context, waiting for a free slot.
    pub async fn acquire(&self) -> Result<ContextHandle> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| ProbeError::Browser(format!("context pool closed: {e}")))?;

        let context = self.renderer.new_context().await?;
        self.counters.active.fetch_add(1, Ordering::SeqCst);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        debug!("leased browsing context ({} active)", self.active());

        Ok(ContextHandle {
            context: Some(context),
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Close the leased context. Always consumes the lease, even on error.
    pub async fn release(&self, mut handle: ContextHandle) -> Result<()> {
        let Some(context) = handle.take() else {
            return Ok(());
        };
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        let result = context.close().await;
        drop(handle);
        result
    }

    /// Contexts currently leased.
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// Contexts opened over the pool's lifetime.
    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Contexts closed over the pool's lifetime.
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    pub fn max_contexts(&self) -> usize {
        self.max_contexts
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Shut down the underlying browser.
    pub async fn shutdown(&self) -> Result<()> {
        self.renderer.shutdown().await
    }
}
