// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Page renderer capability and its fallback loader.
//
// Rasterisation is a convenience, not the product's primary value: when no
// candidate renderer source can be loaded, paged-document inputs are skipped
// with a diagnostic while image inputs remain fully usable. This asymmetry
// with the engine initializer (fatal vs. skippable) is deliberate.

#[cfg(feature = "pdfium")]
pub mod pdfium;

use std::sync::Arc;

use lesewerk_core::error::Result;
use lesewerk_core::types::RecognitionSource;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// External capability that parses a paged-document byte stream and
/// rasterises individual pages to bitmaps.
///
/// Stateless by design: implementations take the document bytes on every
/// call, so the pipeline never holds renderer-internal state across a
/// suspension point.
pub trait PageRenderer: Send + Sync {
    fn page_count(&self, document: &[u8]) -> Result<usize>;

    /// Rasterise one page (1-based) at the given scale factor into an
    /// encoded bitmap tagged with its page index.
    fn render_page(&self, document: &[u8], page_number: u32, scale: f32)
    -> Result<RecognitionSource>;
}

/// One candidate renderer source, tried in priority order.
pub trait RendererProvider: Send + Sync {
    fn describe(&self) -> String;

    fn construct(&self) -> Result<Arc<dyn PageRenderer>>;
}

enum Slot {
    /// No attempt yet, or the last attempt failed (retried on next call).
    Unloaded,
    Ready(Arc<dyn PageRenderer>),
}

/// Lazily establishes the page-renderer capability with the same
/// fallback-list strategy as the engine initializer, but non-fatally:
/// exhaustion yields `None` plus a user-facing diagnostic, never an error.
pub struct RendererLoader {
    providers: Vec<Box<dyn RendererProvider>>,
    state: Mutex<(Slot, Option<String>)>,
}

impl RendererLoader {
    pub fn new(providers: Vec<Box<dyn RendererProvider>>) -> Self {
        Self {
            providers,
            state: Mutex::new((Slot::Unloaded, None)),
        }
    }

    /// Loader with an injected, already-available renderer. `ensure_ready`
    /// returns it immediately without trying any candidate.
    pub fn preloaded(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            providers: Vec::new(),
            state: Mutex::new((Slot::Ready(renderer), None)),
        }
    }

    /// Idempotent ensure. First successful candidate is cached for the
    /// process lifetime; a fully failed attempt records a diagnostic and is
    /// retried on the next call.
    pub async fn ensure_ready(&self) -> Option<Arc<dyn PageRenderer>> {
        let mut state = self.state.lock().await;
        if let Slot::Ready(renderer) = &state.0 {
            return Some(Arc::clone(renderer));
        }

        let mut last_err = None;
        for provider in &self.providers {
            let candidate = provider.describe();
            match provider.construct() {
                Ok(renderer) => {
                    info!(candidate, "page renderer ready");
                    state.0 = Slot::Ready(Arc::clone(&renderer));
                    state.1 = None;
                    return Some(renderer);
                }
                Err(err) => {
                    warn!(candidate, %err, "renderer candidate failed");
                    last_err = Some(err);
                }
            }
        }

        state.1 = Some(match last_err {
            Some(err) => format!("no renderer source could be loaded: {err}"),
            None => "no renderer sources configured".to_string(),
        });
        None
    }

    /// User-facing diagnostic recorded by the last failed load attempt.
    pub async fn diagnostic(&self) -> Option<String> {
        self.state.lock().await.1.clone()
    }
}
