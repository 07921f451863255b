use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};

use crate::{
    decoder::ImageDecoder, scheduler::LoadScheduler, source::ImageMetadata, CatalogErrors,
    ImageId, SurfaceImageSource,
};

/// Progress notifications from the load tasks, in completion order.
#[derive(Debug)]
pub enum CatalogEvent {
    Loaded(ImageId),
    Failed { id: ImageId, error: CatalogErrors },
    Cancelled(ImageId),
    /// Sent exactly once, after the last load succeeds. Never sent if any load
    /// failed or was cancelled.
    Ready,
}

#[derive(Debug, Default)]
struct LoadState {
    started: AtomicBool,
    outstanding: AtomicUsize,
    failed: AtomicBool,
    ready: AtomicBool,
}

impl LoadState {
    /// Called by every task as its last action. Only the task that takes the
    /// outstanding count to zero can fire `Ready`, and the flag swap keeps it
    /// to a single event even if that invariant were ever broken.
    fn finish(&self, events: &Sender<CatalogEvent>) {
        let remaining = self.outstanding.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining == 0 {
            self.fire_ready(events);
        }
    }

    fn fire_ready(&self, events: &Sender<CatalogEvent>) {
        if self.failed.load(Ordering::Acquire) {
            warn!("surface imagery finished loading with failures, catalog will not become ready");
            return;
        }
        if self
            .ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("surface imagery catalog ready");
            let _ = events.send(CatalogEvent::Ready);
        }
    }
}

/// Owns the surface images of one body, keyed by [`ImageId`].
///
/// Entries are registered first, then [`SurfaceImageCatalog::load`] submits one
/// decode task per entry. Once every task has succeeded the catalog is ready
/// and read-only, so sampling needs no locking.
pub struct SurfaceImageCatalog {
    sources: Vec<Arc<SurfaceImageSource>>,
    state: Arc<LoadState>,
    events_tx: Sender<CatalogEvent>,
    events_rx: Receiver<CatalogEvent>,
}

impl Default for SurfaceImageCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceImageCatalog {
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            sources: Vec::new(),
            state: Arc::new(LoadState::default()),
            events_tx,
            events_rx,
        }
    }

    /// Catalog holding the usual daylit and night-side Earth bitmaps, visible band.
    pub fn earth(
        day: impl Into<PathBuf>,
        night: impl Into<PathBuf>,
    ) -> Result<Self, CatalogErrors> {
        let mut catalog = Self::new();
        catalog.register("earth", (400.0, 700.0), true, day)?;
        catalog.register("earth", (400.0, 700.0), false, night)?;
        Ok(catalog)
    }

    /// Adds an entry whose pixels will be decoded from `path` by `load`.
    ///
    /// Refuses an entry that would make `lookup` ambiguous, i.e. one with the
    /// same `lit` flag as an existing entry and an overlapping band.
    pub fn register(
        &mut self,
        body: &str,
        wavelength_range: (f64, f64),
        lit: bool,
        path: impl Into<PathBuf>,
    ) -> Result<ImageId, CatalogErrors> {
        if self.state.started.load(Ordering::Acquire) {
            return Err(CatalogErrors::AlreadyLoading);
        }
        let (min, max) = wavelength_range;
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(CatalogErrors::InvalidWavelengthRange(min, max));
        }
        let metadata = ImageMetadata {
            body: body.to_string(),
            wavelength_range,
            lit,
        };
        if self
            .sources
            .iter()
            .any(|s| s.metadata().lit == lit && s.metadata().overlaps(&metadata))
        {
            return Err(CatalogErrors::AmbiguousImage { lit });
        }

        let id = ImageId(self.sources.len());
        self.sources
            .push(Arc::new(SurfaceImageSource::new(id, metadata, path)));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn source(&self, id: ImageId) -> Result<&SurfaceImageSource, CatalogErrors> {
        self.sources
            .get(id.0)
            .map(Arc::as_ref)
            .ok_or(CatalogErrors::UnknownImage(id))
    }

    pub fn metadata(&self, id: ImageId) -> Result<&ImageMetadata, CatalogErrors> {
        self.source(id).map(|s| s.metadata())
    }

    /// First entry, in registration order, whose `lit` flag matches. The
    /// wavelength band is accepted for forward compatibility but does not take
    /// part in the match.
    pub fn lookup(
        &self,
        _min_wavelength: f64,
        _max_wavelength: f64,
        lit: bool,
    ) -> Result<ImageId, CatalogErrors> {
        self.sources
            .iter()
            .find(|s| s.metadata().lit == lit)
            .map(|s| s.id())
            .ok_or(CatalogErrors::NoMatchingImage { lit })
    }

    pub fn sample(
        &self,
        id: ImageId,
        lat: &[f64],
        lon: &[f64],
    ) -> Result<Vec<[u8; 3]>, CatalogErrors> {
        self.source(id)?.sample(lat, lon)
    }

    pub fn is_ready(&self) -> bool {
        self.state.ready.load(Ordering::Acquire)
    }

    /// Receiver for load progress. Every clone competes for the same events.
    pub fn events(&self) -> Receiver<CatalogEvent> {
        self.events_rx.clone()
    }

    /// Submits one decode task per registered image to `scheduler`. Returns as
    /// soon as the tasks are queued; readiness is reported through `events`.
    pub fn load(
        &self,
        scheduler: &LoadScheduler,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<(), CatalogErrors> {
        if self.state.started.swap(true, Ordering::AcqRel) {
            return Err(CatalogErrors::AlreadyLoading);
        }
        self.state
            .outstanding
            .store(self.sources.len(), Ordering::Release);
        if self.sources.is_empty() {
            self.state.fire_ready(&self.events_tx);
            return Ok(());
        }

        for source in &self.sources {
            let source = Arc::clone(source);
            let state = Arc::clone(&self.state);
            let events = self.events_tx.clone();
            let decoder = Arc::clone(&decoder);
            let cancel = scheduler.cancel_flag();
            scheduler.spawn(move || {
                run_load_task(&source, decoder.as_ref(), &cancel, &state, &events)
            });
        }
        Ok(())
    }

    /// Blocks until `Ready` arrives or `timeout` passes, for callers without an
    /// event loop. Consumes events from the shared receiver while waiting.
    pub fn wait_ready(&self, timeout: Duration) -> Result<(), CatalogErrors> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_ready() {
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(CatalogEvent::Ready) => return Ok(()),
                Ok(CatalogEvent::Failed { id, error }) => {
                    return Err(CatalogErrors::LoadFailed(format!("{id}: {error}")))
                }
                Ok(CatalogEvent::Cancelled(id)) => return Err(CatalogErrors::Cancelled(id)),
                Ok(CatalogEvent::Loaded(_)) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    return Err(CatalogErrors::NotReady)
                }
            }
        }
    }
}

fn run_load_task(
    source: &SurfaceImageSource,
    decoder: &dyn ImageDecoder,
    cancel: &AtomicBool,
    state: &LoadState,
    events: &Sender<CatalogEvent>,
) {
    let id = source.id();
    if cancel.load(Ordering::Acquire) {
        warn!(image_id = id.0, "surface image load cancelled before start");
        state.failed.store(true, Ordering::Release);
        let _ = events.send(CatalogEvent::Cancelled(id));
        state.finish(events);
        return;
    }

    debug!(image_id = id.0, path = %source.path().display(), "decoding surface image");
    match decoder.decode(source.path()) {
        Ok(pixels) => {
            let (width, height) = pixels.dimensions();
            source.install(pixels);
            debug!(image_id = id.0, width, height, "surface image loaded");
            let _ = events.send(CatalogEvent::Loaded(id));
        }
        Err(e) => {
            error!(image_id = id.0, error = %e, "surface image failed to load");
            state.failed.store(true, Ordering::Release);
            let _ = events.send(CatalogEvent::Failed { id, error: e });
        }
    }
    state.finish(events);
}
