use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use log::{debug, info, warn};

use crate::config::{CrsConfig, IndexConfig};
use crate::geom::{extent_eq, Extent};
use super::{fetch_reference_features, FeatureSource, ReferenceFeature, ReferenceIndex};

/// What a call to [`RefreshScheduler::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Nothing pending, or still inside the throttle window.
    Idle,
    /// A fetch is already running; the pending request waits for it.
    InFlight,
    /// A background fetch was started.
    Started,
    /// A completed fetch was applied to the index.
    Applied,
    /// The view is too far out for reference snapping; the index was cleared.
    BelowMinZoom,
    /// The requested extent matches the last successful fetch.
    Unchanged,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    extent: Extent,
    zoom: f64,
    changed_at: Instant,
}

struct Completed {
    generation: u64,
    extent: Extent,
    result: Result<Vec<ReferenceFeature>>,
}

/// Drives reference-index refreshes from viewport changes.
///
/// Viewport changes are collapsed into one fetch after a quiet period; at
/// most one fetch runs at a time; a fetch for the extent already loaded is
/// skipped. Each fetch carries a generation number and only the newest
/// generation may be applied, so late responses for superseded viewports
/// are dropped.
pub struct RefreshScheduler {
    source: Arc<dyn FeatureSource>,
    config: IndexConfig,
    crs: CrsConfig,
    pending: Option<Pending>,
    in_flight: Option<u64>,
    generation: u64,
    last_extent: Option<Extent>,
    tx: mpsc::Sender<Completed>,
    rx: mpsc::Receiver<Completed>,
}

impl RefreshScheduler {
    pub fn new(source: Arc<dyn FeatureSource>, config: IndexConfig, crs: CrsConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { source, config, crs, pending: None, in_flight: None, generation: 0, last_extent: None, tx, rx }
    }

    #[inline] pub fn is_in_flight(&self) -> bool { self.in_flight.is_some() }

    #[inline] pub fn has_pending(&self) -> bool { self.pending.is_some() }

    /// Extent of the last fetch applied to the index.
    #[inline] pub fn last_extent(&self) -> Option<Extent> { self.last_extent }

    /// Record a viewport change. Restarts the throttle window.
    pub fn viewport_changed(&mut self, extent: Extent, zoom: f64, now: Instant) {
        self.pending = Some(Pending { extent, zoom, changed_at: now });
    }

    /// Check whether a request for `extent` at `zoom` needs a fetch at all,
    /// clearing the index for zoom levels without reference snapping.
    fn screen(&mut self, index: &mut ReferenceIndex, extent: &Extent, zoom: f64) -> Option<RefreshStatus> {
        if zoom < self.config.min_zoom {
            if !index.is_empty() { debug!("[index] zoom {zoom:.1} below minimum, clearing") }
            index.clear();
            self.last_extent = None;
            return Some(RefreshStatus::BelowMinZoom)
        }
        if self.last_extent.is_some_and(|last| extent_eq(&last, extent, 1e-9)) {
            return Some(RefreshStatus::Unchanged)
        }
        None
    }

    /// Apply finished fetches and start a new one if the throttle window has passed.
    pub fn poll(&mut self, index: &mut ReferenceIndex, now: Instant) -> RefreshStatus {
        let mut status = RefreshStatus::Idle;

        while let Ok(done) = self.rx.try_recv() {
            if self.in_flight == Some(done.generation) { self.in_flight = None }
            if done.generation != self.generation {
                debug!("[index] dropping stale fetch (generation {} < {})", done.generation, self.generation);
                continue
            }
            match done.result {
                Ok(features) => {
                    info!("[index] loaded {} reference features", features.len());
                    index.replace(features);
                    self.last_extent = Some(done.extent);
                    status = RefreshStatus::Applied;
                }
                Err(e) => warn!("[index] refresh failed, keeping previous features: {e:#}"),
            }
        }

        let Some(pending) = self.pending else { return status };
        if now.saturating_duration_since(pending.changed_at) < self.config.throttle() { return status }
        if self.in_flight.is_some() { return RefreshStatus::InFlight }

        self.pending = None;
        if let Some(skipped) = self.screen(index, &pending.extent, pending.zoom) { return skipped }

        self.generation += 1;
        self.in_flight = Some(self.generation);

        let (generation, extent) = (self.generation, pending.extent);
        let (source, config, crs, tx) = (self.source.clone(), self.config.clone(), self.crs.clone(), self.tx.clone());
        debug!("[index] starting fetch generation {generation}");
        thread::spawn(move || {
            let result = fetch_reference_features(source.as_ref(), &extent, &config, &crs);
            // The scheduler may have been dropped; nothing to deliver to then.
            let _ = tx.send(Completed { generation, extent, result });
        });

        RefreshStatus::Started
    }

    /// Fetch and apply synchronously, bypassing the throttle.
    pub fn refresh_now(&mut self, index: &mut ReferenceIndex, extent: Extent, zoom: f64) -> Result<RefreshStatus> {
        if let Some(skipped) = self.screen(index, &extent, zoom) { return Ok(skipped) }

        // Supersede anything still running in the background.
        self.generation += 1;
        let features = fetch_reference_features(self.source.as_ref(), &extent, &self.config, &self.crs)?;
        info!("[index] loaded {} reference features", features.len());
        index.replace(features);
        self.last_extent = Some(extent);
        Ok(RefreshStatus::Applied)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::bail;
    use geo::{coord, Rect};

    use super::*;
    use crate::geom::{polygon_from_vertices, WGS84_PROJ4};
    use crate::index::{FeatureGeometry, FeaturePage, LayerType};

    /// Serves `per_layer` unit squares for every layer except water, which fails.
    struct GridSource {
        per_layer: usize,
        calls: AtomicUsize,
    }

    impl FeatureSource for GridSource {
        fn fetch_page(&self, layer: LayerType, _bbox: &Rect<f64>, offset: usize, limit: usize) -> Result<FeaturePage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if layer == LayerType::Water { bail!("service unavailable") }

            let end = self.per_layer.min(offset + limit);
            let features = (offset..end)
                .map(|i| {
                    let x = i as f64 * 0.001;
                    let square = polygon_from_vertices(&[
                        coord! { x: x, y: 0.0 }, coord! { x: x + 0.0005, y: 0.0 },
                        coord! { x: x + 0.0005, y: 0.0005 }, coord! { x: x, y: 0.0005 },
                    ]).unwrap();
                    ReferenceFeature::new(layer, Some(format!("{layer}-{i}")), FeatureGeometry::Polygon(square))
                })
                .collect::<Vec<_>>();
            Ok(FeaturePage { returned: features.len(), features })
        }
    }

    fn scheduler(per_layer: usize) -> (RefreshScheduler, Arc<GridSource>) {
        let source = Arc::new(GridSource { per_layer, calls: AtomicUsize::new(0) });
        let crs = CrsConfig { working_proj4: WGS84_PROJ4.into(), service_proj4: WGS84_PROJ4.into(), ..CrsConfig::default() };
        let config = IndexConfig { page_size: 10, max_pages: 3, simplify_tolerance: 0.0, ..IndexConfig::default() };
        (RefreshScheduler::new(source.clone(), config, crs), source)
    }

    fn extent(x: f64) -> Extent {
        Rect::new(coord! { x: x, y: 0.0 }, coord! { x: x + 1.0, y: 1.0 })
    }

    #[test]
    fn failed_layer_contributes_nothing() {
        let (mut scheduler, _) = scheduler(5);
        let mut index = ReferenceIndex::default();
        assert_eq!(scheduler.refresh_now(&mut index, extent(0.0), 17.0).unwrap(), RefreshStatus::Applied);
        // Building, road and rail succeed; water fails.
        assert_eq!(index.len(), 15);
        assert!(index.features().iter().all(|f| f.layer != LayerType::Water));
    }

    #[test]
    fn pagination_is_capped() {
        let (mut scheduler, source) = scheduler(100);
        let mut index = ReferenceIndex::default();
        scheduler.refresh_now(&mut index, extent(0.0), 17.0).unwrap();
        // 3 pages of 10 for each of three layers; water fails on its first page.
        assert_eq!(index.len(), 90);
        assert_eq!(source.calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn unchanged_extent_and_coarse_zoom_skip_fetching() {
        let (mut scheduler, source) = scheduler(2);
        let mut index = ReferenceIndex::default();
        scheduler.refresh_now(&mut index, extent(0.0), 17.0).unwrap();
        let calls = source.calls.load(Ordering::SeqCst);

        assert_eq!(scheduler.refresh_now(&mut index, extent(0.0), 17.0).unwrap(), RefreshStatus::Unchanged);
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);

        assert_eq!(scheduler.refresh_now(&mut index, extent(5.0), 12.0).unwrap(), RefreshStatus::BelowMinZoom);
        assert!(index.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }

    #[test]
    fn throttle_collapses_bursts_into_one_fetch() {
        let (mut scheduler, _) = scheduler(3);
        let mut index = ReferenceIndex::default();
        let t0 = Instant::now();

        scheduler.viewport_changed(extent(0.0), 17.0, t0);
        scheduler.viewport_changed(extent(1.0), 17.0, t0 + Duration::from_millis(100));
        assert_eq!(scheduler.poll(&mut index, t0 + Duration::from_millis(200)), RefreshStatus::Idle);
        assert_eq!(scheduler.poll(&mut index, t0 + Duration::from_millis(450)), RefreshStatus::Started);
        assert!(scheduler.is_in_flight());

        // A new change while the fetch runs waits for it to finish.
        scheduler.viewport_changed(extent(2.0), 17.0, t0 + Duration::from_millis(460));

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut applied = false;
        while Instant::now() < deadline {
            match scheduler.poll(&mut index, t0 + Duration::from_millis(500)) {
                RefreshStatus::Applied => { applied = true; break }
                _ => thread::sleep(Duration::from_millis(5)),
            }
        }
        assert!(applied);
        assert_eq!(index.len(), 9);
        assert_eq!(scheduler.last_extent(), Some(extent(1.0)));
        assert!(scheduler.has_pending());
    }

    #[test]
    fn stale_generation_is_dropped() {
        let (mut scheduler, _) = scheduler(3);
        let mut index = ReferenceIndex::default();
        let t0 = Instant::now();

        scheduler.viewport_changed(extent(0.0), 17.0, t0);
        assert_eq!(scheduler.poll(&mut index, t0 + Duration::from_secs(1)), RefreshStatus::Started);

        // A synchronous refresh supersedes the background fetch.
        scheduler.refresh_now(&mut index, extent(3.0), 17.0).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while scheduler.is_in_flight() && Instant::now() < deadline {
            scheduler.poll(&mut index, t0 + Duration::from_secs(2));
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!scheduler.is_in_flight());
        assert_eq!(scheduler.last_extent(), Some(extent(3.0)));
    }
}
