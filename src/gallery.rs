//! Presentation-neutral gallery model
//!
//! Holds one cell per URL and fills them in either [`LoadMode`]. A GUI grid
//! reads cells from here; the model itself draws nothing.
//!
//! Cells can be recycled with [`GalleryModel::prepare_for_reuse`]. Every
//! recycle bumps the cell's generation, and a per-item result that arrives for
//! an older generation is dropped, so a late download never lands in a cell
//! that has moved on.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::loader::{ImageLoader, ItemFetcher};
use crate::provider::UrlProvider;
use crate::types::{BatchId, FetchResult, Image, LoadMode, ResourceRef};

#[derive(Debug, Default)]
struct Cell {
    image: Option<Image>,
    generation: u64,
}

#[derive(Debug)]
struct GalleryState {
    cells: Vec<Cell>,
    /// True while a batch is in flight (the "activity indicator")
    loading: bool,
    /// Bumped by every batch load; only the latest batch may fill the cells
    load_generation: u64,
}

/// Grid of image cells backed by a fixed URL list (cloneable handle)
#[derive(Clone, Debug)]
pub struct GalleryModel {
    urls: Arc<Vec<ResourceRef>>,
    mode: LoadMode,
    state: Arc<Mutex<GalleryState>>,
}

impl GalleryModel {
    /// Create an empty gallery with one cell per URL
    pub fn new(urls: Vec<ResourceRef>, mode: LoadMode) -> Self {
        let cells = (0..urls.len()).map(|_| Cell::default()).collect();
        Self {
            urls: Arc::new(urls),
            mode,
            state: Arc::new(Mutex::new(GalleryState {
                cells,
                loading: false,
                load_generation: 0,
            })),
        }
    }

    /// Create a gallery over a provider's URLs
    pub fn from_provider(provider: &UrlProvider, mode: LoadMode) -> Self {
        Self::new(provider.urls().to_vec(), mode)
    }

    /// Start populating cells according to the mode
    ///
    /// Batch mode sets the loading flag, fetches everything, and fills every
    /// cell at once when the batch completes; it returns the batch id. Loading
    /// again while a batch is in flight supersedes it: the older batch's
    /// completion is dropped and the flag stays set until the newest settles.
    /// Per-item mode binds every cell immediately and returns `None`.
    pub fn load(&self, loader: &ImageLoader) -> Option<BatchId> {
        match self.mode {
            LoadMode::Batch => Some(self.load_batch(loader)),
            LoadMode::PerItem => {
                let fetcher = loader.item_fetcher();
                for index in 0..self.len() {
                    self.bind_cell(index, &fetcher);
                }
                None
            }
        }
    }

    fn load_batch(&self, loader: &ImageLoader) -> BatchId {
        let generation = {
            let mut state = self.lock();
            state.loading = true;
            state.load_generation += 1;
            for cell in &mut state.cells {
                cell.image = None;
            }
            state.load_generation
        };

        let state = Arc::clone(&self.state);
        loader
            .batch_coordinator()
            .fetch_all(self.urls.to_vec(), move |slots| {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.load_generation != generation {
                    tracing::debug!(
                        generation,
                        current = state.load_generation,
                        "dropping superseded batch"
                    );
                    return;
                }
                for (cell, slot) in state.cells.iter_mut().zip(slots) {
                    cell.image = slot;
                }
                state.loading = false;
            })
    }

    /// Fetch the image for one cell and show it if the cell was not recycled meanwhile
    ///
    /// Out-of-range indices are ignored. Failed fetches leave the cell empty.
    pub fn bind_cell(&self, index: usize, fetcher: &ItemFetcher) {
        let Some(resource) = self.urls.get(index).cloned() else {
            tracing::debug!(index, "bind_cell: index out of range");
            return;
        };
        let generation = self.lock().cells[index].generation;

        let state = Arc::clone(&self.state);
        fetcher.fetch(resource, move |result| {
            let FetchResult::Success(image) = result else {
                return;
            };
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            let cell = &mut state.cells[index];
            if cell.generation == generation {
                cell.image = Some(image);
            } else {
                tracing::debug!(index, generation, current = cell.generation, "dropping stale image");
            }
        });
    }

    /// Clear a cell before it is shown again; in-flight results for it become stale
    ///
    /// Returns false for an out-of-range index.
    pub fn prepare_for_reuse(&self, index: usize) -> bool {
        let mut state = self.lock();
        match state.cells.get_mut(index) {
            Some(cell) => {
                cell.image = None;
                cell.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the gallery has no cells
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Load mode of this gallery
    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Whether a batch load is in flight
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Image currently shown in a cell
    pub fn image(&self, index: usize) -> Option<Image> {
        self.lock().cells.get(index).and_then(|c| c.image.clone())
    }

    /// Images of all cells, in display order
    pub fn snapshot(&self) -> Vec<Option<Image>> {
        self.lock().cells.iter().map(|c| c.image.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, GalleryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::ui_context;
    use crate::loader::test_helpers::{FakeResponse, FakeTransport, fake_loader, fake_loader_with};
    use std::time::Duration;

    fn widths(gallery: &GalleryModel) -> Vec<Option<u32>> {
        gallery
            .snapshot()
            .iter()
            .map(|s| s.as_ref().map(|i| i.width()))
            .collect()
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition never became true");
    }

    #[tokio::test]
    async fn batch_mode_fills_all_cells_at_once() {
        let transport = Arc::new(FakeTransport::new());
        let urls = vec![
            transport.add_delayed(
                "https://fake.test/g1.png",
                FakeResponse::image(1, 1),
                Duration::from_millis(10),
            ),
            transport.add_delayed(
                "https://fake.test/g2.png",
                FakeResponse::image(2, 1),
                Duration::from_millis(200),
            ),
            transport.add("https://fake.test/g3.png", FakeResponse::status(404)),
        ];
        let loader = fake_loader(Arc::clone(&transport));
        let gallery = GalleryModel::new(urls, LoadMode::Batch);

        assert!(gallery.load(&loader).is_some());
        assert!(gallery.is_loading());

        // The fast image must not show up on its own
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(gallery.is_loading());
        assert_eq!(widths(&gallery), vec![None, None, None]);

        wait_until(|| !gallery.is_loading()).await;
        assert_eq!(widths(&gallery), vec![Some(1), Some(2), None]);
    }

    #[tokio::test]
    async fn per_item_mode_shows_images_as_they_arrive() {
        let transport = Arc::new(FakeTransport::new());
        let urls = vec![
            transport.add("https://fake.test/p1.png", FakeResponse::image(1, 1)),
            transport.add_delayed(
                "https://fake.test/p2.png",
                FakeResponse::image(2, 1),
                Duration::from_millis(300),
            ),
        ];
        let loader = fake_loader(Arc::clone(&transport));
        let gallery = GalleryModel::new(urls, LoadMode::PerItem);

        assert!(gallery.load(&loader).is_none());
        assert!(!gallery.is_loading());

        wait_until(|| gallery.image(0).is_some()).await;
        assert!(gallery.image(1).is_none());

        wait_until(|| gallery.image(1).is_some()).await;
        assert_eq!(widths(&gallery), vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn stale_result_after_reuse_is_ignored() {
        let transport = Arc::new(FakeTransport::new());
        let urls = vec![transport.add_delayed(
            "https://fake.test/reuse.png",
            FakeResponse::image(5, 5),
            Duration::from_millis(100),
        )];
        let loader = fake_loader(Arc::clone(&transport));
        let gallery = GalleryModel::new(urls, LoadMode::PerItem);

        gallery.load(&loader);
        assert!(gallery.prepare_for_reuse(0));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(transport.calls(), 1);
        assert!(gallery.image(0).is_none(), "stale image landed in a recycled cell");

        // Rebinding after reuse shows the image again
        gallery.bind_cell(0, &loader.item_fetcher());
        wait_until(|| gallery.image(0).is_some()).await;
    }

    #[tokio::test]
    async fn ui_context_defers_cell_updates_until_loop_runs() {
        let transport = Arc::new(FakeTransport::new());
        let urls = vec![transport.add("https://fake.test/ui1.png", FakeResponse::image(3, 1))];
        let (ui, mut ui_loop) = ui_context();
        let loader = fake_loader_with(Arc::clone(&transport), Config::default(), Arc::new(ui));
        let gallery = GalleryModel::new(urls, LoadMode::Batch);

        gallery.load(&loader);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gallery.is_loading());

        assert!(ui_loop.run_one().await);
        assert!(!gallery.is_loading());
        assert_eq!(widths(&gallery), vec![Some(3)]);
    }

    #[tokio::test]
    async fn reloading_supersedes_in_flight_batch() {
        let transport = Arc::new(FakeTransport::new());
        let urls = vec![transport.add_delayed(
            "https://fake.test/again.png",
            FakeResponse::image(4, 4),
            Duration::from_millis(150),
        )];
        let (ui, mut ui_loop) = ui_context();
        let loader = fake_loader_with(Arc::clone(&transport), Config::default(), Arc::new(ui));
        let gallery = GalleryModel::new(urls, LoadMode::Batch);

        let first = gallery.load(&loader).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = gallery.load(&loader).unwrap();
        assert!(second > first);

        // The first batch settles first; its completion must not clear the flag
        assert!(ui_loop.run_one().await);
        assert!(gallery.is_loading());
        assert!(gallery.image(0).is_none());

        assert!(ui_loop.run_one().await);
        assert!(!gallery.is_loading());
        assert_eq!(widths(&gallery), vec![Some(4)]);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn empty_gallery_batch_clears_loading_flag() {
        let transport = Arc::new(FakeTransport::new());
        let loader = fake_loader(Arc::clone(&transport));
        let gallery = GalleryModel::from_provider(&UrlProvider::default(), LoadMode::Batch);

        gallery.load(&loader);
        assert!(gallery.is_empty());
        assert!(!gallery.is_loading());
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let gallery = GalleryModel::new(Vec::new(), LoadMode::PerItem);
        assert!(!gallery.prepare_for_reuse(3));
        assert!(gallery.image(3).is_none());
        assert_eq!(gallery.mode(), LoadMode::PerItem);
    }
}
