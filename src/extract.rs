//! Metadata extraction fan-out.
//!
//! Each image is independent, so extraction can run in any order and in
//! parallel. Results are joined and then normalized as a whole, which also
//! restores time order regardless of completion order.
//!
//! - [`extract_waypoints`] - blocking; uses rayon with the `parallel` feature
//! - [`extract_waypoints_async`] - bounded concurrent fan-out on tokio
//!   (`async` feature), with progress reporting

use log::{debug, info, warn};

use crate::exif::MetadataExtractor;
use crate::normalize::clean_waypoints;
use crate::Waypoint;

#[cfg(feature = "async")]
use std::sync::atomic::{AtomicU32, Ordering};
#[cfg(feature = "async")]
use std::sync::Arc;

/// An encoded image held in memory.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// File name, used as the waypoint name
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

/// Run the extractor on one image. Failures are logged and yield `None`.
fn extract_one<E: MetadataExtractor + ?Sized>(extractor: &E, source: &ImageSource) -> Option<Waypoint> {
    match extractor.extract(&source.name, &source.bytes) {
        Ok(Some(tags)) => match tags.to_waypoint(&source.name) {
            Ok(wp) => Some(wp),
            Err(e) => {
                warn!("[Extract] {}", e);
                None
            }
        },
        Ok(None) => {
            debug!("[Extract] '{}' has no GPS metadata", source.name);
            None
        }
        Err(e) => {
            warn!("[Extract] {}", e);
            None
        }
    }
}

/// Extract waypoints from every image and normalize the result.
///
/// Images without usable GPS data are skipped. With the `parallel` feature the
/// extractor runs on the rayon pool.
pub fn extract_waypoints<E: MetadataExtractor + ?Sized>(
    extractor: &E,
    sources: &[ImageSource],
) -> Vec<Waypoint> {
    let start = std::time::Instant::now();

    #[cfg(feature = "parallel")]
    let waypoints: Vec<Waypoint> = {
        use rayon::prelude::*;
        sources
            .par_iter()
            .filter_map(|source| extract_one(extractor, source))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let waypoints: Vec<Waypoint> = sources
        .iter()
        .filter_map(|source| extract_one(extractor, source))
        .collect();

    info!(
        "[Extract] {} of {} images had GPS data ({:?})",
        waypoints.len(),
        sources.len(),
        start.elapsed()
    );

    clean_waypoints(waypoints)
}

/// Progress callback type: `(completed, total)`
#[cfg(feature = "async")]
pub type ProgressCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Configuration for the async extraction fan-out.
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Maximum number of images decoded at once
    pub max_concurrency: usize,
}

#[cfg(feature = "async")]
impl Default for ExtractConfig {
    fn default() -> Self {
        Self { max_concurrency: 16 }
    }
}

/// Extract waypoints concurrently and normalize the joined result.
///
/// Each image is decoded on tokio's blocking pool, with at most
/// `config.max_concurrency` in flight. `on_progress` is called after every
/// image, in completion order.
#[cfg(feature = "async")]
pub async fn extract_waypoints_async<E>(
    extractor: Arc<E>,
    sources: Vec<ImageSource>,
    config: &ExtractConfig,
    on_progress: Option<ProgressCallback>,
) -> Vec<Waypoint>
where
    E: MetadataExtractor + 'static,
{
    use futures::stream::{self, StreamExt};

    let total = sources.len() as u32;
    let completed = Arc::new(AtomicU32::new(0));
    let start = std::time::Instant::now();

    info!(
        "[Extract] starting async extraction of {} images (max concurrent: {})",
        total, config.max_concurrency
    );

    let results: Vec<Option<Waypoint>> = stream::iter(sources)
        .map(|source| {
            let extractor = Arc::clone(&extractor);
            let completed = Arc::clone(&completed);
            let callback = on_progress.clone();

            async move {
                let name = source.name.clone();
                let result = tokio::task::spawn_blocking(move || extract_one(extractor.as_ref(), &source))
                    .await
                    .unwrap_or_else(|e| {
                        warn!("[Extract] task for '{}' failed: {}", name, e);
                        None
                    });

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref cb) = callback {
                    cb(done, total);
                }

                result
            }
        })
        .buffer_unordered(config.max_concurrency.max(1))
        .collect()
        .await;

    let waypoints: Vec<Waypoint> = results.into_iter().flatten().collect();

    info!(
        "[Extract] DONE: {} of {} images had GPS data in {:.2}s",
        waypoints.len(),
        total,
        start.elapsed().as_secs_f64()
    );

    clean_waypoints(waypoints)
}
