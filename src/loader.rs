//! Parallel, order-preserving image preloading.
//!
//! Loading happens in two layers:
//! 1. [`load_images`] starts every load at once and reports each completion
//!    as it happens, in completion order.
//! 2. [`preload`] collects those completions back into input order and adds
//!    a deadline, producing the image set the player plays from.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{self, Either};
use futures::stream::{FuturesUnordered, StreamExt};

use crate::{FrameClock, LoadError, PreloadError};

/// Trait for async image sources.
///
/// Implement this trait to decode images from your specific I/O mechanism
/// (DOM image elements, filesystem, network, etc.). A load that is already
/// cached may return a future that is ready on its first poll; it is counted
/// exactly like one that completes later.
///
/// No `Send` bounds: works in both native and WASM (single-threaded) contexts.
pub trait ImageLoader {
    /// Decoded image handle
    type Image;

    /// Load and decode the image at `source`.
    fn load(&self, source: &str) -> impl Future<Output = Result<Self::Image, LoadError>>;
}

/// Progress reported for each completed load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    /// Loads finished so far, including this one
    pub completed: usize,
    /// Loads requested
    pub total: usize,
    /// `completed == total`
    pub is_complete: bool,
    /// Input position of the image that just finished
    pub index: usize,
}

impl LoadProgress {
    /// Loading percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.completed as f32 / self.total as f32) * 100.0) as u8
        }
    }
}

/// Images indexed by their input position.
///
/// Positions fill in whatever order loads finish; the set is ready only
/// once every position holds an image.
#[derive(Clone, Debug)]
pub struct LoadedImageSet<I> {
    slots: Vec<Option<I>>,
    filled: usize,
}

impl<I> LoadedImageSet<I> {
    /// Create an empty set with `len` positions.
    pub fn new(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self { slots, filled: 0 }
    }

    /// Store the image for position `index`. Out-of-range indices are ignored.
    pub fn insert(&mut self, index: usize, image: I) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.replace(image).is_none() {
                self.filled += 1;
            }
        }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the set has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of positions holding an image.
    #[inline]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Every position holds an image.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Image at `index`, if it has loaded.
    pub fn get(&self, index: usize) -> Option<&I> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// The images in input order, if the set is ready.
    pub fn into_ordered(self) -> Option<Vec<I>> {
        self.slots.into_iter().collect()
    }
}

/// Start every load at once and report each completion as it happens.
///
/// `on_loaded` receives the progress and the decoded image, in completion
/// order. The first failure stops the remaining loads and is returned.
pub async fn load_images<L, F>(loader: &L, sources: &[String], mut on_loaded: F) -> Result<(), LoadError>
where
    L: ImageLoader,
    F: FnMut(LoadProgress, L::Image),
{
    let total = sources.len();
    let mut pending: FuturesUnordered<_> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| async move { (index, loader.load(source).await) })
        .collect();

    let mut completed = 0;
    while let Some((index, result)) = pending.next().await {
        let image = result?;
        completed += 1;
        let progress = LoadProgress {
            completed,
            total,
            is_complete: completed == total,
            index,
        };
        log::debug!("loaded image {} ({}/{})", index, completed, total);
        on_loaded(progress, image);
    }
    Ok(())
}

/// Load every source and return the images in input order.
///
/// Resolves exactly once: with the full set, with the first load failure,
/// or with [`PreloadError::Timeout`] when `timeout` elapses on `clock` first.
///
/// ## Example
///
/// ```rust
/// use frameseq_player::{preload, ImageLoader, LoadError, ThreadClock};
/// use std::future::{ready, Future};
///
/// struct Lengths;
///
/// impl ImageLoader for Lengths {
///     type Image = usize;
///     fn load(&self, source: &str) -> impl Future<Output = Result<usize, LoadError>> {
///         ready(Ok(source.len()))
///     }
/// }
///
/// let sources = vec!["a".to_string(), "bbb".to_string()];
/// let images = futures::executor::block_on(
///     preload(&Lengths, &ThreadClock::default(), &sources, None, |_| {}),
/// )
/// .unwrap();
/// assert_eq!(images, vec![1, 3]);
/// ```
pub async fn preload<L, C, F>(
    loader: &L,
    clock: &C,
    sources: &[String],
    timeout: Option<Duration>,
    mut on_progress: F,
) -> Result<Vec<L::Image>, PreloadError>
where
    L: ImageLoader,
    C: FrameClock,
    F: FnMut(&LoadProgress),
{
    let total = sources.len();
    let mut set = LoadedImageSet::new(total);

    let outcome = {
        let loading = load_images(loader, sources, |progress, image| {
            on_progress(&progress);
            set.insert(progress.index, image);
        });
        match timeout {
            None => Some(loading.await),
            Some(limit) => {
                let loading = pin!(loading);
                let deadline = pin!(clock.sleep(limit));
                match future::select(loading, deadline).await {
                    Either::Left((result, _)) => Some(result),
                    Either::Right(_) => None,
                }
            }
        }
    };

    match outcome {
        Some(Ok(())) => {
            let loaded = set.filled();
            set.into_ordered().ok_or(PreloadError::Incomplete { loaded, total })
        }
        Some(Err(err)) => {
            log::warn!("{}", err);
            Err(PreloadError::Load(err))
        }
        None => {
            let after = timeout.unwrap_or_default();
            log::warn!("preload timed out after {:?} with {}/{} images", after, set.filled(), total);
            Err(PreloadError::Timeout {
                after,
                loaded: set.filled(),
                total,
            })
        }
    }
}

/// Browser image loading through `HtmlImageElement`.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::HtmlImageElement;

    /// Loads sources by assigning them to fresh `<img>` elements.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct WebImageLoader;

    impl WebImageLoader {
        /// Create an `<img>`-backed loader.
        pub fn new() -> Self {
            Self
        }
    }

    async fn load_element(source: String) -> Result<HtmlImageElement, LoadError> {
        let image = HtmlImageElement::new().map_err(|_| LoadError::new(&source, "Failed to create image element"))?;
        image.set_src(&source);

        // Cached images are complete as soon as `src` is assigned.
        if image.complete() && image.natural_width() > 0 {
            return Ok(image);
        }

        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            image.set_onload(Some(&resolve));
            image.set_onerror(Some(&reject));
        });
        let result = JsFuture::from(promise).await;
        image.set_onload(None);
        image.set_onerror(None);
        result.map_err(|_| LoadError::new(&source, "Image failed to load"))?;
        Ok(image)
    }

    impl ImageLoader for WebImageLoader {
        type Image = HtmlImageElement;

        fn load(&self, source: &str) -> impl Future<Output = Result<HtmlImageElement, LoadError>> {
            load_element(source.to_owned())
        }
    }
}

/// Filesystem image loading through the `image` crate.
#[cfg(feature = "raster")]
pub mod raster {
    use super::*;
    use image::RgbaImage;
    use std::path::{Path, PathBuf};

    /// Decodes image files, optionally relative to a root directory.
    ///
    /// Decoding is synchronous, so every load is ready on its first poll.
    #[derive(Clone, Debug, Default)]
    pub struct FileLoader {
        root: Option<PathBuf>,
    }

    impl FileLoader {
        /// Loader resolving sources against the working directory.
        pub fn new() -> Self {
            Self::default()
        }

        /// Resolve relative sources against `root`.
        pub fn with_root(root: impl Into<PathBuf>) -> Self {
            Self { root: Some(root.into()) }
        }

        fn resolve(&self, source: &str) -> PathBuf {
            match &self.root {
                Some(root) => root.join(source),
                None => Path::new(source).to_path_buf(),
            }
        }
    }

    impl ImageLoader for FileLoader {
        type Image = RgbaImage;

        fn load(&self, source: &str) -> impl Future<Output = Result<RgbaImage, LoadError>> {
            let decoded = image::open(self.resolve(source))
                .map(|image| image.to_rgba8())
                .map_err(|err| LoadError::new(source, err.to_string()));
            future::ready(decoded)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::testing::ManualClock;
        use futures::executor::block_on;
        use image::Rgba;

        #[test]
        fn test_loads_files_in_order() {
            let dir = tempfile::tempdir().unwrap();
            for (name, shade) in [("a.png", 10u8), ("b.png", 20), ("c.png", 30)] {
                RgbaImage::from_pixel(3, 2, Rgba([shade, 0, 0, 255]))
                    .save(dir.path().join(name))
                    .unwrap();
            }
            let sources: Vec<String> = ["c.png", "a.png", "b.png"].iter().map(|s| s.to_string()).collect();
            let loader = FileLoader::with_root(dir.path());
            let images = block_on(preload(&loader, &ManualClock::new(), &sources, None, |_| {})).unwrap();

            let shades: Vec<u8> = images.iter().map(|i| i.get_pixel(0, 0).0[0]).collect();
            assert_eq!(shades, vec![30, 10, 20]);
            assert_eq!(images[0].dimensions(), (3, 2));
        }

        #[test]
        fn test_missing_file_fails() {
            let dir = tempfile::tempdir().unwrap();
            let loader = FileLoader::with_root(dir.path());
            let sources = vec!["missing.png".to_string()];
            let err = block_on(preload(&loader, &ManualClock::new(), &sources, None, |_| {})).unwrap_err();
            match err {
                PreloadError::Load(err) => assert_eq!(err.source_url, "missing.png"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
