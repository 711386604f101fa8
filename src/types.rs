//! Core types for gallery-fetch

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::error::{Error, Result};

/// Locator of a downloadable image
///
/// Immutable once built. Cloning copies the URL string, never the image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceRef(Url);

impl ResourceRef {
    /// Parse a resource locator from a URL string
    pub fn parse(input: &str) -> Result<Self> {
        Url::parse(input)
            .map(Self)
            .map_err(|source| Error::InvalidUrl {
                input: input.to_string(),
                source,
            })
    }

    /// Borrow the underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// URL as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Url> for ResourceRef {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl std::str::FromStr for ResourceRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded image payload
///
/// Pixels live behind an `Arc`, so handing the same image to a result slot,
/// an event subscriber and a gallery cell never copies pixel data.
#[derive(Clone, Debug)]
pub struct Image(Arc<DynamicImage>);

impl Image {
    /// Wrap a decoded image
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Borrow the decoded image
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.0
    }

    /// Whether two handles share the same decoded pixels
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<DynamicImage> for Image {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// Final outcome of one fetch attempt
///
/// Transport errors, non-2xx responses, empty bodies and undecodable bodies
/// are not distinguished: they all settle as `Failure`.
#[derive(Clone, Debug)]
pub enum FetchResult {
    /// Bytes were retrieved and decoded
    Success(Image),
    /// No image was produced
    Failure,
}

impl FetchResult {
    /// Whether an image was produced
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    /// Borrow the image, if any
    pub fn image(&self) -> Option<&Image> {
        match self {
            FetchResult::Success(image) => Some(image),
            FetchResult::Failure => None,
        }
    }

    /// Convert into the slot representation used by batches
    pub fn into_image(self) -> Option<Image> {
        match self {
            FetchResult::Success(image) => Some(image),
            FetchResult::Failure => None,
        }
    }

    /// Payload-free outcome, for events and logs
    pub fn outcome(&self) -> Outcome {
        match self {
            FetchResult::Success(_) => Outcome::Succeeded,
            FetchResult::Failure => Outcome::Failed,
        }
    }
}

/// Payload-free fetch outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// An image was produced
    Succeeded,
    /// No image was produced
    Failed,
}

/// Identifier assigned to each batch started by a coordinator
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl BatchId {
    /// Get the inner value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a gallery populates its cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Each cell fetches its own image and shows it as soon as it settles
    PerItem,
    /// All images are fetched together and shown at once after the last settles
    #[default]
    Batch,
}

/// Summary of a settled batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Batch this report belongs to
    pub batch_id: BatchId,
    /// Number of requested resources
    pub total: usize,
    /// Number of slots holding an image
    pub succeeded: usize,
    /// Number of empty slots
    pub failed: usize,
    /// Wall time from start to the last settled fetch, in milliseconds
    pub elapsed_ms: u64,
}

/// Event emitted while fetching
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch was started
    BatchStarted {
        /// Batch ID
        batch_id: BatchId,
        /// Number of resources in the batch
        total: usize,
    },

    /// One fetch settled
    ItemSettled {
        /// Owning batch (None for per-item fetches)
        #[serde(skip_serializing_if = "Option::is_none")]
        batch_id: Option<BatchId>,
        /// Slot index within the batch (None for per-item fetches)
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        /// Requested URL
        url: String,
        /// Whether an image was produced
        outcome: Outcome,
    },

    /// Every fetch of a batch settled and the completion was dispatched
    BatchComplete(BatchReport),
}
