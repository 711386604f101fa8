//! Source of the ordered image URL list

use crate::config::Config;
use crate::error::Result;
use crate::types::ResourceRef;

/// Fixed, ordered list of resources a gallery displays
///
/// The order is the display order; batch results are index-aligned with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlProvider {
    urls: Vec<ResourceRef>,
}

impl UrlProvider {
    /// Wrap an already-parsed list
    pub fn new(urls: Vec<ResourceRef>) -> Self {
        Self { urls }
    }

    /// Parse every entry, failing on the first invalid URL
    pub fn parse<I, S>(inputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = inputs
            .into_iter()
            .map(|s| ResourceRef::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { urls })
    }

    /// Build from the `urls` list of a configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::parse(&config.urls)
    }

    /// Borrow the resources in display order
    pub fn urls(&self) -> &[ResourceRef] {
        &self.urls
    }

    /// Take ownership of the resources
    pub fn into_refs(self) -> Vec<ResourceRef> {
        self.urls
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
