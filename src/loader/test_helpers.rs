//! Shared test helpers: in-process transports and fixture images.

use crate::config::Config;
use crate::context::{CallbackContext, InlineContext};
use crate::error::{Error, Result};
use crate::loader::ImageLoader;
use crate::transport::Transport;
use crate::types::ResourceRef;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Encode a blank RGBA image of the given size as PNG
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Canned response for one fake URL
#[derive(Clone, Debug)]
pub(crate) enum FakeResponse {
    /// 2xx with this body
    Body(Bytes),
    /// Non-2xx status
    Status(u16),
    /// The transport panics
    Panic,
    /// The request never settles
    Hang,
}

impl FakeResponse {
    pub(crate) fn image(width: u32, height: u32) -> Self {
        FakeResponse::Body(Bytes::from(png_bytes(width, height)))
    }

    pub(crate) fn bytes(body: Vec<u8>) -> Self {
        FakeResponse::Body(Bytes::from(body))
    }

    pub(crate) fn status(status: u16) -> Self {
        FakeResponse::Status(status)
    }
}

/// In-memory transport with per-URL responses and delays
///
/// Tracks how many requests were made and the peak number in flight.
#[derive(Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<HashMap<String, (FakeResponse, Duration)>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an immediate response and return its resource
    pub(crate) fn add(&self, url: &str, response: FakeResponse) -> ResourceRef {
        self.add_delayed(url, response, Duration::ZERO)
    }

    /// Register a response that settles after `delay`
    pub(crate) fn add_delayed(
        &self,
        url: &str,
        response: FakeResponse,
        delay: Duration,
    ) -> ResourceRef {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (response, delay));
        ResourceRef::parse(url).unwrap()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, resource: &ResourceRef) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let route = self.routes.lock().unwrap().get(resource.as_str()).cloned();
        let (response, delay) = route.unwrap_or((FakeResponse::Status(404), Duration::ZERO));

        if let FakeResponse::Panic = response {
            panic!("fake transport panic for {resource}");
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let FakeResponse::Hang = response {
            std::future::pending::<()>().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match response {
            FakeResponse::Body(body) => Ok(body),
            FakeResponse::Status(status) => Err(Error::HttpStatus {
                status,
                url: resource.to_string(),
            }),
            FakeResponse::Panic | FakeResponse::Hang => unreachable!(),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Loader over a fake transport with inline callbacks and default config
pub(crate) fn fake_loader(transport: Arc<FakeTransport>) -> ImageLoader {
    fake_loader_with(transport, Config::default(), Arc::new(InlineContext))
}

/// Loader over a fake transport with explicit config and context
pub(crate) fn fake_loader_with(
    transport: Arc<FakeTransport>,
    config: Config,
    context: Arc<dyn CallbackContext>,
) -> ImageLoader {
    ImageLoader::with_parts(config, transport, context).unwrap()
}
