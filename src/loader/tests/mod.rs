use super::test_helpers::*;
use super::*;
use crate::context::ui_context;
use crate::types::{BatchId, FetchResult, Image, Outcome, ResourceRef};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
