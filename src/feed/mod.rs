//! The fetch-merge-cache pipeline: everything between "should we call the
//! remote?" and "what ends up in the cache".

pub mod channels;
pub mod duration;
pub mod merge;
pub mod orchestrator;
pub mod policy;
pub mod resolver;
pub mod share;
pub mod uploads;
pub mod videos;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cooperative cancellation, checked only between remote calls.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
