//! Request cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{MatchError, Result};

/// Shared abort flag plus an optional deadline. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
	flag: Arc<AtomicBool>,
	deadline: Option<Instant>,
}

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_timeout(timeout: Duration) -> Self {
		Self { flag: Arc::default(), deadline: Some(Instant::now() + timeout) }
	}

	pub fn cancel(&self) {
		self.flag.store(true, Ordering::Release);
	}

	pub fn is_cancelled(&self) -> bool {
		self.flag.load(Ordering::Acquire) || self.deadline.is_some_and(|d| Instant::now() >= d)
	}

	/// Stage boundary check
	pub fn check(&self) -> Result<()> {
		if self.is_cancelled() {
			Err(MatchError::Cancelled)
		} else {
			Ok(())
		}
	}
}
