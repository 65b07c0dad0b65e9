use crate::error::{ErrorKind, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// How many underlying pulls may run at once across a whole cache.
///
/// Injected at cache construction; there is no process-wide default.
#[derive(Clone, Debug, Default)]
pub enum FetchPool {
    /// No cap.
    #[default]
    Unbounded,
    /// At most this many pulls in flight.
    Bounded(Arc<Semaphore>),
}

impl FetchPool {
    /// A pool capped at `max` concurrent pulls. Zero means unbounded.
    pub fn bounded(max: usize) -> Self {
        match max {
            0 => Self::Unbounded,
            max => Self::Bounded(Arc::new(Semaphore::new(max))),
        }
    }

    pub(crate) async fn run<F: Future>(&self, pull: F) -> Result<F::Output> {
        match self {
            Self::Unbounded => Ok(pull.await),
            Self::Bounded(semaphore) => {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| exn::Exn::from(ErrorKind::PoolClosed))?;
                Ok(pull.await)
            },
        }
    }
}
