use crate::{PackageCoordinate, VulnerabilityId};
use tokio_util::sync::CancellationToken;

/// One lookup: a package, an optional vulnerability, and a way to give up.
#[derive(Clone, Debug)]
pub struct Request {
    pub coordinate: PackageCoordinate,
    pub vulnerability: VulnerabilityId,
    cancellation: CancellationToken,
}

impl Request {
    pub fn new(coordinate: PackageCoordinate, vulnerability: impl Into<VulnerabilityId>) -> Self {
        Self {
            coordinate,
            vulnerability: vulnerability.into(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Tie this request to an existing token, e.g. a caller's deadline.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
