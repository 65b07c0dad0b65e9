use crate::error::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Where loaders emit documents and errors.
///
/// Cloning is cheap; every clone feeds the same collection. Sends never
/// block, and items sent after the collection has finished are discarded.
pub struct Sink<D> {
    documents: UnboundedSender<D>,
    errors: UnboundedSender<Error>,
}

impl<D> Clone for Sink<D> {
    fn clone(&self) -> Self {
        Self {
            documents: self.documents.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<D> Sink<D> {
    pub(crate) fn channel() -> (Self, UnboundedReceiver<D>, UnboundedReceiver<Error>) {
        let (documents, document_rx) = unbounded_channel();
        let (errors, error_rx) = unbounded_channel();
        (Self { documents, errors }, document_rx, error_rx)
    }

    pub fn document(&self, document: D) {
        if self.documents.send(document).is_err() {
            tracing::debug!("document emitted after collection finished");
        }
    }

    pub fn error(&self, error: Error) {
        if self.errors.send(error).is_err() {
            tracing::debug!("error emitted after collection finished");
        }
    }

    /// Emit whichever side of `result` is present.
    pub fn emit(&self, result: crate::error::Result<D>) {
        match result {
            Ok(document) => self.document(document),
            Err(error) => self.error(error),
        }
    }
}
