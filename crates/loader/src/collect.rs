use crate::error::{Error, ErrorKind};
use crate::{LoaderHandle, Request, Sink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::instrument;

/// Knobs for one collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectOptions {
    /// Give up on a loader after this long and report it as timed out.
    pub loader_timeout: Option<Duration>,
}

/// Everything the loaders emitted, in no particular order.
#[derive(Debug)]
pub struct Collected<D> {
    pub documents: Vec<D>,
    pub errors: Vec<Error>,
}

impl<D> Default for Collected<D> {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Run every loader concurrently and gather what they emit.
///
/// Never aborts early: all successes and all failures come back together.
/// A loader that outlives `options.loader_timeout`, or is still running when
/// the request is cancelled, is dropped and reported as an error.
#[instrument(skip_all, fields(
    coordinate = %request.coordinate,
    vulnerability = %request.vulnerability,
    loaders = loaders.len(),
    documents,
    errors,
))]
pub async fn collect<D: Send + 'static>(
    request: &Request,
    loaders: &[LoaderHandle<D>],
    options: &CollectOptions,
) -> Collected<D> {
    let (sink, mut document_rx, mut error_rx) = Sink::channel();
    let documents = tokio::spawn(async move {
        let mut documents = Vec::new();
        while let Some(document) = document_rx.recv().await {
            documents.push(document);
        }
        documents
    });
    let errors = tokio::spawn(async move {
        let mut errors = Vec::new();
        while let Some(error) = error_rx.recv().await {
            errors.push(error);
        }
        errors
    });

    fan_out(request, loaders, &sink, options).await;
    // Every loader task has finished and released its clone, so dropping the
    // last sender lets both drains run to completion.
    drop(sink);

    let collected = Collected {
        documents: documents.await.unwrap_or_default(),
        errors: errors.await.unwrap_or_default(),
    };
    tracing::Span::current().record("documents", collected.documents.len());
    tracing::Span::current().record("errors", collected.errors.len());
    collected
}

/// One task per loader, all feeding `sink`; returns when every task is done.
pub(crate) async fn fan_out<D: Send + 'static>(
    request: &Request,
    loaders: &[LoaderHandle<D>],
    sink: &Sink<D>,
    options: &CollectOptions,
) {
    let mut tasks = JoinSet::new();
    let mut names = HashMap::with_capacity(loaders.len());
    for loader in loaders {
        let name = loader.name().to_string();
        let handle = tasks.spawn(run_loader(
            Arc::clone(loader),
            request.clone(),
            sink.clone(),
            options.loader_timeout,
        ));
        names.insert(handle.id(), name);
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            let name = names.remove(&err.id()).unwrap_or_default();
            tracing::error!(loader = %name, "loader task failed: {err}");
            sink.error(exn::Exn::from(ErrorKind::Panicked(name)));
        }
    }
}

async fn run_loader<D: Send + 'static>(
    loader: LoaderHandle<D>,
    request: Request,
    sink: Sink<D>,
    timeout: Option<Duration>,
) {
    let name = loader.name();
    let load = async {
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, loader.load_vex(&request, &sink))
                .await
                .map_err(|_| ErrorKind::TimedOut(name.to_string())),
            None => {
                loader.load_vex(&request, &sink).await;
                Ok(())
            },
        }
    };
    let outcome = tokio::select! {
        outcome = load => outcome,
        () = request.cancellation().cancelled() => Err(ErrorKind::Cancelled(name.to_string())),
    };
    if let Err(kind) = outcome {
        tracing::warn!(loader = %name, "{kind}");
        sink.error(exn::Exn::from(kind));
    }
}
