//! Relay a server-filtered event stream into a [`Subscription`].

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{FollowError, SourceError};
use crate::filter::{EventFilter, StartPosition};
use crate::source::EventSource;
use crate::subscription::{channel_with_capacity, Publisher, Subscription, DEFAULT_CAPACITY};
use crate::types::BlockEvents;

/// Subscribe to `source` and forward every block of events until the stream
/// ends, errors, the consumer goes away or `cancel` fires.
pub fn spawn_events<S>(
    source: S,
    start: StartPosition,
    filter: EventFilter,
    cancel: CancellationToken,
) -> (Subscription<BlockEvents>, JoinHandle<()>)
where
    S: EventSource + 'static,
{
    let (mut publisher, subscription) = channel_with_capacity(DEFAULT_CAPACITY);
    let handle = tokio::spawn(async move {
        let result = relay_events(&source, start, &filter, &publisher, &cancel).await;
        match result {
            Ok(()) => publisher.close(),
            Err(err) => {
                tracing::error!(error = %err, "Event stream failed");
                publisher.fail(err);
            }
        }
    });
    (subscription, handle)
}

async fn relay_events<S: EventSource>(
    source: &S,
    start: StartPosition,
    filter: &EventFilter,
    publisher: &Publisher<BlockEvents>,
    cancel: &CancellationToken,
) -> Result<(), FollowError> {
    let stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(()),
        stream = source.subscribe_events(start, filter) => stream,
    };
    let stream = stream.map_err(|source| FollowError::Stream { source })?;
    tracing::info!(start = ?start, filter = ?filter, "Event stream opened");
    forward(stream, publisher, cancel).await
}

/// Forward items from `stream` to `publisher`.
///
/// End of stream, cancellation and a dropped consumer return `Ok`; a stream
/// error is returned as [`FollowError::Stream`].
pub async fn forward<T, St>(
    mut stream: St,
    publisher: &Publisher<T>,
    cancel: &CancellationToken,
) -> Result<(), FollowError>
where
    St: Stream<Item = Result<T, SourceError>> + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            next = stream.next() => next,
        };
        let Some(item) = next else {
            tracing::info!("Stream ended");
            return Ok(());
        };
        let item = item.map_err(|source| FollowError::Stream { source })?;

        let delivered = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            res = publisher.send(item) => res,
        };
        if delivered.is_err() {
            tracing::debug!("Consumer dropped the subscription");
            return Ok(());
        }
    }
}
