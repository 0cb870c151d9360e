//! Timeout governor racing a background task against a deadline.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{ChannelError, Result};

/// Run `task` on its own tokio task and wait for its result or `deadline`,
/// whichever comes first.
///
/// The task delivers its result over a single-use channel. If the deadline
/// wins, the task is aborted and awaited before this returns, so anything it
/// owns (such as the read half of a connection) has been dropped. A result
/// arriving after that is discarded with the task.
///
/// `budget` is only used to report the timeout.
pub async fn race<F, T>(task: F, deadline: Instant, budget: Duration) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let (tx, mut rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let _ = tx.send(task.await);
    });

    let outcome = tokio::select! {
        biased;

        delivered = &mut rx => match delivered {
            Ok(result) => result,
            Err(_) => Err(ChannelError::MatcherLost.into()),
        },

        _ = tokio::time::sleep_until(deadline) => {
            debug!("governor: deadline of {:?} elapsed, aborting matcher", budget);
            handle.abort();
            Err(ChannelError::Timeout(budget).into())
        }
    };

    if let Err(e) = handle.await {
        if e.is_panic() {
            warn!("governor: matcher task panicked: {}", e);
        }
    }

    outcome
}
