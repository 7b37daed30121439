use futures::future::join_all;
use kiln_domain::error::Error;
use std::fmt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of one asynchronous observer invocation
#[derive(Debug)]
pub enum ObserverOutcome {
    /// The observer ran and returned normally
    Delivered,
    /// Conditional observer whose owner did not exist
    Skipped,
    /// The observer failed; the error stays here and never reaches the firing caller
    Failed(Error),
    /// Cancelled before it started
    Cancelled,
}

impl ObserverOutcome {
    /// Whether the observer ran successfully
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether the observer was cancelled before it started
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Aggregated outcomes of one asynchronous delivery, in observer order
#[derive(Debug, Default)]
pub struct DeliveryReport {
    outcomes: Vec<(String, ObserverOutcome)>,
}

impl DeliveryReport {
    /// Every (observer id, outcome) pair
    pub fn outcomes(&self) -> &[(String, ObserverOutcome)] {
        &self.outcomes
    }

    /// Outcome of one observer
    pub fn outcome(&self, observer: &str) -> Option<&ObserverOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == observer)
            .map(|(_, outcome)| outcome)
    }

    /// Errors raised by observers
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            ObserverOutcome::Failed(err) => Some((id.as_str(), err)),
            _ => None,
        })
    }

    /// Number of observers that ran successfully
    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_delivered())
            .count()
    }

    /// Number of observers cancelled before they started
    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_cancelled())
            .count()
    }

    /// Whether no observer failed
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Number of observers
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether there were no asynchronous observers
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Completion handle of the asynchronous observers of one fired event
///
/// Dropping it neither waits nor cancels.
pub struct AsyncDelivery {
    tasks: Vec<(String, JoinHandle<ObserverOutcome>)>,
    token: CancellationToken,
}

impl AsyncDelivery {
    pub(crate) fn new(tasks: Vec<(String, JoinHandle<ObserverOutcome>)>, token: CancellationToken) -> Self {
        Self { tasks, token }
    }

    /// Handle with nothing to wait for
    pub fn empty() -> Self {
        Self::new(Vec::new(), CancellationToken::new())
    }

    /// Cancel the invocations that have not started; running ones complete
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Number of asynchronous observers notified
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no asynchronous observer matched
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every invocation
    pub async fn wait(self) -> DeliveryReport {
        let (ids, handles): (Vec<String>, Vec<_>) = self.tasks.into_iter().unzip();
        let results = join_all(handles).await;
        let outcomes = ids
            .into_iter()
            .zip(results)
            .map(|(id, result)| {
                let outcome = result.unwrap_or_else(|join| {
                    if join.is_cancelled() {
                        ObserverOutcome::Cancelled
                    } else {
                        ObserverOutcome::Failed(Error::observer_invocation(&id, format!("observer panicked: {join}")))
                    }
                });
                (id, outcome)
            })
            .collect();
        DeliveryReport { outcomes }
    }

    /// Wait for every invocation from synchronous code
    ///
    /// Must not be called from inside an async task.
    pub fn wait_blocking(self) -> DeliveryReport {
        futures::executor::block_on(self.wait())
    }
}

impl fmt::Debug for AsyncDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observers: Vec<&str> = self.tasks.iter().map(|(id, _)| id.as_str()).collect();
        f.debug_struct("AsyncDelivery")
            .field("observers", &observers)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
