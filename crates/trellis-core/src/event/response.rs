//! The aggregated result of one trigger.

use super::listener::ListenerHandle;

/// Why a trigger halted before running every listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The `trigger_until` condition matched a listener's return value.
    Condition,
    /// A listener set the stop-propagation flag on the payload.
    Propagation,
}

/// Values returned by the listeners of one trigger, in call order.
#[derive(Debug, Clone)]
pub struct ResponseCollection<R> {
    responses: Vec<R>,
    stopped: Option<(ListenerHandle, StopCause)>,
}

impl<R> Default for ResponseCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ResponseCollection<R> {
    /// Creates an empty, non-stopped collection.
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            stopped: None,
        }
    }

    pub(crate) fn push(&mut self, response: R) {
        self.responses.push(response);
    }

    pub(crate) fn mark_stopped(&mut self, by: ListenerHandle, cause: StopCause) {
        self.stopped = Some((by, cause));
    }

    /// Returns `true` if iteration halted early.
    pub fn stopped(&self) -> bool {
        self.stopped.is_some()
    }

    /// Returns the listener that halted iteration, if any.
    pub fn stopped_by(&self) -> Option<ListenerHandle> {
        self.stopped.map(|(handle, _)| handle)
    }

    /// Returns why iteration halted, if it did.
    pub fn stop_cause(&self) -> Option<StopCause> {
        self.stopped.map(|(_, cause)| cause)
    }

    /// Returns the first listener's value.
    pub fn first(&self) -> Option<&R> {
        self.responses.first()
    }

    /// Returns the most recent listener's value.
    pub fn last(&self) -> Option<&R> {
        self.responses.last()
    }

    /// Number of listeners that ran.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns `true` if no listener ran.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Iterates the values in call order.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.responses.iter()
    }

    /// Consumes the collection, returning the values in call order.
    pub fn into_vec(self) -> Vec<R> {
        self.responses
    }
}

impl<R: PartialEq> ResponseCollection<R> {
    /// Returns `true` if any listener returned `value`.
    pub fn contains(&self, value: &R) -> bool {
        self.responses.contains(value)
    }
}

impl<R> IntoIterator for ResponseCollection<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.into_iter()
    }
}
