/// Correlates an in-flight model load with the model selection that started
/// it.
///
/// Data loads resolve asynchronously; by the time a response arrives the
/// user may have switched models. A ticket is minted when the load starts
/// and checked before its result is committed, so a late response for a
/// superseded model can never overwrite the new model's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    model: String,
    generation: u64,
}

impl LoadTicket {
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Default)]
pub struct LoadTracker {
    model: Option<String>,
    generation: u64,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a load for `model`, superseding any load still in flight.
    pub fn begin(&mut self, model: impl Into<String>) -> LoadTicket {
        let model = model.into();
        self.generation += 1;
        self.model = Some(model.clone());
        LoadTicket {
            model,
            generation: self.generation,
        }
    }

    /// Whether a response carrying `ticket` may be committed.
    ///
    /// Only the ticket from the most recent `begin` is current; everything
    /// older is stale and must be discarded by the caller.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation && self.model.as_deref() == Some(&ticket.model)
    }

    pub fn current_model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::LoadTracker;

    #[test]
    fn latest_ticket_is_current() {
        let mut tracker = LoadTracker::new();
        let t = tracker.begin("model-a");
        assert!(tracker.is_current(&t));
        assert_eq!(tracker.current_model(), Some("model-a"));
    }

    #[test]
    fn superseded_ticket_is_rejected() {
        let mut tracker = LoadTracker::new();
        let old = tracker.begin("model-a");
        let new = tracker.begin("model-b");

        // The old model's response arrives after the switch.
        assert!(!tracker.is_current(&old));
        assert!(tracker.is_current(&new));
    }

    #[test]
    fn reloading_the_same_model_still_supersedes() {
        let mut tracker = LoadTracker::new();
        let first = tracker.begin("model-a");
        let second = tracker.begin("model-a");
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
    }
}
