//! Termination causes reported by contexts.

/// Why a context ended.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The context was cancelled explicitly, or inherited a cancellation.
    #[error("context canceled")]
    Canceled,

    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// No background watcher or timer could be started for the context, so
    /// it was ended rather than left unable to ever end.
    #[error("context watcher unavailable: {reason}")]
    WatcherUnavailable { reason: String },

    /// Several causes aggregated from combined contexts, in left-to-right order.
    #[error("{}", join_messages(.0))]
    Joined(Vec<ContextError>),
}

fn join_messages(causes: &[ContextError]) -> String {
    causes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ContextError {
    /// Aggregate two optional causes.
    ///
    /// Absent sides are dropped. Returns `None` when both are absent and the
    /// single cause unchanged when only one is present.
    pub fn join(left: Option<ContextError>, right: Option<ContextError>) -> Option<ContextError> {
        let mut causes: Vec<ContextError> = left
            .into_iter()
            .chain(right)
            .flat_map(ContextError::into_causes)
            .collect();

        match causes.len() {
            0 => None,
            1 => causes.pop(),
            _ => Some(ContextError::Joined(causes)),
        }
    }

    /// Iterate over the leaf causes, flattening joins.
    pub fn causes(&self) -> Box<dyn Iterator<Item = &ContextError> + '_> {
        match self {
            ContextError::Joined(causes) => Box::new(causes.iter().flat_map(|c| c.causes())),
            leaf => Box::new(std::iter::once(leaf)),
        }
    }

    fn into_causes(self) -> Vec<ContextError> {
        match self {
            ContextError::Joined(causes) => causes
                .into_iter()
                .flat_map(ContextError::into_causes)
                .collect(),
            leaf => vec![leaf],
        }
    }

    /// Returns true if any cause is a cancellation.
    pub fn is_canceled(&self) -> bool {
        self.causes().any(|c| matches!(c, ContextError::Canceled))
    }

    /// Returns true if any cause is an expired deadline.
    pub fn is_deadline_exceeded(&self) -> bool {
        self.causes()
            .any(|c| matches!(c, ContextError::DeadlineExceeded))
    }
}
