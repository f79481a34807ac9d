/// # Outcome
///
/// How a submitted item was resolved.
///
/// Every result handle resolves to exactly one outcome. Only [`Outcome::Processed`]
/// carries a model result; the other variants describe why there is none.
/// [`Outcome::unwrap_or_default`] collapses them to `O::default()`, which is what
/// [`ResultHandle::wait`](crate::ResultHandle::wait) returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<O> {
    /// The model produced a result for this item.
    Processed(O),

    /// The item was in a batch but the model returned fewer results than inputs.
    Shortfall,

    /// The dispatcher was stopped before the item reached the model.
    Cancelled,

    /// The worker went away without resolving the item, e.g. the model panicked
    /// mid-batch.
    Abandoned,
}

impl<O> Outcome<O> {
    /// Whether the model produced a result for this item.
    pub fn is_processed(&self) -> bool {
        matches!(self, Outcome::Processed(_))
    }

    /// Borrows the model result, if there is one.
    pub fn value(&self) -> Option<&O> {
        match self {
            Outcome::Processed(value) => Some(value),
            _ => None,
        }
    }

    /// Takes the model result; `None` for shortfall, cancellation and abandonment.
    pub fn into_value(self) -> Option<O> {
        match self {
            Outcome::Processed(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the processed value, or `O::default()` for every other outcome.
    pub fn unwrap_or_default(self) -> O
    where
        O: Default,
    {
        self.into_value().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_value() {
        let outcome = Outcome::Processed(7);
        assert!(outcome.is_processed());
        assert_eq!(outcome.value(), Some(&7));
        assert_eq!(outcome.into_value(), Some(7));
    }

    #[test]
    fn test_fallbacks_collapse_to_default() {
        for outcome in [Outcome::<Vec<u8>>::Shortfall, Outcome::Cancelled, Outcome::Abandoned] {
            assert!(!outcome.is_processed());
            assert_eq!(outcome.unwrap_or_default(), Vec::<u8>::new());
        }
    }
}
