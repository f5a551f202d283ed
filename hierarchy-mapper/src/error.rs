/// Result alias for mapper operations; `E` is the provider's error type.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Errors surfaced by [`crate::HierarchyMapper`].
///
/// "Not found" outcomes (an item that is not visible, a parent that cannot be resolved) are
/// not errors; they are reported as `Ok(None)`.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error<E> {
    /// The root (`None`) was passed where an item identity is required.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The backing provider failed. Nothing fetched by the failing call was committed.
    #[error(transparent)]
    Provider(E),
}

impl<E> Error<E> {
    pub fn provider(&self) -> Option<&E> {
        match self {
            Self::Provider(e) => Some(e),
            Self::InvalidArgument(_) => None,
        }
    }
}
