use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Shared error carried by an error end.
///
/// Wraps any `Error + Send + Sync` behind an `Arc`. Clones point at the same
/// underlying error, so an end that is signalled repeatedly can be checked
/// with [`StreamError::ptr_eq`], and the original type is recoverable with
/// [`StreamError::downcast_ref`].
#[derive(Clone)]
pub struct StreamError(Arc<dyn Error + Send + Sync + 'static>);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl StreamError {
    /// Wrap an error.
    pub fn new<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(err))
    }

    /// An error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Borrow the wrapped error as its concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Returns `true` if the wrapped error is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: Error + 'static,
    {
        self.0.is::<E>()
    }

    /// Returns `true` if both handles refer to the same error instance.
    pub fn ptr_eq(&self, other: &StreamError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The wrapped error.
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamError").field(&self.0).finish()
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}
