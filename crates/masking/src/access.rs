//! Ways of reaching the value held by a secret wrapper.

/// Borrow the wrapped value
pub trait PeekInterface<S> {
    /// The only way to read a secret without giving up the wrapper
    fn peek(&self) -> &S;
}

/// Unwrap the secret, handing the raw value to the caller
pub trait ExposeInterface<S> {
    /// Consume the wrapper
    fn expose(self) -> S;
}
