//! Long lived credentials, wiped from memory when dropped.

use std::{fmt, marker::PhantomData};

use zeroize::Zeroize;

use crate::{strategy::Strategy, PeekInterface};

/// Like [`crate::Secret`], but zeroes the value on drop.
///
/// Adapters hold decoded private keys and merchant API keys in this type.
pub struct StrongSecret<S: Zeroize, I = crate::WithType>
where
    I: Strategy<S>,
{
    value: S,
    strategy: PhantomData<I>,
}

impl<S: Zeroize, I: Strategy<S>> StrongSecret<S, I> {
    /// Wrap `value`
    pub fn new(value: S) -> Self {
        Self {
            value,
            strategy: PhantomData,
        }
    }
}

impl<S: Zeroize, I: Strategy<S>> PeekInterface<S> for StrongSecret<S, I> {
    fn peek(&self) -> &S {
        &self.value
    }
}

impl<S: Zeroize + Clone, I: Strategy<S>> Clone for StrongSecret<S, I> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<S: Zeroize + PartialEq, I: Strategy<S>> PartialEq for StrongSecret<S, I> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<S: Zeroize + Eq, I: Strategy<S>> Eq for StrongSecret<S, I> {}

impl<S: Zeroize, I: Strategy<S>> fmt::Debug for StrongSecret<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        I::fmt(&self.value, f)
    }
}

impl<S: Zeroize, I: Strategy<S>> Drop for StrongSecret<S, I> {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}
