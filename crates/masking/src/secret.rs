//! Credentials which must never reach a log line.

use std::{fmt, marker::PhantomData};

use crate::{strategy::Strategy, ExposeInterface, PeekInterface};

/// A value rendered through the masking strategy `I` whenever it is formatted.
///
/// Read it with [`PeekInterface::peek`], or take it back with [`ExposeInterface::expose`].
///
/// ```
/// use masking::{Secret, Strategy};
/// use std::fmt;
///
/// struct LastFour;
///
/// impl<T: AsRef<str>> Strategy<T> for LastFour {
///     fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         let val = val.as_ref();
///         let tail = val.get(val.len().saturating_sub(4)..).unwrap_or_default();
///         write!(f, "****{tail}")
///     }
/// }
///
/// let mch_id: Secret<String, LastFour> = Secret::new("1230000109".to_string());
/// assert_eq!(format!("{mch_id:?}"), "****0109");
/// ```
pub struct Secret<S, I = crate::WithType>
where
    I: Strategy<S>,
{
    value: S,
    strategy: PhantomData<I>,
}

impl<S, I: Strategy<S>> Secret<S, I> {
    /// Wrap `value`
    pub fn new(value: S) -> Self {
        Self {
            value,
            strategy: PhantomData,
        }
    }
}

impl<S, I: Strategy<S>> PeekInterface<S> for Secret<S, I> {
    fn peek(&self) -> &S {
        &self.value
    }
}

impl<S, I: Strategy<S>> ExposeInterface<S> for Secret<S, I> {
    fn expose(self) -> S {
        self.value
    }
}

impl<S, I: Strategy<S>> From<S> for Secret<S, I> {
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

impl<S: Clone, I: Strategy<S>> Clone for Secret<S, I> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<S: PartialEq, I: Strategy<S>> PartialEq for Secret<S, I> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<S: Eq, I: Strategy<S>> Eq for Secret<S, I> {}

impl<S, I: Strategy<S>> fmt::Debug for Secret<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        I::fmt(&self.value, f)
    }
}
