//! Header values which are either shown as is or hidden behind a [`Secret`].

use std::{fmt, hash};

use crate::{ExposeInterface, PeekInterface, Secret};

/// An outbound header value, masked when it carries a credential
#[derive(Clone, Eq, PartialEq)]
pub enum Maskable<T: Eq + Clone> {
    /// Credential, printed through [`Secret`]'s strategy
    Masked(Secret<T>),
    /// Plain value
    Normal(T),
}

impl<T: Eq + Clone> Maskable<T> {
    /// Hide `value` from `Debug` output
    pub fn new_masked(value: Secret<T>) -> Self {
        Self::Masked(value)
    }

    /// Keep `value` visible
    pub fn new_normal(value: T) -> Self {
        Self::Normal(value)
    }

    /// Whether the value is hidden from `Debug` output
    pub fn is_masked(&self) -> bool {
        matches!(self, Self::Masked(_))
    }

    /// The raw value, whichever variant holds it
    pub fn into_inner(self) -> T {
        match self {
            Self::Masked(secret) => secret.expose(),
            Self::Normal(value) => value,
        }
    }
}

impl<T: Eq + Clone + fmt::Debug> fmt::Debug for Maskable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Masked(secret) => fmt::Debug::fmt(secret, f),
            Self::Normal(value) => fmt::Debug::fmt(value, f),
        }
    }
}

impl<T: Eq + Clone + hash::Hash> hash::Hash for Maskable<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Masked(secret) => secret.peek().hash(state),
            Self::Normal(value) => value.hash(state),
        }
    }
}

impl<T: Eq + Clone> From<T> for Maskable<T> {
    fn from(value: T) -> Self {
        Self::new_normal(value)
    }
}

impl From<&str> for Maskable<String> {
    fn from(value: &str) -> Self {
        Self::new_normal(value.to_owned())
    }
}
