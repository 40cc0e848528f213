//! Secrets are read from configuration, never written back out.

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

use crate::{Secret, Strategy, StrongSecret};

impl<'de, T, I> Deserialize<'de> for Secret<T, I>
where
    T: Deserialize<'de>,
    I: Strategy<T>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

impl<'de, T, I> Deserialize<'de> for StrongSecret<T, I>
where
    T: Deserialize<'de> + Zeroize,
    I: Strategy<T>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}
