use core::fmt;

/// How a secret renders itself in `Debug` output
pub trait Strategy<T> {
    /// Write the masked representation of `value`
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Default strategy, prints only the name of the wrapped type
pub struct WithType;

impl<T> Strategy<T> for WithType {
    fn fmt(_: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*** {} ***", std::any::type_name::<T>())
    }
}

/// Strategy for key material (RSA keys, merchant API keys).
///
/// Prints only the length of the value so misconfigured keys can be told apart in logs.
#[derive(Debug)]
pub struct KeyMaterial;

impl<T> Strategy<T> for KeyMaterial
where
    T: AsRef<str>,
{
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*** key material ({} chars) ***", value.as_ref().len())
    }
}
