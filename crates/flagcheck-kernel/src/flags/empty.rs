//! The shared emptiness predicate.
//!
//! A value is empty iff it is absent (`None`), a zero-length string, a
//! zero-length sequence, or a zero-length mapping. Booleans and integers are
//! never empty, including `false` and `0`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use flagcheck_types::FlagValue;

/// Values that rule accessors may return.
pub trait IsEmpty {
    fn is_empty_value(&self) -> bool;
}

/// Free-function form of [`IsEmpty::is_empty_value`].
pub fn is_empty<T: IsEmpty + ?Sized>(value: &T) -> bool {
    value.is_empty_value()
}

impl IsEmpty for str {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for Path {
    fn is_empty_value(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

impl IsEmpty for PathBuf {
    fn is_empty_value(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

impl<T> IsEmpty for [T] {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> IsEmpty for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmpty for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

/// Only `None` is empty; `Some("")` is a present reference.
impl<T> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: IsEmpty + ?Sized> IsEmpty for &T {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: IsEmpty + ?Sized> IsEmpty for Box<T> {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

macro_rules! never_empty {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IsEmpty for $ty {
                fn is_empty_value(&self) -> bool {
                    false
                }
            }
        )*
    };
}

never_empty!(bool, i32, i64, u32, u64, usize, f64);

impl IsEmpty for FlagValue {
    fn is_empty_value(&self) -> bool {
        match self {
            FlagValue::Bool(_) | FlagValue::Int(_) => false,
            FlagValue::Str(s) => s.is_empty(),
            FlagValue::List(items) => items.is_empty(),
            FlagValue::Map(map) => map.is_empty(),
        }
    }
}

/// Flag lookups return `Option<&FlagValue>`: absent is empty, and a present
/// value is judged by its contents.
pub(crate) fn flag_is_empty(value: Option<&FlagValue>) -> bool {
    value.is_none_or(FlagValue::is_empty_value)
}
