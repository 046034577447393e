//! Positional arguments forwarded to listeners
//!
//! An emission carries any number of values of any type. `Args` stores them
//! type-erased, in order, and listeners read them back by position and type.
//!
//! # Example
//!
//! ```rust
//! use broadcaster::{args, Args};
//!
//! let args = args![1_i32, "two", vec![3_u8]];
//!
//! assert_eq!(args.len(), 3);
//! assert_eq!(args.get::<i32>(0), Some(&1));
//! assert_eq!(args.get::<&str>(1), Some(&"two"));
//! assert_eq!(args.get::<Vec<u8>>(2), Some(&vec![3]));
//!
//! // Wrong type or out of range
//! assert!(args.get::<String>(1).is_none());
//! assert!(args.get::<i32>(7).is_none());
//! ```

use std::any::{Any, TypeId};

/// Ordered, type-erased argument list passed to every listener of an emission
#[derive(Default)]
pub struct Args {
    values: Vec<Box<dyn Any + Send + Sync>>,
}

impl Args {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value, builder style
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Append a value
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Box::new(value));
    }

    /// Get the argument at `index` if it has type `T`
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Check whether the argument at `index` exists and has type `T`
    pub fn type_matches<T: Any>(&self, index: usize) -> bool {
        self.values
            .get(index)
            .map(|value| (**value).type_id() == TypeId::of::<T>())
            .unwrap_or(false)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

/// Build an [`Args`] list from a comma separated list of values
///
/// ```rust
/// use broadcaster::args;
///
/// let empty = args![];
/// assert!(empty.is_empty());
///
/// let args = args![7_u32, String::from("seven")];
/// assert_eq!(args.get::<u32>(0), Some(&7));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.with($value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Payload {
        id: u32,
    }

    #[test]
    fn test_args_preserve_order() {
        let args = Args::new().with(1_i64).with("two").with(Payload { id: 3 });

        assert_eq!(args.len(), 3);
        assert_eq!(args.get::<i64>(0), Some(&1));
        assert_eq!(args.get::<&str>(1), Some(&"two"));
        assert_eq!(args.get::<Payload>(2), Some(&Payload { id: 3 }));
    }

    #[test]
    fn test_args_type_mismatch() {
        let args = Args::new().with(42_u8);

        assert!(args.get::<u16>(0).is_none());
        assert!(args.type_matches::<u8>(0));
        assert!(!args.type_matches::<u16>(0));
        assert!(!args.type_matches::<u8>(1));
    }

    #[test]
    fn test_args_macro() {
        let args = args![1, "two", vec![3]];

        assert_eq!(args.get::<i32>(0), Some(&1));
        assert_eq!(args.get::<Vec<i32>>(2), Some(&vec![3]));
        assert!(args![].is_empty());
    }

    #[test]
    fn test_args_push() {
        let mut args = Args::new();
        assert!(args.is_empty());

        args.push(String::from("hello"));
        assert_eq!(args.get::<String>(0).map(String::as_str), Some("hello"));
    }
}
