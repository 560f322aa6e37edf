//! A minimal arena map: values are inserted and keyed by their insertion index,
//! never removed or reallocated out from under a key.
//!
//! This is the trimmed-down core of a larger slotmap-style crate: just the
//! `Key` trait, the `key_type!` macro, and [`TinyMap`] itself. The dense
//! secondary-map, chunked-iteration, and parallel-iteration variants of the
//! original are not needed here and were dropped.

mod map;

pub use map::{Iter, TinyMap};

/// A dense, zero-based index usable as a `TinyMap` key.
pub trait Key: From<usize> + Copy + Ord {
    fn index(&self) -> usize;
}

#[macro_export]
macro_rules! key_type {
    ($(#[$outer:meta])* $vis:vis $name:ident) => {
        $(#[$outer])*
        #[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name(u64);

        impl $crate::Key for $name {
            fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value as _)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

key_type!(pub DefaultKey);
