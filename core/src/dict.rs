// Copyright (c) 2023 The mfc-attack Authors

//! Key dictionary abstraction
//!
//! A [Dictionary] is an ordered, read-only list of [Key] candidates with a
//! sequential cursor. Dictionaries are opened via [Driver::dict_open][crate::engine::Driver::dict_open]
//! and owned by the [Engine][crate::engine::Engine] for the duration of an attack phase.

use strum::{Display, EnumString};

use crate::card::Key;

/// Dictionary open mode
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString)]
pub enum OpenMode {
    /// Create an empty dictionary if none exists
    CreateIfAbsent,
    /// Fail if the dictionary does not exist
    MustExist,
}

/// Open key dictionary with a sequential read cursor
pub trait Dictionary {
    /// Number of keys in the dictionary, cached at open
    fn total_keys(&self) -> u32;

    /// Fetch the next key and advance the cursor, `None` once exhausted
    fn next_key(&mut self) -> Option<Key>;

    /// Reset the cursor to the first key
    fn rewind(&mut self);

    /// Release the dictionary and any backing resources
    fn release(self)
    where
        Self: Sized,
    {
    }
}

impl<T: Dictionary + ?Sized> Dictionary for &mut T {
    fn total_keys(&self) -> u32 {
        T::total_keys(self)
    }

    fn next_key(&mut self) -> Option<Key> {
        T::next_key(self)
    }

    fn rewind(&mut self) {
        T::rewind(self)
    }
}

/// In-memory dictionary
#[cfg(feature = "alloc")]
#[derive(Clone, PartialEq, Debug, Default)]
pub struct MemDict {
    keys: alloc::vec::Vec<Key>,
    index: usize,
}

#[cfg(feature = "alloc")]
impl MemDict {
    /// Create a new dictionary from a list of keys
    pub fn new(keys: &[Key]) -> Self {
        Self {
            keys: keys.to_vec(),
            index: 0,
        }
    }
}

#[cfg(feature = "alloc")]
impl Dictionary for MemDict {
    fn total_keys(&self) -> u32 {
        self.keys.len() as u32
    }

    fn next_key(&mut self) -> Option<Key> {
        let k = self.keys.get(self.index).copied()?;
        self.index += 1;
        Some(k)
    }

    fn rewind(&mut self) {
        self.index = 0;
    }
}

#[cfg(all(test, feature = "alloc"))]
mod test {
    use super::*;

    #[test]
    fn iterate_rewind() {
        let keys = [Key([0x01; 6]), Key([0x02; 6]), Key([0x03; 6])];
        let mut d = MemDict::new(&keys);

        assert_eq!(d.total_keys(), 3);

        for k in &keys {
            assert_eq!(d.next_key(), Some(*k));
        }
        assert_eq!(d.next_key(), None);
        assert_eq!(d.next_key(), None);

        d.rewind();
        assert_eq!(d.next_key(), Some(keys[0]));
        assert_eq!(d.total_keys(), 3);
    }
}
