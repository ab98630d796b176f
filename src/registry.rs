//! Ordered collections with name lookup.
//!
//! Compositors and constants are kept in declaration order, since the order of compositors
//! fixes the column order of every trace and the argument order of every compiled rate.
//! A side map gives constant-time lookup by name.

use std::collections::HashMap;

use crate::system::SystemError;

/// Anything stored in a [`Registry`] is addressed by a unique name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Insertion-ordered collection with unique names.
#[derive(Debug, Clone)]
pub struct Registry<T: Named> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Named> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Named> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item and returns its position.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::DuplicateName`] if an item with the same name exists.
    pub fn insert(&mut self, item: T) -> Result<usize, SystemError> {
        let name = item.name().to_string();
        if self.index.contains_key(&name) {
            return Err(SystemError::DuplicateName(name));
        }

        let position = self.items.len();
        self.items.push(item);
        self.index.insert(name, position);

        Ok(position)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index_of(name).map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.index_of(name) {
            Some(i) => self.items.get_mut(i),
            None => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|i| i.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(&'static str);

    impl Named for Item {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_insertion_order_and_lookup() {
        let mut registry = Registry::new();
        registry.insert(Item("A")).unwrap();
        registry.insert(Item("B")).unwrap();

        assert_eq!(registry.index_of("B"), Some(1));
        assert_eq!(registry.names(), vec!["A", "B"]);
        assert!(registry.get("C").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = Registry::new();
        registry.insert(Item("A")).unwrap();

        assert!(matches!(
            registry.insert(Item("A")),
            Err(SystemError::DuplicateName(name)) if name == "A"
        ));
        assert_eq!(registry.len(), 1);
    }
}
