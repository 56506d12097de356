// In-memory BoundedSequence implementation
use crate::application::bounded_sequence::BoundedSequence;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct InMemorySequence<T> {
    items: VecDeque<T>,
    max_length: Option<usize>,
}

impl<T> InMemorySequence<T> {
    pub fn unbounded() -> Self {
        Self {
            items: VecDeque::new(),
            max_length: None,
        }
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_length),
            max_length: Some(max_length),
        }
    }
}

impl<T> Default for InMemorySequence<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T: Clone + Send> BoundedSequence<T> for InMemorySequence<T> {
    fn append(&mut self, item: T) {
        if let Some(max) = self.max_length {
            if max == 0 {
                return;
            }
            while self.items.len() >= max {
                self.items.pop_front();
            }
        }
        self.items.push_back(item);
    }

    fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    fn front(&self) -> Option<&T> {
        self.items.front()
    }

    fn back(&self) -> Option<&T> {
        self.items.back()
    }

    fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
