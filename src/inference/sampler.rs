//! Bounded uniform value sampling
//!
//! A [`Reservoir`] holds at most `capacity` of the values offered to it such
//! that, after `n` offers, each offered value is retained with probability
//! `capacity / n` (or 1 while `n <= capacity`).

use std::borrow::Cow;

use rand::Rng;

use super::classify::BsonType;

/// Reservoir capacity for text values
pub const TEXT_SAMPLE_CAPACITY: usize = 100;

/// Reservoir capacity for every other sampled type
pub const VALUE_SAMPLE_CAPACITY: usize = 10_000;

/// Maximum number of characters kept of a sampled text value
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Reservoir capacity used for values of `bson_type`
pub fn capacity_for(bson_type: BsonType) -> usize {
    if bson_type.is_text() {
        TEXT_SAMPLE_CAPACITY
    } else {
        VALUE_SAMPLE_CAPACITY
    }
}

/// Truncate `text` to at most `max` characters without splitting a code point
pub fn truncate_text(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((end, _)) => Cow::Owned(text[..end].to_string()),
        None => Cow::Borrowed(text),
    }
}

/// Fixed-capacity uniform sample (Algorithm R)
#[derive(Debug, Clone)]
pub struct Reservoir<T> {
    capacity: usize,
    seen: u64,
    items: Vec<T>,
}

impl<T> Reservoir<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: 0,
            items: Vec::new(),
        }
    }

    /// Offer one item
    pub fn offer<R: Rng>(&mut self, item: T, rng: &mut R) {
        self.offer_with(|| item, rng);
    }

    /// Offer one item, building it only if it is retained
    pub fn offer_with<R, F>(&mut self, make: F, rng: &mut R)
    where
        R: Rng,
        F: FnOnce() -> T,
    {
        self.seen += 1;

        if self.items.len() < self.capacity {
            self.items.push(make());
            return;
        }
        if self.capacity == 0 {
            return;
        }

        // The i-th offer replaces a uniformly chosen slot with probability capacity / i.
        let slot = rng.gen_range(0..self.seen);
        if let Ok(slot) = usize::try_from(slot) {
            if slot < self.capacity {
                self.items[slot] = make();
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of offers so far
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}
