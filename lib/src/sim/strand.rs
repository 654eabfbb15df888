use crate::Color;

/// Fixed-capacity collection of collected bulbs, filled in socket order.
#[derive(Debug, Clone, PartialEq)]
pub struct Strand {
    sockets: Vec<Option<Color>>,
    filled: usize,
}

impl Strand {
    pub fn new(capacity: usize) -> Self {
        Self {
            sockets: vec![None; capacity],
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.sockets.len()
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled >= self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Socket contents in order. The first `filled()` entries are `Some`.
    pub fn sockets(&self) -> &[Option<Color>] {
        &self.sockets
    }

    /// Filled socket colors, in collection order.
    pub fn colors(&self) -> impl Iterator<Item = &Color> {
        self.sockets.iter().take(self.filled).flatten()
    }

    /// Put a bulb in the next free socket. Returns false when full.
    pub fn add_bulb(&mut self, color: Color) -> bool {
        if self.is_full() {
            return false;
        }
        self.sockets[self.filled] = Some(color);
        self.filled += 1;
        true
    }

    /// Remove the most recently added bulb.
    pub fn remove_last(&mut self) -> Option<Color> {
        if self.filled == 0 {
            return None;
        }
        self.filled -= 1;
        self.sockets[self.filled].take()
    }

    /// Empty every socket, returning the colors in socket order.
    pub fn consume_all(&mut self) -> Vec<Color> {
        let colors = self.sockets.iter_mut().filter_map(Option::take).collect();
        self.filled = 0;
        colors
    }
}
