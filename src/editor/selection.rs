use std::ops::Range;

/// A contiguous selection expressed in char offsets.
/// `anchor == head` is an empty selection (just a cursor).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    #[cfg(test)]
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Ordered range regardless of selection direction
    pub fn range(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }

    pub fn clamped(self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.head.min(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_is_empty() {
        let sel = Selection::default();
        assert!(sel.is_empty());
        assert_eq!(sel.range(), 0..0);
    }

    #[test]
    fn point_is_empty() {
        assert!(Selection::point(7).is_empty());
    }

    #[test]
    fn range_orders_backwards_selection() {
        let sel = Selection::new(9, 3);
        assert!(!sel.is_empty());
        assert_eq!(sel.range(), 3..9);
    }

    #[test]
    fn clamped_limits_both_ends() {
        let sel = Selection::new(2, 40).clamped(10);
        assert_eq!(sel.range(), 2..10);
    }
}
