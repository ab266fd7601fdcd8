/// Emit-on-change filter. Holds the last emitted value; starts empty, so the
/// first value always passes.
#[derive(Debug, Clone)]
pub struct DistinctUntilChanged<T> {
    last: Option<T>,
}

impl<T> Default for DistinctUntilChanged<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: PartialEq + Clone> DistinctUntilChanged<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(value)` if it differs from the last emitted value.
    pub fn observe(&mut self, value: T) -> Option<T> {
        if self.last.as_ref() == Some(&value) {
            return None;
        }
        self.last = Some(value.clone());
        Some(value)
    }

    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Iterator adapter over [`DistinctUntilChanged`].
#[derive(Debug, Clone)]
pub struct Distinct<I: Iterator> {
    inner: I,
    state: DistinctUntilChanged<I::Item>,
}

impl<I> Iterator for Distinct<I>
where
    I: Iterator,
    I::Item: PartialEq + Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        for item in self.inner.by_ref() {
            if let Some(v) = self.state.observe(item) {
                return Some(v);
            }
        }
        None
    }
}

pub trait DistinctExt: Iterator + Sized {
    fn distinct_until_changed(self) -> Distinct<Self>
    where
        Self::Item: PartialEq + Clone,
    {
        Distinct {
            inner: self,
            state: DistinctUntilChanged::new(),
        }
    }
}

impl<I: Iterator> DistinctExt for I {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_always_passes() {
        let mut f = DistinctUntilChanged::new();
        assert_eq!(f.observe(false), Some(false));
    }

    #[test]
    fn repeats_are_suppressed() {
        let out: Vec<bool> = [true, true, false, false, false, true]
            .into_iter()
            .distinct_until_changed()
            .collect();
        assert_eq!(out, vec![true, false, true]);
    }

    #[test]
    fn reset_forgets_last() {
        let mut f = DistinctUntilChanged::new();
        f.observe(3u8);
        assert_eq!(f.observe(3), None);
        f.reset();
        assert_eq!(f.observe(3), Some(3));
        assert_eq!(f.last(), Some(&3));
    }
}
