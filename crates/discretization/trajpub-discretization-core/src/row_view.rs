//! Compacting selector over a subset of vector rows.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowViewError {
    #[error("row view used before finalize()")]
    NotFinalized,
    #[error("row view already finalized")]
    AlreadyFinalized,
    #[error("rows [{offset}, {end}) overlap a previous range")]
    Overlap { offset: usize, end: usize },
    #[error("row view needs {needed} rows, vector has {len}")]
    OutOfBounds { needed: usize, len: usize },
}

/// Contiguous block copied by [`RowView::extract_into`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Segment {
    src: usize,
    dst: usize,
    len: usize,
}

/// Ordered, non-overlapping `(offset, length)` ranges over a source vector.
///
/// Ranges are added with [`add_range`](Self::add_range), then
/// [`finalize`](Self::finalize) builds the gather plan. Extraction is only
/// valid on a finalized view and keeps the order in which ranges were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowView {
    ranges: Vec<(usize, usize)>,
    segments: Vec<Segment>,
    size: usize,
    /// One past the highest selected row.
    end: usize,
    finalized: bool,
}

impl RowView {
    pub fn new() -> Self {
        Self::default()
    }

    /// A finalized view selecting nothing.
    pub fn empty() -> Self {
        let mut view = Self::default();
        view.finalize();
        view
    }

    pub fn add_range(&mut self, offset: usize, len: usize) -> Result<(), RowViewError> {
        if self.finalized {
            return Err(RowViewError::AlreadyFinalized);
        }
        let end = offset + len;
        if len > 0
            && self
                .ranges
                .iter()
                .any(|&(o, l)| l > 0 && offset < o + l && o < end)
        {
            return Err(RowViewError::Overlap { offset, end });
        }
        self.ranges.push((offset, len));
        Ok(())
    }

    /// Build the gather plan. Empty ranges are dropped and ranges that
    /// continue each other are merged. Calling it again is a no-op.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        let mut segments: Vec<Segment> = Vec::with_capacity(self.ranges.len());
        let mut dst = 0;
        for &(offset, len) in self.ranges.iter().filter(|(_, l)| *l > 0) {
            match segments.last_mut() {
                Some(last) if last.src + last.len == offset => last.len += len,
                _ => segments.push(Segment {
                    src: offset,
                    dst,
                    len,
                }),
            }
            dst += len;
            self.end = self.end.max(offset + len);
        }
        self.segments = segments;
        self.size = dst;
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of selected rows.
    pub fn size(&self) -> usize {
        if self.finalized {
            self.size
        } else {
            self.ranges.iter().map(|(_, l)| l).sum()
        }
    }

    /// Ranges as added, including empty ones.
    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    /// Number of contiguous blocks after merging.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn extract(&self, full: &[f64]) -> Result<Vec<f64>, RowViewError> {
        let mut out = vec![0.0; self.size()];
        self.extract_into(full, &mut out)?;
        Ok(out)
    }

    /// Gather the selected rows of `full` into the first `size()` entries of
    /// `out`.
    pub fn extract_into(&self, full: &[f64], out: &mut [f64]) -> Result<(), RowViewError> {
        if !self.finalized {
            return Err(RowViewError::NotFinalized);
        }
        if full.len() < self.end {
            return Err(RowViewError::OutOfBounds {
                needed: self.end,
                len: full.len(),
            });
        }
        if out.len() < self.size {
            return Err(RowViewError::OutOfBounds {
                needed: self.size,
                len: out.len(),
            });
        }
        for seg in &self.segments {
            out[seg.dst..seg.dst + seg.len].copy_from_slice(&full[seg.src..seg.src + seg.len]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathers_in_insertion_order() {
        let mut view = RowView::new();
        view.add_range(4, 2).unwrap();
        view.add_range(0, 1).unwrap();
        view.finalize();
        assert_eq!(view.size(), 3);
        let full = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(view.extract(&full).unwrap(), vec![4.0, 5.0, 0.0]);
    }

    #[test]
    fn adjacent_ranges_merge() {
        let mut view = RowView::new();
        view.add_range(1, 2).unwrap();
        view.add_range(3, 1).unwrap();
        view.add_range(7, 0).unwrap();
        view.add_range(5, 1).unwrap();
        view.finalize();
        assert_eq!(view.segment_count(), 2);
        assert_eq!(view.size(), 4);
        let full: Vec<f64> = (0..8u32).map(f64::from).collect();
        assert_eq!(view.extract(&full).unwrap(), vec![1.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn misuse_is_reported() {
        let mut view = RowView::new();
        view.add_range(0, 3).unwrap();
        assert_eq!(
            view.add_range(2, 2),
            Err(RowViewError::Overlap { offset: 2, end: 4 })
        );
        assert_eq!(view.extract(&[0.0; 3]), Err(RowViewError::NotFinalized));
        view.finalize();
        assert_eq!(view.add_range(5, 1), Err(RowViewError::AlreadyFinalized));
        assert_eq!(
            view.extract(&[0.0; 2]),
            Err(RowViewError::OutOfBounds { needed: 3, len: 2 })
        );
    }

    #[test]
    fn empty_view_extracts_nothing() {
        let view = RowView::empty();
        assert!(view.is_finalized());
        assert_eq!(view.extract(&[1.0, 2.0]).unwrap(), Vec::<f64>::new());
    }
}
