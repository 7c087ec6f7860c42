//! Sliding-window start offsets.
//!
//! Windows are laid out at the recording's *source* rate:
//!
//! ```text
//! offsets = 0, stride, 2·stride, …   while offset + win_len ≤ n_times
//! ```
//!
//! Trailing samples that do not fill a complete window are dropped.
//! Consecutive windows overlap by `win_len − stride` samples.

/// A finite, restartable sequence of window start offsets.
///
/// The slicer itself is a cheap `Copy` description; each call to
/// [`offsets`](Self::offsets) (or `into_iter`) starts from offset 0 again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlicer {
    n_times: usize,
    win_len: usize,
    stride: usize,
}

impl WindowSlicer {
    /// `win_len` and `stride` are in samples at the recording's rate.
    ///
    /// # Panics
    /// If `stride` is zero.
    pub fn new(n_times: usize, win_len: usize, stride: usize) -> Self {
        assert!(stride > 0, "stride must be at least one sample");
        Self { n_times, win_len, stride }
    }

    pub fn win_len(&self) -> usize {
        self.win_len
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of complete windows: `floor((n_times − win_len) / stride) + 1`,
    /// or 0 when the recording is shorter than one window.
    pub fn len(&self) -> usize {
        if self.win_len > self.n_times {
            0
        } else {
            (self.n_times - self.win_len) / self.stride + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the start offsets from the beginning.
    pub fn offsets(&self) -> Offsets {
        Offsets { slicer: *self, next: 0 }
    }

    /// `(start, end)` sample range of window `index`.
    pub fn range(&self, index: usize) -> (usize, usize) {
        let start = index * self.stride;
        (start, start + self.win_len)
    }
}

impl IntoIterator for WindowSlicer {
    type Item = usize;
    type IntoIter = Offsets;

    fn into_iter(self) -> Offsets {
        self.offsets()
    }
}

/// Iterator over start offsets, produced lazily.
#[derive(Debug, Clone)]
pub struct Offsets {
    slicer: WindowSlicer,
    next: usize,
}

impl Iterator for Offsets {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let start = self.next;
        if start.checked_add(self.slicer.win_len)? > self.slicer.n_times {
            return None;
        }
        self.next = start + self.slicer.stride;
        Some(start)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.slicer.len().saturating_sub(self.next / self.slicer.stride);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Offsets {}

/// Window bounds in seconds: `[start / sfreq, (start + win_len) / sfreq)`.
pub fn window_bounds(start: usize, win_len: usize, sfreq: f64) -> (f64, f64) {
    (start as f64 / sfreq, (start + win_len) as f64 / sfreq)
}
