// Two-handle numeric range used for the price and year sliders

use std::fmt;

/// Unsigned amounts a range control can hold
pub trait Bound: Copy + Ord + fmt::Debug + fmt::Display {
    const MIN: Self;
    const MAX: Self;

    /// Round `self` to the nearest point of the grid `origin + k * step`
    fn snap(self, origin: Self, step: Self) -> Self;
}

macro_rules! impl_bound {
    ($($t:ty),+) => {
        $(
            impl Bound for $t {
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;

                fn snap(self, origin: Self, step: Self) -> Self {
                    if step == 0 || self <= origin {
                        return self.max(origin);
                    }
                    let offset = self - origin;
                    let steps = offset / step + if offset % step >= step - step / 2 { 1 } else { 0 };
                    origin.saturating_add(steps.saturating_mul(step))
                }
            }
        )+
    };
}

impl_bound!(u32, u64);

/// Inclusive range with `low <= high`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range<T> {
    pub low: T,
    pub high: T,
}

impl<T: Bound> Range<T> {
    /// Build a range, swapping inverted input
    pub fn new(a: T, b: T) -> Self {
        if a <= b { Self { low: a, high: b } } else { Self { low: b, high: a } }
    }

    /// The whole numeric domain
    pub fn full() -> Self {
        Self {
            low: T::MIN,
            high: T::MAX,
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.low <= value && value <= self.high
    }

    /// Narrow this range into `bounds`
    pub fn clamp_into(self, bounds: Range<T>) -> Self {
        Self::new(
            self.low.clamp(bounds.low, bounds.high),
            self.high.clamp(bounds.low, bounds.high),
        )
    }

    /// Smallest range covering every value, or `None` for an empty input
    pub fn spanning(values: impl IntoIterator<Item = T>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self { low: v, high: v }),
            Some(r) => Some(Self {
                low: r.low.min(v),
                high: r.high.max(v),
            }),
        })
    }
}

impl<T: Bound> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.low, self.high)
    }
}

/// Slider state: the dataset bounds, the in-flight handle positions and the
/// committed value the filters read.
///
/// Handles may touch but never cross. Drags only move the handles; `release`
/// commits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeControl<T> {
    bounds: Range<T>,
    handles: Range<T>,
    value: Range<T>,
    step: T,
    touched: bool,
}

impl<T: Bound> RangeControl<T> {
    /// Control spanning the whole numeric domain, for a store with no data yet
    pub fn unbounded(step: T) -> Self {
        Self::new(Range::full(), step)
    }

    pub fn new(bounds: Range<T>, step: T) -> Self {
        Self {
            bounds,
            handles: bounds,
            value: bounds,
            step,
            touched: false,
        }
    }

    pub fn bounds(&self) -> Range<T> {
        self.bounds
    }

    /// Committed range
    pub fn value(&self) -> Range<T> {
        self.value
    }

    /// Current handle positions, including an uncommitted drag
    pub fn handles(&self) -> Range<T> {
        self.handles
    }

    pub fn step(&self) -> T {
        self.step
    }

    /// Whether the user has moved this control since the last reset
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Whether the committed value still covers the whole span
    pub fn is_full_span(&self) -> bool {
        self.value == self.bounds
    }

    fn snap(&self, value: T) -> T {
        if value >= self.bounds.high {
            return self.bounds.high;
        }
        value.snap(self.bounds.low, self.step).clamp(self.bounds.low, self.bounds.high)
    }

    pub fn drag_low(&mut self, value: T) {
        self.handles.low = self.snap(value).min(self.handles.high);
        self.touched = true;
    }

    pub fn drag_high(&mut self, value: T) {
        self.handles.high = self.snap(value).max(self.handles.low);
        self.touched = true;
    }

    /// Commit the handle positions
    pub fn release(&mut self) -> Range<T> {
        self.value = self.handles;
        self.value
    }

    /// Typed entry of both ends: inverted input is swapped, then clamped and committed
    pub fn set(&mut self, low: T, high: T) -> Range<T> {
        self.handles = Range::new(low, high).clamp_into(self.bounds);
        self.touched = true;
        self.release()
    }

    /// Adopt new dataset bounds after the listing store changed
    pub fn rebound(&mut self, bounds: Option<Range<T>>) {
        self.bounds = bounds.unwrap_or_else(Range::full);
        if self.touched {
            self.handles = self.handles.clamp_into(self.bounds);
            self.value = self.value.clamp_into(self.bounds);
        } else {
            self.handles = self.bounds;
            self.value = self.bounds;
        }
    }

    /// Back to the full span, as if never moved
    pub fn reset(&mut self) {
        self.handles = self.bounds;
        self.value = self.bounds;
        self.touched = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_control() -> RangeControl<u64> {
        RangeControl::new(Range::new(100_000, 1_000_000), 10_000)
    }

    #[test]
    fn test_range_new_swaps_inverted_input() {
        let range = Range::new(2020u32, 2010);
        assert_eq!(range, Range { low: 2010, high: 2020 });
        assert!(range.contains(2010));
        assert!(range.contains(2020));
        assert!(!range.contains(2021));
    }

    #[test]
    fn test_range_spanning() {
        assert_eq!(Range::spanning([5u64, 1, 9, 3]), Some(Range::new(1, 9)));
        assert_eq!(Range::<u64>::spanning([]), None);
    }

    #[test]
    fn test_snap_rounds_to_nearest_step() {
        assert_eq!(124_999u64.snap(100_000, 10_000), 120_000);
        assert_eq!(125_000u64.snap(100_000, 10_000), 130_000);
        assert_eq!(50u64.snap(100, 10), 100);
        assert_eq!(7u32.snap(0, 0), 7);
        assert_eq!(u64::MAX.snap(0, 10_000), u64::MAX - u64::MAX % 10_000);
    }

    #[test]
    fn test_new_control_covers_full_span() {
        let control = price_control();
        assert_eq!(control.value(), Range::new(100_000, 1_000_000));
        assert!(control.is_full_span());
        assert!(!control.is_touched());
    }

    #[test]
    fn test_drag_is_not_committed_until_release() {
        let mut control = price_control();
        control.drag_low(300_000);
        assert_eq!(control.handles().low, 300_000);
        assert_eq!(control.value().low, 100_000);

        let committed = control.release();
        assert_eq!(committed, Range::new(300_000, 1_000_000));
        assert_eq!(control.value(), committed);
    }

    #[test]
    fn test_upper_handle_clamps_to_lower_on_crossing() {
        let mut control = price_control();
        control.drag_low(500_000);
        control.drag_high(200_000);
        control.release();
        assert_eq!(control.value(), Range::new(500_000, 500_000));
    }

    #[test]
    fn test_lower_handle_clamps_to_upper_on_crossing() {
        let mut control = price_control();
        control.drag_high(400_000);
        control.drag_low(900_000);
        assert_eq!(control.handles(), Range::new(400_000, 400_000));
    }

    #[test]
    fn test_drag_clamps_into_bounds() {
        let mut control = price_control();
        control.drag_low(0);
        control.drag_high(5_000_000);
        assert_eq!(control.release(), Range::new(100_000, 1_000_000));
    }

    #[test]
    fn test_drag_to_max_reaches_bound_off_grid() {
        let mut control = RangeControl::new(Range::new(100_000u64, 995_000), 10_000);
        control.drag_high(2_000_000);
        assert_eq!(control.handles().high, 995_000);
        control.drag_high(992_000);
        assert_eq!(control.handles().high, 990_000);
    }

    #[test]
    fn test_set_swaps_and_clamps() {
        let mut control = price_control();
        let committed = control.set(800_000, 50_000);
        assert_eq!(committed, Range::new(100_000, 800_000));
        assert!(control.is_touched());
    }

    #[test]
    fn test_rebound_untouched_takes_new_span() {
        let mut control = price_control();
        control.rebound(Some(Range::new(200_000, 2_000_000)));
        assert_eq!(control.value(), Range::new(200_000, 2_000_000));
        assert!(control.is_full_span());
    }

    #[test]
    fn test_rebound_touched_narrows_selection() {
        let mut control = price_control();
        control.set(150_000, 900_000);
        control.rebound(Some(Range::new(300_000, 600_000)));
        assert_eq!(control.value(), Range::new(300_000, 600_000));
        assert_eq!(control.handles(), Range::new(300_000, 600_000));

        let mut control = price_control();
        control.set(150_000, 200_000);
        control.rebound(Some(Range::new(300_000, 600_000)));
        assert_eq!(control.value(), Range::new(300_000, 300_000));
    }

    #[test]
    fn test_rebound_to_empty_store_is_unbounded() {
        let mut control = price_control();
        control.rebound(None);
        assert_eq!(control.value(), Range::full());
    }

    #[test]
    fn test_year_control_steps_by_one() {
        let mut control = RangeControl::new(Range::new(2005u32, 2024), 1);
        control.drag_low(2012);
        control.drag_high(2018);
        assert_eq!(control.release(), Range::new(2012, 2018));

        control.reset();
        assert!(control.is_full_span());
        assert!(!control.is_touched());
    }
}
