/// Free-running millisecond counter, e.g. a SysTick or RTC tick count.
///
/// The counter is allowed to wrap; all arithmetic on its values is wrapping.
pub trait Clock {
    fn now_millis(&self) -> u32;
}

/// Any `Fn() -> u32` works as a clock, e.g. `|| board.millis()`.
impl<F: Fn() -> u32> Clock for F {
    fn now_millis(&self) -> u32 {
        self()
    }
}

/// Milliseconds from `since` to `now`, correct across one counter overflow.
#[inline]
pub(crate) fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}
