//! Thread-realtime predicate and RT-safe clock.
//!
//! Both are plain function pointers so callers can inject their own (tests
//! do). The defaults:
//!
//! - Host: a thread is real-time while a [`ThreadRtFlag`] guard is alive on it.
//! - ESP-IDF: anything running on core 0 is the RT core, as is any flagged thread.

use core::cell::Cell;
use core::marker::PhantomData;
use core::time::Duration;

/// Answers "is the calling thread in a real-time context?".
pub type RealtimeProbe = fn() -> bool;

/// Returns the current timestamp without blocking or allocating.
pub type Clock = fn() -> Duration;

thread_local! {
    static RT_FLAG: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as real-time for as long as it lives.
///
/// Not `Send`: the flag belongs to the thread that created it.
///
/// ```
/// use rt_log_bridge::realtime::{is_current_thread_realtime, ThreadRtFlag};
///
/// assert!(!is_current_thread_realtime());
/// {
///     let _rt = ThreadRtFlag::new();
///     assert!(is_current_thread_realtime());
/// }
/// assert!(!is_current_thread_realtime());
/// ```
pub struct ThreadRtFlag {
    previous: bool,
    _not_send: PhantomData<*const ()>,
}

impl ThreadRtFlag {
    pub fn new() -> Self {
        let previous = RT_FLAG.with(|flag| flag.replace(true));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Default for ThreadRtFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadRtFlag {
    fn drop(&mut self) {
        RT_FLAG.with(|flag| flag.set(self.previous));
    }
}

/// Default [`RealtimeProbe`].
#[cfg(not(target_os = "espidf"))]
#[inline]
pub fn is_current_thread_realtime() -> bool {
    RT_FLAG.with(Cell::get)
}

/// Default [`RealtimeProbe`].
///
/// Core 0 → RT, core 1 → best-effort. Cost: one task handle lookup.
#[cfg(target_os = "espidf")]
#[inline]
pub fn is_current_thread_realtime() -> bool {
    if RT_FLAG.with(Cell::get) {
        return true;
    }
    // SAFETY: xTaskGetCoreID is always safe to call
    unsafe {
        let task = esp_idf_svc::sys::xTaskGetCurrentTaskHandle();
        esp_idf_svc::sys::xTaskGetCoreID(task) == 0
    }
}

/// Probe that never reports real-time, for purely non-RT applications.
pub fn never_realtime() -> bool {
    false
}

/// Probe that always reports real-time, routing every call through the queue.
pub fn always_realtime() -> bool {
    true
}

#[cfg(not(target_os = "espidf"))]
static CLOCK_ANCHOR: std::sync::OnceLock<(std::time::Instant, Duration)> = std::sync::OnceLock::new();

/// Default [`Clock`]: monotonic time, expressed as time since the Unix epoch.
///
/// The wall clock is read once, on the first call, and paired with an
/// `Instant`; later readings add the monotonic elapsed time to it. Stamps
/// never go backwards when the system clock is adjusted, and stay readable
/// as wall time. The first call may block briefly, so make it from a non-RT
/// thread; `RtLogger::new` does.
#[cfg(not(target_os = "espidf"))]
#[inline]
pub fn current_rt_time() -> Duration {
    let (start, epoch) = CLOCK_ANCHOR.get_or_init(|| {
        let epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        (std::time::Instant::now(), epoch)
    });
    *epoch + start.elapsed()
}

/// Default [`Clock`]: microseconds since boot from the high resolution timer.
#[cfg(target_os = "espidf")]
#[inline]
pub fn current_rt_time() -> Duration {
    // SAFETY: esp_timer_get_time is ISR-safe and lock-free
    let micros = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(micros.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_nests_and_restores() {
        assert!(!is_current_thread_realtime());
        let outer = ThreadRtFlag::new();
        {
            let _inner = ThreadRtFlag::new();
            assert!(is_current_thread_realtime());
        }
        assert!(is_current_thread_realtime());
        drop(outer);
        assert!(!is_current_thread_realtime());
    }

    #[test]
    fn test_flag_is_per_thread() {
        let _rt = ThreadRtFlag::new();
        let other = std::thread::spawn(is_current_thread_realtime).join().unwrap();
        assert!(!other);
        assert!(is_current_thread_realtime());
    }

    #[test]
    fn test_clock_advances() {
        let a = current_rt_time();
        std::thread::sleep(Duration::from_millis(2));
        let b = current_rt_time();
        assert!(b > a);
    }

    #[cfg(not(target_os = "espidf"))]
    #[test]
    fn test_clock_is_monotonic_and_near_wall_time() {
        let mut last = current_rt_time();
        for _ in 0..1000 {
            let now = current_rt_time();
            assert!(now >= last);
            last = now;
        }

        let wall = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap();
        let skew = if wall > last { wall - last } else { last - wall };
        assert!(skew < Duration::from_secs(5), "clock drifted {:?} from wall time", skew);
    }

    #[test]
    fn test_fixed_probes() {
        assert!(always_realtime());
        assert!(!never_realtime());
    }
}
