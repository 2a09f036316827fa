//! Live native resource accounting for the leak tests.
//!
//! Every RAII wrapper reports acquisition and release here. Outside of
//! `cfg(test)` the hooks compile to nothing. Counts are per thread: the
//! pipeline is synchronous, so a resource is always released on the thread
//! that acquired it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resource {
  CodecContext = 0,
  Frame = 1,
  Packet = 2,
  Scaler = 3,
}

#[cfg(test)]
thread_local! {
  static LIVE: std::cell::Cell<[isize; 4]> = const { std::cell::Cell::new([0; 4]) };
}

#[inline]
pub(crate) fn acquired(_resource: Resource) {
  #[cfg(test)]
  LIVE.with(|live| {
    let mut counts = live.get();
    counts[_resource as usize] += 1;
    live.set(counts);
  });
}

#[inline]
pub(crate) fn released(_resource: Resource) {
  #[cfg(test)]
  LIVE.with(|live| {
    let mut counts = live.get();
    counts[_resource as usize] -= 1;
    live.set(counts);
  });
}

/// Current live counts indexed by `Resource`
#[cfg(test)]
pub(crate) fn snapshot() -> [isize; 4] {
  LIVE.with(|live| live.get())
}
