use foundation::time::Time;

/// Largest step a single frame may advance, in seconds.
///
/// Hidden tabs and debugger pauses produce huge gaps between callbacks; the
/// clock caps them so animations resume where they left off.
pub const MAX_FRAME_DT_S: f64 = 0.1;

/// Per-frame timing handed to everything the render loop advances.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame.
    pub dt_s: f64,
    /// Monotonic seconds since the clock started.
    pub elapsed: Time,
}

/// Converts host timestamps (e.g. `requestAnimationFrame`) into [`Frame`]s.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last_host_time: Option<Time>,
    next_index: u64,
    elapsed_s: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock to `host_time`.
    ///
    /// The first tick has `dt_s == 0`. Host timestamps that go backwards are
    /// treated as a zero step, so `elapsed` never decreases.
    pub fn tick(&mut self, host_time: Time) -> Frame {
        let dt_s = match self.last_host_time {
            Some(last) => host_time.since(last).min(MAX_FRAME_DT_S),
            None => 0.0,
        };
        if self.last_host_time.is_none_or(|last| host_time >= last) {
            self.last_host_time = Some(host_time);
        }
        self.elapsed_s += dt_s;

        let frame = Frame {
            index: self.next_index,
            dt_s,
            elapsed: Time(self.elapsed_s),
        };
        self.next_index = self.next_index.wrapping_add(1);
        frame
    }

    pub fn elapsed(&self) -> Time {
        Time(self.elapsed_s)
    }

    pub fn frames(&self) -> u64 {
        self.next_index
    }
}
