use std::collections::VecDeque;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Gamepad,
    Autoplay,
}

impl InputSource {
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            InputSource::Keyboard => 0,
            InputSource::Gamepad => 1,
            InputSource::Autoplay => 2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InputEdge {
    pub pressed: bool,
    pub source: InputSource,
    pub timestamp: Instant,
}

/// Turns raw press/release edges for the single jump button into at most one
/// jump per simulation tick.
#[derive(Debug, Default)]
pub struct JumpInput {
    pending_edges: VecDeque<InputEdge>,
    held_by_source: [bool; 3],
}

impl JumpInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_edge(&mut self, source: InputSource, pressed: bool, timestamp: Instant) {
        self.pending_edges.push_back(InputEdge {
            pressed,
            source,
            timestamp,
        });
    }

    pub fn press(&mut self, source: InputSource) {
        self.queue_edge(source, true, Instant::now());
    }

    pub fn release(&mut self, source: InputSource) {
        self.queue_edge(source, false, Instant::now());
    }

    /// Drains this tick's edges. True if the button went down at least once.
    /// Holding it on a second device, key repeat and extra presses within the
    /// same tick don't add jumps.
    pub fn take_jump(&mut self) -> bool {
        let mut jumped = false;
        while let Some(edge) = self.pending_edges.pop_front() {
            let was_down = self.is_held();
            self.held_by_source[edge.source.index()] = edge.pressed;
            if edge.pressed && !was_down {
                jumped = true;
            }
        }
        jumped
    }

    pub fn is_held(&self) -> bool {
        self.held_by_source.iter().any(|h| *h)
    }

    pub fn clear(&mut self) {
        self.pending_edges.clear();
        self.held_by_source = [false; 3];
    }
}
