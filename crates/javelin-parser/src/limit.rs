//! Per-parse resource budget.
//!
//! Every limit is checked while parsing is in flight: the source cap before
//! lexing, the token cap at lexer completion, the node cap at every arena
//! allocation, the recursion cap at every descent into a nesting-capable
//! production, and the wall-clock deadline at token consumption and
//! recursion boundaries.

use std::fmt;
use std::time::{Duration, Instant};

/// A `LimitTracker` enforces one limit and keeps track of utilization so
/// callers can report how close to the limit a parse came.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High water mark for this limit.
    pub high: usize,
    /// The limit itself.
    pub limit: usize,
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    /// Count one step. Returns `true` when the limit is now exceeded.
    pub fn check_and_increment(&mut self) -> bool {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
        self.current > self.limit
    }

    pub fn decrement(&mut self) {
        self.current -= 1;
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit: {}, high: {}", self.limit, self.high)
    }
}

/// The five per-parse limits with their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    /// Maximum source size, in bytes of the UTF-8 encoding.
    pub source_bytes: usize,
    /// Maximum number of significant (non-trivia) tokens.
    pub tokens: usize,
    /// Maximum number of arena nodes.
    pub nodes: usize,
    /// Maximum recursion depth for nested expressions, types, statements
    /// and patterns.
    pub recursion: usize,
    /// Wall-clock budget for one parse.
    pub deadline: Duration,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            source_bytes: 10 * 1024 * 1024,
            tokens: 1_000_000,
            nodes: 10_000_000,
            recursion: 200,
            deadline: Duration::from_secs(30),
        }
    }
}

/// Amortized wall-clock check.
///
/// `Instant::now()` is not free, so the deadline is probed once every
/// [`Deadline::STRIDE`] ticks; recursion boundaries probe unconditionally.
#[derive(Debug, Clone)]
pub(crate) struct Deadline {
    started: Instant,
    budget: Duration,
    ticks: u32,
}

impl Deadline {
    const STRIDE: u32 = 64;

    pub(crate) fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
            ticks: 0,
        }
    }

    /// Tick once per token consumption. Returns `true` when the budget is
    /// spent, checked every [`Self::STRIDE`] ticks.
    pub(crate) fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks % Self::STRIDE == 0 {
            self.expired()
        } else {
            false
        }
    }

    /// Unconditional probe, used at recursion boundaries.
    pub(crate) fn expired(&self) -> bool {
        self.started.elapsed() > self.budget
    }
}
