//! Byte and time accounting for a single sync attempt.
//!
//! A [`SyncStats`] keeps five counters. The two byte counters only ever hold
//! whole bytes; the three time counters hold fractional seconds measured
//! with a monotonic clock. [`StatId::All`] addresses every category at once.
//!
//! Timers are easiest to use through [`ScopedTimer`], which ends its timer
//! exactly once when it goes out of scope, including on `?` returns.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Stat categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatId {
    /// Bytes transmitted.
    Xmit,
    /// Bytes received.
    Recv,
    /// Time spent moving data.
    CommTime,
    /// Time spent waiting on the peer.
    IdleTime,
    /// Time spent computing locally.
    CompTime,
    /// Every category above.
    All,
}

impl StatId {
    /// Every concrete category, in declaration order.
    pub const CATEGORIES: [StatId; 5] = [
        StatId::Xmit,
        StatId::Recv,
        StatId::CommTime,
        StatId::IdleTime,
        StatId::CompTime,
    ];

    /// The categories that can be timed.
    pub const TIMERS: [StatId; 3] = [StatId::CommTime, StatId::IdleTime, StatId::CompTime];

    /// True for the byte counters.
    pub fn is_bytes(self) -> bool {
        matches!(self, StatId::Xmit | StatId::Recv)
    }

    /// True for the time counters.
    pub fn is_time(self) -> bool {
        matches!(self, StatId::CommTime | StatId::IdleTime | StatId::CompTime)
    }

    fn categories(self) -> &'static [StatId] {
        match self {
            StatId::Xmit => &[StatId::Xmit],
            StatId::Recv => &[StatId::Recv],
            StatId::CommTime => &[StatId::CommTime],
            StatId::IdleTime => &[StatId::IdleTime],
            StatId::CompTime => &[StatId::CompTime],
            StatId::All => &Self::CATEGORIES,
        }
    }

    fn timers(self) -> Result<&'static [StatId]> {
        match self {
            StatId::CommTime => Ok(&[StatId::CommTime]),
            StatId::IdleTime => Ok(&[StatId::IdleTime]),
            StatId::CompTime => Ok(&[StatId::CompTime]),
            StatId::All => Ok(&Self::TIMERS),
            StatId::Xmit | StatId::Recv => Err(CoreError::NotATimer(self)),
        }
    }

    fn timer_slot(self) -> usize {
        match self {
            StatId::CommTime => 0,
            StatId::IdleTime => 1,
            _ => 2,
        }
    }
}

/// A point-in-time copy of all counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub xmit_bytes: u64,
    pub recv_bytes: u64,
    pub comm_time: f64,
    pub idle_time: f64,
    pub comp_time: f64,
}

impl StatsSnapshot {
    /// Communication + idle + computation time, in seconds.
    pub fn total_time(&self) -> f64 {
        self.comm_time + self.idle_time + self.comp_time
    }
}

#[derive(Default)]
struct StatsInner {
    xmit: u64,
    recv: u64,
    /// CommTime, IdleTime, CompTime.
    times: [f64; 3],
    started: [Option<Instant>; 3],
}

/// Per-strategy counters for the most recent sync attempt.
///
/// All methods take `&self`; a [`ScopedTimer`] only needs a shared borrow, so
/// a strategy can keep using its other state while a timer runs.
#[derive(Default)]
pub struct SyncStats {
    inner: Mutex<StatsInner>,
}

impl SyncStats {
    /// Create a new set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StatsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Zero the given counter, or every counter for [`StatId::All`].
    ///
    /// Running timers are left running.
    pub fn reset(&self, id: StatId) {
        let mut inner = self.lock();
        for &cat in id.categories() {
            match cat {
                StatId::Xmit => inner.xmit = 0,
                StatId::Recv => inner.recv = 0,
                timer => inner.times[timer.timer_slot()] = 0.0,
            }
        }
    }

    /// Add `amount` to a counter.
    ///
    /// Byte counters truncate `amount` toward zero first. Negative byte
    /// amounts are ignored.
    pub fn increment(&self, id: StatId, amount: f64) {
        let mut inner = self.lock();
        for &cat in id.categories() {
            match cat {
                StatId::Xmit => inner.xmit = inner.xmit.saturating_add(amount.trunc() as u64),
                StatId::Recv => inner.recv = inner.recv.saturating_add(amount.trunc() as u64),
                timer => inner.times[timer.timer_slot()] += amount,
            }
        }
    }

    /// Current value of a counter. [`StatId::All`] yields [`SyncStats::total_time`].
    pub fn get(&self, id: StatId) -> f64 {
        let inner = self.lock();
        match id {
            StatId::Xmit => inner.xmit as f64,
            StatId::Recv => inner.recv as f64,
            StatId::All => inner.times.iter().sum(),
            timer => inner.times[timer.timer_slot()],
        }
    }

    /// Communication + idle + computation time, in seconds.
    pub fn total_time(&self) -> f64 {
        self.get(StatId::All)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.lock();
        StatsSnapshot {
            xmit_bytes: inner.xmit,
            recv_bytes: inner.recv,
            comm_time: inner.times[0],
            idle_time: inner.times[1],
            comp_time: inner.times[2],
        }
    }

    /// Start (or restart) a timer.
    pub fn timer_start(&self, id: StatId) -> Result<()> {
        let timers = id.timers()?;
        let now = Instant::now();
        let mut inner = self.lock();
        for &cat in timers {
            inner.started[cat.timer_slot()] = Some(now);
        }
        Ok(())
    }

    /// Stop a timer and add the elapsed seconds to its counter.
    ///
    /// Returns the seconds committed. Fails without committing anything if
    /// any addressed timer is not running.
    pub fn timer_end(&self, id: StatId) -> Result<f64> {
        let timers = id.timers()?;
        let mut inner = self.lock();

        if let Some(&idle) = timers
            .iter()
            .find(|cat| inner.started[cat.timer_slot()].is_none())
        {
            return Err(CoreError::TimerNotRunning(idle));
        }

        let mut committed = 0.0;
        for &cat in timers {
            let slot = cat.timer_slot();
            if let Some(start) = inner.started[slot].take() {
                let elapsed = start.elapsed().as_secs_f64();
                inner.times[slot] += elapsed;
                committed += elapsed;
            }
        }
        Ok(committed)
    }

    /// True if the timer for a time category is running.
    pub fn is_running(&self, id: StatId) -> bool {
        match id.timers() {
            Ok(timers) => {
                let inner = self.lock();
                timers.iter().all(|cat| inner.started[cat.timer_slot()].is_some())
            }
            Err(_) => false,
        }
    }

    /// Start a timer that ends when the returned guard is dropped.
    pub fn scoped(&self, id: StatId) -> Result<ScopedTimer<'_>> {
        ScopedTimer::start(self, id)
    }
}

impl fmt::Debug for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyncStats").field(&self.snapshot()).finish()
    }
}

/// Times one lexical scope into a [`SyncStats`] category.
///
/// The timer is ended exactly once: by [`ScopedTimer::finish`], or otherwise
/// when the guard is dropped.
#[must_use = "the timer stops as soon as the guard is dropped"]
pub struct ScopedTimer<'a> {
    stats: &'a SyncStats,
    id: StatId,
    armed: bool,
}

impl<'a> ScopedTimer<'a> {
    /// Start timing `id`.
    pub fn start(stats: &'a SyncStats, id: StatId) -> Result<Self> {
        stats.timer_start(id)?;
        Ok(Self {
            stats,
            id,
            armed: true,
        })
    }

    /// The category being timed.
    pub fn id(&self) -> StatId {
        self.id
    }

    /// End the timer now and return the seconds committed.
    pub fn finish(mut self) -> Result<f64> {
        self.armed = false;
        self.stats.timer_end(self.id)
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.stats.timer_end(self.id) {
                tracing::warn!("scoped timer could not commit: {}", e);
            }
        }
    }
}
