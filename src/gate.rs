//! Spin-based reader/writer gate
//!
//! The gate is the single mutual-exclusion primitive of the engine, used at
//! two granularities: one engine-wide gate around structural operations and
//! one gate per graph element around its own fields.
//!
//! State is a single packed `AtomicU32`: the high byte counts write tickets,
//! the low 24 bits count live readers. Acquisition spins with `yield_now`
//! and never blocks in the OS; after a very large bounded number of retries
//! it fails with [`GateError::Conflict`] instead of deadlocking.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use thiserror::Error;

/// One write ticket, parked above the reader count.
const WRITE_UNIT: u32 = 1 << 24;
/// Mask selecting the write-ticket field.
const WRITE_MASK: u32 = 0xff00_0000;
/// Mask selecting the live-reader count.
const READER_MASK: u32 = WRITE_UNIT - 1;

/// Spin retries before an acquisition gives up. Effectively forever under
/// normal contention; exhaustion indicates a stuck or leaked holder.
const RETRY_BUDGET: u64 = 1 << 36;

/// Gate acquisition errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    #[error("gate retry budget exhausted: concurrent access conflict")]
    Conflict,
}

pub type GateResult<T> = Result<T, GateError>;

/// A spin/yield reader-writer gate.
///
/// Many readers may hold the gate at once; a writer excludes all readers and
/// all other writers. There is no fairness: a writer can be starved by a
/// continuous stream of readers and vice versa.
#[derive(Debug, Default)]
pub struct Gate {
    bits: AtomicU32,
}

impl Gate {
    pub fn new() -> Self {
        Gate {
            bits: AtomicU32::new(0),
        }
    }

    /// Acquire shared read access.
    ///
    /// Spins while any write ticket is present, then optimistically bumps the
    /// reader count; if a writer slipped in between the check and the bump,
    /// the bump is undone and the attempt repeats.
    pub fn read_acquire(&self) -> GateResult<()> {
        let mut spins: u64 = 0;
        loop {
            while self.bits.load(Ordering::Acquire) & WRITE_MASK != 0 {
                Self::spin(&mut spins)?;
            }

            let after = self.bits.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
            if after & WRITE_MASK == 0 {
                return Ok(());
            }

            // A writer arrived first; back out and retry.
            self.bits.fetch_sub(1, Ordering::AcqRel);
            Self::spin(&mut spins)?;
        }
    }

    /// Release shared read access previously acquired with [`read_acquire`].
    ///
    /// [`read_acquire`]: Gate::read_acquire
    pub fn read_release(&self) {
        self.bits.fetch_sub(1, Ordering::Release);
    }

    /// Acquire exclusive write access.
    ///
    /// Adds one write ticket; the thread whose ticket made the write field
    /// read back as exactly one is the writer-elect and waits for the reader
    /// count to drain. Any other ticket holder backs out and retries.
    pub fn write_acquire(&self) -> GateResult<()> {
        let mut spins: u64 = 0;
        loop {
            while self.bits.load(Ordering::Acquire) & WRITE_MASK != 0 {
                Self::spin(&mut spins)?;
            }

            let after = self
                .bits
                .fetch_add(WRITE_UNIT, Ordering::AcqRel)
                .wrapping_add(WRITE_UNIT);
            if after & WRITE_MASK == WRITE_UNIT {
                // Writer-elect: wait for in-flight readers to finish.
                while self.bits.load(Ordering::Acquire) & READER_MASK != 0 {
                    if let Err(e) = Self::spin(&mut spins) {
                        self.bits.fetch_sub(WRITE_UNIT, Ordering::AcqRel);
                        return Err(e);
                    }
                }
                return Ok(());
            }

            self.bits.fetch_sub(WRITE_UNIT, Ordering::AcqRel);
            Self::spin(&mut spins)?;
        }
    }

    /// Release exclusive write access previously acquired with
    /// [`write_acquire`].
    ///
    /// [`write_acquire`]: Gate::write_acquire
    pub fn write_release(&self) {
        self.bits.fetch_sub(WRITE_UNIT, Ordering::Release);
    }

    /// Run `f` under shared read access.
    pub fn read_scope<R>(&self, f: impl FnOnce() -> R) -> GateResult<R> {
        self.read_acquire()?;
        let out = f();
        self.read_release();
        Ok(out)
    }

    /// Run `f` under exclusive write access.
    pub fn write_scope<R>(&self, f: impl FnOnce() -> R) -> GateResult<R> {
        self.write_acquire()?;
        let out = f();
        self.write_release();
        Ok(out)
    }

    fn spin(spins: &mut u64) -> GateResult<()> {
        *spins += 1;
        if *spins > RETRY_BUDGET {
            return Err(GateError::Conflict);
        }
        thread::yield_now();
        Ok(())
    }
}

/// A value protected by its own [`Gate`].
///
/// This is the field-level tier: each graph element owns one `Gated` body
/// holding its mutable state. Access is closure-scoped so the gate is always
/// released on the way out.
#[derive(Debug)]
pub struct Gated<T> {
    gate: Gate,
    value: UnsafeCell<T>,
}

// The gate guarantees shared-xor-exclusive access to the cell, but readers
// on different threads hold `&T` at the same time, so `T` must be `Sync`
// as well (the same bound std::sync::RwLock places on its payload).
unsafe impl<T: Send + Sync> Sync for Gated<T> {}

impl<T> Gated<T> {
    pub fn new(value: T) -> Self {
        Gated {
            gate: Gate::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Run `f` with shared access to the value.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> GateResult<R> {
        self.gate.read_acquire()?;
        let out = f(unsafe { &*self.value.get() });
        self.gate.read_release();
        Ok(out)
    }

    /// Run `f` with exclusive access to the value.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> GateResult<R> {
        self.gate.write_acquire()?;
        let out = f(unsafe { &mut *self.value.get() });
        self.gate.write_release();
        Ok(out)
    }

    /// Direct access through a unique reference, bypassing the gate.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}
