//! Core-to-memory capacity reconciliation.
//!
//! The pricing model grants one core per full 4 GiB of memory, rounded up,
//! with a floor of one core. Callers may supply either side of the pair and
//! have the other derived; when both are supplied they must agree.

use thiserror::Error;

/// Memory granted per core, in MiB.
const MIB_PER_CORE: u32 = 4096;
/// Memory applied when neither cores nor memory is requested, in MiB.
const DEFAULT_MEMORY_MIB: u32 = 1024;
/// Cores applied when neither cores nor memory is requested.
const DEFAULT_CORES: u32 = 1;

/// Errors raised when a cores/memory pair violates the capacity rule.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CapacityError {
    /// Raised when the supplied core count does not match the core count the
    /// supplied memory entitles the machine to.
    #[error(
        "expected {expected} cores for {memory_gib}GiB memory, got {cores}; \
         specify one core per full 4GiB of memory"
    )]
    CoreMismatch {
        /// Core count the supplied memory entitles the machine to.
        expected: u32,
        /// Supplied memory, in whole GiB.
        memory_gib: u32,
        /// Core count the caller supplied.
        cores: u32,
    },
}

/// Normalises a cores/memory pair against the capacity rule.
///
/// Zero means "unset" on either side. Both unset applies the defaults, one
/// side set derives the other, and both set verifies the pairing.
///
/// # Errors
///
/// Returns [`CapacityError::CoreMismatch`] when both sides are set and the
/// core count is not exactly the count the memory entitles the machine to.
pub fn reconcile(cores: u32, memory: u32) -> Result<(u32, u32), CapacityError> {
    match (cores, memory) {
        (0, 0) => Ok((DEFAULT_CORES, DEFAULT_MEMORY_MIB)),
        (0, mem) => Ok((expected_cores(mem), mem)),
        (count, 0) => Ok((count, memory_for_cores(count))),
        (count, mem) => {
            let expected = expected_cores(mem);
            if count == expected {
                Ok((count, mem))
            } else {
                Err(CapacityError::CoreMismatch {
                    expected,
                    memory_gib: mem.div_euclid(1024),
                    cores: count,
                })
            }
        }
    }
}

/// Exact integer ceiling of `memory / 4096`, floored at one core. Values
/// just under a 4096 boundary still compute to one core, never zero.
fn expected_cores(memory: u32) -> u32 {
    memory.div_ceil(MIB_PER_CORE).max(1)
}

fn memory_for_cores(cores: u32) -> u32 {
    DEFAULT_MEMORY_MIB.max(cores.saturating_sub(1).saturating_mul(MIB_PER_CORE))
}
