//! Anti-Optimization Primitives
//!
//! Called symmetrically around every measured region so the optimizer cannot
//! delete the workload or move memory operations across a timestamp.

use std::sync::atomic::{Ordering, compiler_fence, fence};

/// Consume a value so the computation producing it cannot be elided
#[inline(always)]
pub fn consume<T>(value: T) {
    drop(std::hint::black_box(value));
}

/// Full compiler and memory reordering barrier
#[inline(always)]
pub fn reorder_barrier() {
    compiler_fence(Ordering::SeqCst);
    fence(Ordering::SeqCst);
    compiler_fence(Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_runs_drop() {
        struct Flag<'a>(&'a std::cell::Cell<bool>);
        impl Drop for Flag<'_> {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = std::cell::Cell::new(false);
        consume(Flag(&dropped));
        reorder_barrier();
        assert!(dropped.get());
    }
}
