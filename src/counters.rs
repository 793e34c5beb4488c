use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a registry's operation counters
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PackageCounters {
    pub find_package_calls: u64,
    pub find_symbol_calls: u64,
    pub intern_calls: u64,
    pub symbols_created: u64,
    pub conflicts: u64,
}

impl PackageCounters {
    pub fn add(&mut self, other: &PackageCounters) {
        self.find_package_calls = self
            .find_package_calls
            .saturating_add(other.find_package_calls);
        self.find_symbol_calls = self
            .find_symbol_calls
            .saturating_add(other.find_symbol_calls);
        self.intern_calls = self.intern_calls.saturating_add(other.intern_calls);
        self.symbols_created = self.symbols_created.saturating_add(other.symbols_created);
        self.conflicts = self.conflicts.saturating_add(other.conflicts);
    }

    pub fn total_lookups(&self) -> u64 {
        self.find_package_calls
            .saturating_add(self.find_symbol_calls)
            .saturating_add(self.intern_calls)
    }
}

#[derive(Debug, Default)]
pub(crate) struct AtomicCounters {
    find_package_calls: AtomicU64,
    find_symbol_calls: AtomicU64,
    intern_calls: AtomicU64,
    symbols_created: AtomicU64,
    conflicts: AtomicU64,
}

impl AtomicCounters {
    pub(crate) fn find_package(&self) {
        self.find_package_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn find_symbol(&self) {
        self.find_symbol_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn intern(&self) {
        self.intern_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn symbol_created(&self) {
        self.symbols_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PackageCounters {
        PackageCounters {
            find_package_calls: self.find_package_calls.load(Ordering::Relaxed),
            find_symbol_calls: self.find_symbol_calls.load(Ordering::Relaxed),
            intern_calls: self.intern_calls.load(Ordering::Relaxed),
            symbols_created: self.symbols_created.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.find_package_calls,
            &self.find_symbol_calls,
            &self.intern_calls,
            &self.symbols_created,
            &self.conflicts,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let live = AtomicCounters::default();
        live.intern();
        live.intern();
        live.symbol_created();
        live.find_symbol();

        let mut total = live.snapshot();
        assert_eq!(total.intern_calls, 2);
        assert_eq!(total.total_lookups(), 3);

        total.add(&live.snapshot());
        assert_eq!(total.intern_calls, 4);
        assert_eq!(total.symbols_created, 2);

        live.reset();
        assert_eq!(live.snapshot(), PackageCounters::default());
    }
}
