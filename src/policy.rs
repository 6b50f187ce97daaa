//! Fragmentation threshold that decides when `compact` escalates to a full rebuild.

/// Denominator the tombstone count is measured against.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ThresholdBasis {
    /// Live (occupied) slots.
    #[default]
    Occupied,
    /// All allocated slots, tombstones included.
    Allocated,
}

/// Compaction policy for a [`LazyTable`](crate::LazyTable).
///
/// After the trailing trim, `compact` runs a full rebuild when
///
/// ```text
/// tombstones * 100 > basis_count * percent
/// ```
///
/// The default (`Occupied`, 50%) rebuilds once tombstones outnumber half of
/// the live entries.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CompactionPolicy {
    basis: ThresholdBasis,
    percent: Option<u32>,
}

impl CompactionPolicy {
    pub const fn new(basis: ThresholdBasis, percent: u32) -> Self {
        Self {
            basis,
            percent: Some(percent),
        }
    }

    /// Never rebuild automatically. Trailing trim still applies and
    /// `force_compact` can be called explicitly.
    pub const fn never() -> Self {
        Self {
            basis: ThresholdBasis::Occupied,
            percent: None,
        }
    }

    pub const fn with_basis(self, basis: ThresholdBasis) -> Self {
        Self { basis, ..self }
    }

    pub const fn with_percent(self, percent: u32) -> Self {
        Self {
            percent: Some(percent),
            ..self
        }
    }

    pub const fn basis(&self) -> ThresholdBasis {
        self.basis
    }

    /// `None` when automatic rebuilds are disabled.
    pub const fn percent(&self) -> Option<u32> {
        self.percent
    }

    /// Whether `tombstones` dead slots out of `allocated` total warrant a rebuild.
    pub fn should_rebuild(&self, tombstones: usize, allocated: usize) -> bool {
        let Some(percent) = self.percent else {
            return false;
        };
        if tombstones == 0 {
            return false;
        }
        let basis = match self.basis {
            ThresholdBasis::Occupied => allocated - tombstones,
            ThresholdBasis::Allocated => allocated,
        };
        (tombstones as u128) * 100 > (basis as u128) * (percent as u128)
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self::new(ThresholdBasis::Occupied, 50)
    }
}
