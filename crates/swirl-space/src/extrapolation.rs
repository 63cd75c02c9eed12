//! Extrapolation rules: how a field is valued outside its sampled support.

use std::sync::Arc;

/// How a lattice-backed field resolves indices that fall outside its
/// stored values.
///
/// Leaf rules apply to every face of the domain. [`Extrapolation::Mixed`]
/// assigns one leaf rule to each side of each axis, which is how domains
/// with e.g. an open top and closed walls elsewhere are expressed.
///
/// # Examples
///
/// ```
/// use swirl_space::Extrapolation;
///
/// let ext = Extrapolation::mixed(vec![
///     [Extrapolation::ZERO, Extrapolation::ZERO],
///     [Extrapolation::Boundary, Extrapolation::ONE],
/// ]);
/// assert_eq!(ext.side(1, true), &Extrapolation::ONE);
/// assert_eq!(ext.gradient().side(1, true), &Extrapolation::ZERO);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Extrapolation {
    /// Every outside value equals the given constant.
    Constant(f64),
    /// Zero-gradient: outside indices clamp to the nearest stored value.
    Boundary,
    /// Outside indices wrap to the opposite side.
    Periodic,
    /// One leaf rule per axis, `[lower, upper]`.
    Mixed(Arc<[[Extrapolation; 2]]>),
}

/// Result of resolving a (possibly outside) lattice index along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum AxisLookup {
    /// A stored index.
    Index(usize),
    /// The index is outside and the field takes this value there.
    Value(f64),
}

impl Extrapolation {
    /// Constant zero outside the support.
    pub const ZERO: Extrapolation = Extrapolation::Constant(0.0);
    /// Constant one outside the support.
    pub const ONE: Extrapolation = Extrapolation::Constant(1.0);

    /// Build a per-axis, per-side rule. Nested `Mixed` rules are resolved
    /// to their leaf for the same axis and side.
    pub fn mixed(per_axis: Vec<[Extrapolation; 2]>) -> Self {
        let flattened: Vec<[Extrapolation; 2]> = per_axis
            .into_iter()
            .enumerate()
            .map(|(axis, [lo, hi])| [lo.side(axis, false).clone(), hi.side(axis, true).clone()])
            .collect();
        let first = flattened.first().map(|[lo, _]| lo.clone());
        let uniform = first.filter(|f| flattened.iter().all(|[lo, hi]| lo == f && hi == f));
        match uniform {
            Some(rule) => rule,
            None => Self::Mixed(flattened.into()),
        }
    }

    /// The leaf rule governing one side of one axis.
    pub fn side(&self, axis: usize, upper: bool) -> &Extrapolation {
        match self {
            Self::Mixed(per_axis) => match per_axis.get(axis) {
                Some(sides) => &sides[upper as usize],
                None => &Self::ZERO,
            },
            leaf => leaf,
        }
    }

    /// Returns `true` if both sides of `axis` wrap.
    pub fn is_periodic(&self, axis: usize) -> bool {
        matches!(self.side(axis, false), Self::Periodic)
            && matches!(self.side(axis, true), Self::Periodic)
    }

    /// The extrapolation of a spatial derivative of a field with this rule.
    ///
    /// Constants and zero-gradient edges differentiate to zero; periodic
    /// edges stay periodic.
    pub fn gradient(&self) -> Extrapolation {
        match self {
            Self::Constant(_) | Self::Boundary => Self::ZERO,
            Self::Periodic => Self::Periodic,
            Self::Mixed(per_axis) => Self::Mixed(
                per_axis
                    .iter()
                    .map(|[lo, hi]| [lo.gradient(), hi.gradient()])
                    .collect::<Vec<_>>()
                    .into(),
            ),
        }
    }

    /// Resolve index `val` on an axis with `len` stored values.
    pub(crate) fn resolve_axis(&self, axis: usize, val: i64, len: usize) -> AxisLookup {
        let n = len as i64;
        if val >= 0 && val < n {
            return AxisLookup::Index(val as usize);
        }
        match self.side(axis, val >= n) {
            Self::Constant(c) => AxisLookup::Value(*c),
            Self::Boundary => AxisLookup::Index(val.clamp(0, n - 1) as usize),
            Self::Periodic => AxisLookup::Index(val.rem_euclid(n) as usize),
            Self::Mixed(_) => AxisLookup::Value(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_leaf() -> impl Strategy<Value = Extrapolation> {
        prop_oneof![
            (-5.0f64..5.0).prop_map(Extrapolation::Constant),
            Just(Extrapolation::Boundary),
            Just(Extrapolation::Periodic),
        ]
    }

    #[test]
    fn resolve_axis_in_bounds() {
        assert_eq!(
            Extrapolation::ZERO.resolve_axis(0, 2, 5),
            AxisLookup::Index(2)
        );
        assert_eq!(
            Extrapolation::Periodic.resolve_axis(0, 0, 5),
            AxisLookup::Index(0)
        );
    }

    #[test]
    fn resolve_axis_constant_out_of_bounds() {
        assert_eq!(
            Extrapolation::ONE.resolve_axis(0, -1, 5),
            AxisLookup::Value(1.0)
        );
        assert_eq!(
            Extrapolation::ZERO.resolve_axis(0, 5, 5),
            AxisLookup::Value(0.0)
        );
    }

    #[test]
    fn resolve_axis_boundary_clamps() {
        assert_eq!(
            Extrapolation::Boundary.resolve_axis(0, -1, 5),
            AxisLookup::Index(0)
        );
        assert_eq!(
            Extrapolation::Boundary.resolve_axis(0, 7, 5),
            AxisLookup::Index(4)
        );
    }

    #[test]
    fn resolve_axis_periodic_wraps() {
        let p = Extrapolation::Periodic;
        assert_eq!(p.resolve_axis(0, -1, 5), AxisLookup::Index(4));
        assert_eq!(p.resolve_axis(0, 5, 5), AxisLookup::Index(0));
        assert_eq!(p.resolve_axis(0, 7, 5), AxisLookup::Index(2));
    }

    #[test]
    fn mixed_selects_side() {
        let ext = Extrapolation::mixed(vec![
            [Extrapolation::ZERO, Extrapolation::ONE],
            [Extrapolation::Periodic, Extrapolation::Periodic],
        ]);
        assert_eq!(ext.resolve_axis(0, -1, 4), AxisLookup::Value(0.0));
        assert_eq!(ext.resolve_axis(0, 4, 4), AxisLookup::Value(1.0));
        assert_eq!(ext.resolve_axis(1, 4, 4), AxisLookup::Index(0));
        assert!(ext.is_periodic(1));
        assert!(!ext.is_periodic(0));
    }

    #[test]
    fn uniform_mixed_collapses_to_leaf() {
        let ext = Extrapolation::mixed(vec![
            [Extrapolation::Boundary, Extrapolation::Boundary],
            [Extrapolation::Boundary, Extrapolation::Boundary],
        ]);
        assert_eq!(ext, Extrapolation::Boundary);
    }

    #[test]
    fn gradient_rules() {
        assert_eq!(Extrapolation::ONE.gradient(), Extrapolation::ZERO);
        assert_eq!(Extrapolation::Boundary.gradient(), Extrapolation::ZERO);
        assert_eq!(Extrapolation::Periodic.gradient(), Extrapolation::Periodic);
    }

    proptest! {
        #[test]
        fn in_range_indices_are_untouched(rule in arb_leaf(), len in 1usize..20, i in 0i64..20) {
            let i = i % len as i64;
            prop_assert_eq!(rule.resolve_axis(0, i, len), AxisLookup::Index(i as usize));
        }

        #[test]
        fn resolved_indices_stay_in_range(rule in arb_leaf(), len in 1usize..20, i in -50i64..50) {
            if let AxisLookup::Index(r) = rule.resolve_axis(0, i, len) {
                prop_assert!(r < len);
            }
        }

        #[test]
        fn gradient_is_idempotent_after_first(rule in arb_leaf()) {
            let g = rule.gradient();
            prop_assert_eq!(g.gradient(), g);
        }
    }
}
