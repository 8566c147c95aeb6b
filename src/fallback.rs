//! Ordered fallback between measurement sources.
//!
//! Several body metrics, and the annotation line placements, can come from
//! detected keypoints, from the silhouette contour, or from a fixed body
//! proportion. [`Fallback`] holds at most one strategy per [`Tier`] and always
//! tries them in tier order, no matter the order they were registered in.

/// Source of a resolved value, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Keypoints,
    Contour,
    Proportional,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Keypoints, Tier::Contour, Tier::Proportional];
}

/// A value together with the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub tier: Tier,
}

type Strategy<'a, T> = Box<dyn FnOnce() -> Option<T> + 'a>;

/// Lazily evaluated keypoint → contour → proportional chain.
pub struct Fallback<'a, T> {
    strategies: [Option<Strategy<'a, T>>; 3],
}

impl<'a, T> Fallback<'a, T> {
    pub fn new() -> Self {
        Self {
            strategies: [None, None, None],
        }
    }

    pub fn keypoints(self, strategy: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.with(Tier::Keypoints, strategy)
    }

    pub fn contour(self, strategy: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.with(Tier::Contour, strategy)
    }

    pub fn proportional(self, strategy: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.with(Tier::Proportional, strategy)
    }

    fn with(mut self, tier: Tier, strategy: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.strategies[tier as usize] = Some(Box::new(strategy));
        self
    }

    /// Run strategies in tier order and return the first value produced.
    pub fn resolve(self) -> Option<Resolved<T>> {
        Tier::ALL
            .into_iter()
            .zip(self.strategies)
            .filter_map(|(tier, strategy)| strategy.map(|s| (tier, s)))
            .find_map(|(tier, strategy)| strategy().map(|value| Resolved { value, tier }))
    }

    pub fn value(self) -> Option<T> {
        self.resolve().map(|r| r.value)
    }
}

impl<T> Default for Fallback<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}
