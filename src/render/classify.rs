//! Route classification.

use std::collections::HashSet;

/// Rendering strategy for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Precomputed content with a long TTL.
    Static,
    /// On-demand content keyed by parameters, short TTL.
    Dynamic,
    /// Static path first, dynamic fallback on generation failure.
    Adaptive,
}

/// Static membership sets supplied at startup.
///
/// Classification is a pure function of the route string: a route in the
/// static set is `Static`, a route in the dynamic set is `Dynamic`, and
/// everything else defaults to `Adaptive`. The static set wins when a route
/// appears in both.
#[derive(Debug, Clone, Default)]
pub struct RouteRules {
    static_routes: HashSet<String>,
    dynamic_routes: HashSet<String>,
}

impl RouteRules {
    pub fn new(
        static_routes: impl IntoIterator<Item = impl Into<String>>,
        dynamic_routes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            static_routes: static_routes.into_iter().map(Into::into).collect(),
            dynamic_routes: dynamic_routes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, route: &str) -> RouteClass {
        if self.static_routes.contains(route) {
            RouteClass::Static
        } else if self.dynamic_routes.contains(route) {
            RouteClass::Dynamic
        } else {
            RouteClass::Adaptive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RouteRules {
        RouteRules::new(["/docs", "/about"], ["/search", "/dashboard"])
    }

    #[test]
    fn static_set_routes_classify_static() {
        assert_eq!(rules().classify("/docs"), RouteClass::Static);
        assert_eq!(rules().classify("/about"), RouteClass::Static);
    }

    #[test]
    fn dynamic_set_routes_classify_dynamic() {
        assert_eq!(rules().classify("/search"), RouteClass::Dynamic);
    }

    #[test]
    fn unknown_routes_default_to_adaptive() {
        assert_eq!(rules().classify("/unknown-route"), RouteClass::Adaptive);
    }

    #[test]
    fn classification_is_pure() {
        let rules = rules();
        let first = rules.classify("/docs");
        for _ in 0..10 {
            assert_eq!(rules.classify("/docs"), first);
        }
    }

    #[test]
    fn static_wins_when_listed_in_both_sets() {
        let rules = RouteRules::new(["/both"], ["/both"]);
        assert_eq!(rules.classify("/both"), RouteClass::Static);
    }
}
