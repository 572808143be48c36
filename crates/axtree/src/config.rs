//! Tree construction options.

/// How `aria-*` attributes reach a node's property map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AriaProperties {
    /// Copy every `aria-*` attribute verbatim (string values).
    #[default]
    PassThrough,
    /// Only computed properties (heading `level`).
    Omit,
}

/// Options for [`AccessibilityTree`](crate::AccessibilityTree).
#[derive(Debug, Clone, Default)]
pub struct TreeConfig {
    /// Property policy.
    pub aria_properties: AriaProperties,
    /// Emit `disabled` / `expanded` as explicit `false` instead of leaving
    /// them out.
    pub include_false_states: bool,
}

impl TreeConfig {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the property policy.
    pub fn with_aria_properties(mut self, policy: AriaProperties) -> Self {
        self.aria_properties = policy;
        self
    }

    /// Emit false-valued states.
    pub fn with_false_states(mut self, include: bool) -> Self {
        self.include_false_states = include;
        self
    }
}
