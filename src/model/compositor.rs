use crate::equation::{CompiledRate, RateExpr};
use crate::registry::Named;

/// A state variable of the system, e.g. the concentration of a species.
///
/// Besides its current and initial value a compositor carries the running sum of all
/// rate contributions declared for it and, once the system is compiled, the callable
/// computing its derivative.
#[derive(Debug, Clone)]
pub struct Compositor {
    name: String,
    initial_value: f64,
    value: f64,
    rate: RateExpr,
    rhs: Option<CompiledRate>,
}

impl Compositor {
    pub fn new(name: impl Into<String>, initial_value: f64) -> Self {
        Self {
            name: name.into(),
            initial_value,
            value: initial_value,
            rate: RateExpr::zero(),
            rhs: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Accumulated rate expression, before constants are substituted.
    pub fn rate(&self) -> &RateExpr {
        &self.rate
    }

    /// Compiled derivative, present only while the system is compiled.
    pub fn rhs(&self) -> Option<&CompiledRate> {
        self.rhs.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub(crate) fn set_initial_value(&mut self, value: f64) {
        self.initial_value = value;
    }

    pub(crate) fn reset_value(&mut self) {
        self.value = self.initial_value;
    }

    pub(crate) fn add_rate(&mut self, contribution: &RateExpr) {
        let rate = std::mem::take(&mut self.rate);
        self.rate = rate.add(contribution.clone());
    }

    pub(crate) fn set_rhs(&mut self, rhs: CompiledRate) {
        self.rhs = Some(rhs);
    }

    pub(crate) fn reset_rate(&mut self) {
        self.rate = RateExpr::zero();
        self.rhs = None;
    }
}

impl Named for Compositor {
    fn name(&self) -> &str {
        &self.name
    }
}
