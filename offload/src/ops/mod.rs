mod reference;
mod validate;

pub use reference::{compute, threshold_rule, ReferenceEngine, ThresholdRule};
pub use validate::{compare, Mismatch, ValidationResult};
