//! Derived functions - fields computed from already-extracted fields

use crate::properties::{PropertyRecord, Value};
use crate::{Error, Result};

/// A post-extraction function that reads the record and writes new fields.
///
/// Implementations must treat absent inputs as "no contribution" and still
/// write their output field, so derived fields are always present in the
/// final record. Returning an error means an extracted value violated the
/// function's precondition; the run's record is then discarded.
pub trait DerivedFunction: Send + Sync {
    /// Apply the function to one run's record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DerivedFunction`] if an input field has an unusable type.
    fn apply(&self, raw_text: &str, record: &mut PropertyRecord) -> Result<()>;
}

impl<F> DerivedFunction for F
where
    F: Fn(&str, &mut PropertyRecord) -> Result<()> + Send + Sync,
{
    fn apply(&self, raw_text: &str, record: &mut PropertyRecord) -> Result<()> {
        self(raw_text, record)
    }
}

/// Guarded ratio `output = numerator / denominator`.
///
/// The ratio is computed only when both inputs are present and truthy
/// (non-zero); otherwise `output` is written as `0.0`. Division by zero can
/// therefore never happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ratio {
    output: String,
    numerator: String,
    denominator: String,
}

impl Ratio {
    /// Output field name.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    fn operand(&self, record: &PropertyRecord, field: &str) -> Result<Option<f64>> {
        match record.get(field) {
            None => Ok(None),
            Some(value) if !value.is_truthy() => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                Error::DerivedFunction(format!(
                    "'{}' needs numeric '{field}', found {:?} value",
                    self.output,
                    value.value_type()
                ))
            }),
        }
    }
}

impl DerivedFunction for Ratio {
    fn apply(&self, _raw_text: &str, record: &mut PropertyRecord) -> Result<()> {
        let mut rate = 0.0;
        if let Some(numerator) = self.operand(record, &self.numerator)? {
            if let Some(denominator) = self.operand(record, &self.denominator)? {
                rate = numerator / denominator;
            }
        }
        record.insert(self.output.clone(), Value::Float(rate));
        Ok(())
    }
}

/// Build a guarded ratio function.
///
/// ```rust
/// use runlab::parser::{ratio, DerivedFunction};
/// use runlab::properties::PropertyRecord;
///
/// let rate = ratio("symmetrical_states_per_evaluation", "symmetrical_states", "evaluations");
/// let mut record = PropertyRecord::new()
///     .with("symmetrical_states", 120_i64)
///     .with("evaluations", 40_i64);
/// rate.apply("", &mut record)?;
/// assert_eq!(record.get_f64("symmetrical_states_per_evaluation"), Some(3.0));
/// # Ok::<(), runlab::Error>(())
/// ```
#[must_use]
pub fn ratio(
    output: impl Into<String>,
    numerator: impl Into<String>,
    denominator: impl Into<String>,
) -> Ratio {
    Ratio {
        output: output.into(),
        numerator: numerator.into(),
        denominator: denominator.into(),
    }
}
