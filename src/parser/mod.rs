//! Log-to-properties parser
//!
//! A [`Parser`] is the pattern registry plus the derived-function pipeline.
//! It is built once at setup time and then shared read-only across runs:
//!
//! ```text
//! raw text ──> extract (patterns, registration order)
//!          ──> apply_derived (functions, declaration order)
//!          ──> PropertyRecord
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use runlab::parser::{ratio, Parser};
//! use runlab::properties::ValueType;
//!
//! let mut parser = Parser::new();
//! parser.add_pattern("symmetry_group_order", r"Symmetry group order: (\d+)", true, ValueType::Int)?;
//! parser.add_pattern("evaluations", r"Evaluations: (\d+)", false, ValueType::Int)?;
//!
//! let record = parser.parse("Symmetry group order: 48\n")?;
//! assert_eq!(record.get_i64("symmetry_group_order"), Some(48));
//! assert!(record.get("evaluations").is_none());
//! # Ok::<(), runlab::Error>(())
//! ```

mod derived;
pub mod presets;
mod pattern;

pub use derived::{ratio, DerivedFunction, Ratio};
pub use pattern::PatternSpec;

use rustc_hash::FxHashSet;

use crate::properties::{PropertyRecord, ValueType};
use crate::{Error, Result};

/// Pattern registry and derived-function pipeline.
///
/// `Parser` is `Send + Sync`; wrap it in an `Arc` or borrow it across rayon
/// workers to parse many runs concurrently.
#[derive(Default)]
pub struct Parser {
    patterns: Vec<PatternSpec>,
    names: FxHashSet<String>,
    functions: Vec<Box<dyn DerivedFunction>>,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("patterns", &self.patterns)
            .field("functions", &self.functions.len())
            .finish()
    }
}

impl Parser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extraction rule.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateField`] if `name` is already registered,
    /// [`Error::InvalidPattern`] if the regex is unusable.
    pub fn add_pattern(
        &mut self,
        name: &str,
        regex: &str,
        required: bool,
        value_type: ValueType,
    ) -> Result<()> {
        if self.names.contains(name) {
            return Err(Error::DuplicateField(name.to_string()));
        }
        self.push_spec(PatternSpec::new(name, regex, required, value_type)?);
        Ok(())
    }

    /// Register an already-compiled pattern spec.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateField`] if the spec's name is already registered.
    pub fn add_spec(&mut self, spec: PatternSpec) -> Result<()> {
        if self.names.contains(spec.name()) {
            return Err(Error::DuplicateField(spec.name().to_string()));
        }
        self.push_spec(spec);
        Ok(())
    }

    fn push_spec(&mut self, spec: PatternSpec) {
        self.names.insert(spec.name().to_string());
        self.patterns.push(spec);
    }

    /// Append a derived function to the pipeline.
    pub fn add_function(&mut self, function: impl DerivedFunction + 'static) {
        self.functions.push(Box::new(function));
    }

    /// Move all patterns and functions of `other` into this parser.
    ///
    /// Patterns of `other` come after ours, and so do its functions.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateField`] if a pattern name exists in both parsers.
    /// Nothing is added in that case.
    pub fn extend(&mut self, other: Self) -> Result<()> {
        if let Some(dup) = other.patterns.iter().find(|p| self.names.contains(p.name())) {
            return Err(Error::DuplicateField(dup.name().to_string()));
        }
        for spec in other.patterns {
            self.push_spec(spec);
        }
        self.functions.extend(other.functions);
        Ok(())
    }

    /// Registered patterns in registration order.
    #[must_use]
    pub fn patterns(&self) -> &[PatternSpec] {
        &self.patterns
    }

    /// Number of derived functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Apply every pattern to `raw_text`.
    ///
    /// # Errors
    ///
    /// The first [`Error::MissingRequiredField`] or [`Error::MalformedField`]
    /// encountered, in registration order.
    pub fn extract(&self, raw_text: &str) -> Result<PropertyRecord> {
        let mut record = PropertyRecord::new();
        for spec in &self.patterns {
            if let Some(value) = spec.extract(raw_text)? {
                record.insert(spec.name(), value);
            }
        }
        Ok(record)
    }

    /// Run the derived functions in declaration order.
    ///
    /// # Errors
    ///
    /// Propagates the first derived-function failure.
    pub fn apply_derived(&self, raw_text: &str, mut record: PropertyRecord) -> Result<PropertyRecord> {
        for function in &self.functions {
            function.apply(raw_text, &mut record)?;
        }
        Ok(record)
    }

    /// Extract then derive.
    ///
    /// # Errors
    ///
    /// Any extraction or derivation error for this run.
    pub fn parse(&self, raw_text: &str) -> Result<PropertyRecord> {
        let record = self.extract(raw_text)?;
        let record = self.apply_derived(raw_text, record)?;
        tracing::trace!(fields = record.len(), "parsed run output");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Value;

    #[test]
    fn test_duplicate_pattern_rejected() {
        let mut parser = Parser::new();
        parser
            .add_pattern("cost", r"Plan cost: (\d+)", false, ValueType::Int)
            .unwrap();
        let err = parser
            .add_pattern("cost", r"cost=(\d+)", true, ValueType::Int)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateField(name) if name == "cost"));
        assert_eq!(parser.patterns().len(), 1);
    }

    #[test]
    fn test_extract_typed_value() {
        let mut parser = Parser::new();
        parser
            .add_pattern(
                "symmetry_group_order",
                r"Symmetry group order: (\d+)",
                true,
                ValueType::Int,
            )
            .unwrap();
        let record = parser.extract("Symmetry group order: 48").unwrap();
        assert_eq!(record.get("symmetry_group_order"), Some(&Value::Int(48)));
    }

    #[test]
    fn test_derived_functions_run_in_order() {
        let mut parser = Parser::new();
        parser.add_function(|_: &str, r: &mut PropertyRecord| -> Result<()> {
            r.insert("a", 2_i64);
            Ok(())
        });
        parser.add_function(|_: &str, r: &mut PropertyRecord| -> Result<()> {
            let a = r.get_i64("a").unwrap_or(0);
            r.insert("b", a * 10);
            Ok(())
        });
        let record = parser.parse("").unwrap();
        assert_eq!(record.get_i64("b"), Some(20));
    }

    #[test]
    fn test_extend_rejects_overlap_atomically() {
        let mut a = Parser::new();
        a.add_pattern("x", r"x=(\d+)", false, ValueType::Int).unwrap();
        let mut b = Parser::new();
        b.add_pattern("y", r"y=(\d+)", false, ValueType::Int).unwrap();
        b.add_pattern("x", r"X=(\d+)", false, ValueType::Int).unwrap();
        assert!(a.extend(b).is_err());
        assert_eq!(a.patterns().len(), 1);
    }

    #[test]
    fn test_parser_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Parser>();
    }
}
