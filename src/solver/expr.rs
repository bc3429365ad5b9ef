//! Generic option-expression tree and its textual rendering

use std::fmt;

use serde::{Deserialize, Serialize};

/// A node of the solver's nested option syntax.
///
/// Rendering follows the solver's grammar: calls are `name(arg,arg)`,
/// keyword arguments are `key=value`, lists are `[a,b]`, and bindings are
/// `let(var, bound, body)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Bare identifier, enum value or variable reference
    Ident {
        /// Identifier text
        name: String,
    },
    /// Integer literal
    Int {
        /// Literal value
        value: i64,
    },
    /// Boolean literal
    Bool {
        /// Literal value
        value: bool,
    },
    /// List literal
    List {
        /// Elements in order
        items: Vec<Expr>,
    },
    /// Plugin call
    Call {
        /// Plugin name
        name: String,
        /// Arguments in order
        args: Vec<Arg>,
    },
    /// Variable binding shared by the body
    Let {
        /// Variable name
        var: String,
        /// Bound expression
        bound: Box<Expr>,
        /// Expression evaluated with the binding in scope
        body: Box<Expr>,
    },
}

/// A call argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    /// Positional argument
    Positional(Expr),
    /// `key=value` argument
    Keyword(String, Expr),
}

impl Expr {
    /// Identifier node.
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident { name: name.into() }
    }

    /// Call node.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self::Call {
            name: name.into(),
            args,
        }
    }

    /// Call node without arguments, rendered as `name()`.
    #[must_use]
    pub fn unit(name: impl Into<String>) -> Self {
        Self::call(name, Vec::new())
    }

    /// List node.
    #[must_use]
    pub const fn list(items: Vec<Self>) -> Self {
        Self::List { items }
    }

    /// Binding node.
    #[must_use]
    pub fn bind(var: impl Into<String>, bound: Self, body: Self) -> Self {
        Self::Let {
            var: var.into(),
            bound: Box::new(bound),
            body: Box::new(body),
        }
    }
}

impl Arg {
    /// Keyword argument.
    #[must_use]
    pub fn kw(key: impl Into<String>, value: impl Into<Expr>) -> Self {
        Self::Keyword(key.into(), value.into())
    }

    /// Positional argument.
    #[must_use]
    pub fn pos(value: impl Into<Expr>) -> Self {
        Self::Positional(value.into())
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Int { value }
    }
}

impl From<u32> for Expr {
    fn from(value: u32) -> Self {
        Self::Int {
            value: i64::from(value),
        }
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Bool { value }
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Self::ident(name)
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident { name } => f.write_str(name),
            Self::Int { value } => write!(f, "{value}"),
            Self::Bool { value } => write!(f, "{value}"),
            Self::List { items } => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Call { name, args } => {
                write!(f, "{name}(")?;
                write_joined(f, args)?;
                f.write_str(")")
            }
            Self::Let { var, bound, body } => write!(f, "let({var}, {bound}, {body})"),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional(value) => write!(f, "{value}"),
            Self::Keyword(key, value) => write!(f, "{key}={value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_call_with_keywords() {
        let expr = Expr::call("ipdb", vec![Arg::kw("max_time", 900_u32)]);
        assert_eq!(expr.to_string(), "ipdb(max_time=900)");
    }

    #[test]
    fn test_render_unit_call_and_list() {
        let expr = Expr::list(vec![Expr::unit("goal_relevance"), Expr::unit("dfp")]);
        assert_eq!(expr.to_string(), "[goal_relevance(),dfp()]");
    }

    #[test]
    fn test_render_let() {
        let expr = Expr::bind(
            "sym",
            Expr::call("structural_symmetries", vec![Arg::kw("time_bound", 0_u32)]),
            Expr::call("astar", vec![Arg::pos("h"), Arg::kw("symmetries", "sym")]),
        );
        assert_eq!(
            expr.to_string(),
            "let(sym, structural_symmetries(time_bound=0), astar(h,symmetries=sym))"
        );
    }

    #[test]
    fn test_render_bool() {
        let expr = Expr::call("exact", vec![Arg::kw("before_merging", false)]);
        assert_eq!(expr.to_string(), "exact(before_merging=false)");
    }
}
