/**
Combinator tree for grammars

A grammar is built from a closed set of node kinds: the identity `Pass`,
sequence `Then`, ordered choice `Or`, the closures `Rep` and `Opt`, and
`Call`, a reference to a named declaration. Nodes are pure data; all type
checking happens when a node is built, so a constructed tree is always
well typed.
*/
pub mod decl;
pub mod types;

use crate::typechecker::algebra::{self, Closure};
use crate::typechecker::errors::{TypeError, TypeResult};
use decl::RuleId;
use std::fmt;
use types::{Effect, Signature, Type};

/// What a call refers to, which decides how the call is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalleeKind {
    /// Token field, recognized in place
    Token,

    /// Pure semantic function
    Function,

    /// Token combined with a converter
    TokenParser,

    /// Grammar rule, possibly defined later
    Rule(RuleId),

    /// Method of an external collaborator object
    Extern,

    /// Arbitrary call code supplied by the author, e.g. `Math.max`
    Expr,
}

/// A named, separately declared combinator referenced from a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callee {
    pub name: String,
    pub kind: CalleeKind,
    pub sig: Signature,
}

impl Callee {
    pub fn new(name: impl Into<String>, kind: CalleeKind, sig: Signature) -> Self {
        Callee {
            name: name.into(),
            kind,
            sig,
        }
    }

    /// Render a call of this declaration with the given argument variables
    ///
    /// Failable callees also receive the token stream.
    pub fn render_call(&self, args: &[String], stream: &str) -> String {
        if self.kind == CalleeKind::Token {
            return format!("{}.recognizeToken({}, null)", self.name, stream);
        }

        let mut all: Vec<&str> = args.iter().map(String::as_str).collect();
        if self.sig.failable {
            all.push(stream);
        }
        format!("{}({})", self.name, all.join(", "))
    }
}

/// A combinator node
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    /// Identity over the given types; emits nothing
    Pass(Signature),

    /// Sequence; failure of `right` is fatal
    Then {
        left: Box<Unit>,
        right: Box<Unit>,
        sig: Signature,
    },

    /// Ordered choice; `second` runs only if `first` fails
    Or {
        first: Box<Unit>,
        second: Box<Unit>,
        sig: Signature,
    },

    /// Zero or more repetitions of a shape-preserving child
    Rep { child: Box<Unit>, sig: Signature },

    /// Zero or one occurrence of a shape-preserving child
    Opt { child: Box<Unit>, sig: Signature },

    /// Call of a named declaration
    Call(Callee),
}

impl Unit {
    /// Identity combinator, used for epsilon branches
    pub fn pass(types: Vec<Type>) -> Unit {
        Unit::Pass(Signature::new(Effect::identity(types), false))
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Unit::Pass(sig) => sig,
            Unit::Then { sig, .. } => sig,
            Unit::Or { sig, .. } => sig,
            Unit::Rep { sig, .. } => sig,
            Unit::Opt { sig, .. } => sig,
            Unit::Call(callee) => &callee.sig,
        }
    }

    pub fn is_failable(&self) -> bool {
        self.signature().failable
    }

    /// Sequence: `self`, then `next`
    pub fn then(self, next: Unit) -> TypeResult<Unit> {
        let sig = algebra::sequence(&self, &next)?;
        Ok(Unit::Then {
            left: Box::new(self),
            right: Box::new(next),
            sig,
        })
    }

    /// Ordered choice: `self`, else `other`
    pub fn or(self, other: Unit) -> TypeResult<Unit> {
        let sig = algebra::choice(&self, &other)?;
        Ok(Unit::Or {
            first: Box::new(self),
            second: Box::new(other),
            sig,
        })
    }

    /// Zero or more repetitions
    pub fn rep(self) -> TypeResult<Unit> {
        let sig = algebra::closure(Closure::Rep, &self)?;
        Ok(Unit::Rep {
            child: Box::new(self),
            sig,
        })
    }

    /// Zero or one occurrence
    pub fn opt(self) -> TypeResult<Unit> {
        let sig = algebra::closure(Closure::Opt, &self)?;
        Ok(Unit::Opt {
            child: Box::new(self),
            sig,
        })
    }

    /// Left-nested sequence of all units: `((a b) c) ...`
    pub fn seq(units: impl IntoIterator<Item = Unit>) -> TypeResult<Unit> {
        let mut iter = units.into_iter();
        let first = iter.next().ok_or(TypeError::EmptyComposition {
            combinator: "sequence",
        })?;
        iter.try_fold(first, Unit::then)
    }

    /// Left-nested ordered choice of all units: `((a | b) | c) ...`
    pub fn alt(units: impl IntoIterator<Item = Unit>) -> TypeResult<Unit> {
        let mut iter = units.into_iter();
        let first = iter.next().ok_or(TypeError::EmptyComposition {
            combinator: "choice",
        })?;
        iter.try_fold(first, Unit::or)
    }

    fn is_compound(&self) -> bool {
        matches!(self, Unit::Then { .. } | Unit::Or { .. })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Pass(_) => Ok(()),
            Unit::Then { left, right, .. } => {
                let wrap = |unit: &Unit| match unit {
                    Unit::Or { .. } => format!("({})", unit),
                    _ => unit.to_string(),
                };
                let (l, r) = (wrap(left), wrap(right));
                match (l.is_empty(), r.is_empty()) {
                    (true, _) => write!(f, "{}", r),
                    (_, true) => write!(f, "{}", l),
                    _ => write!(f, "{} {}", l, r),
                }
            }
            Unit::Or { first, second, .. } => write!(f, "{} | {}", first, second),
            Unit::Rep { child, .. } if child.is_compound() => write!(f, "({})*", child),
            Unit::Rep { child, .. } => write!(f, "{}*", child),
            Unit::Opt { child, .. } if child.is_compound() => write!(f, "({})?", child),
            Unit::Opt { child, .. } => write!(f, "{}?", child),
            Unit::Call(callee) => write!(f, "{}", callee.name),
        }
    }
}
