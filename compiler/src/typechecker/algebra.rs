/**
Stack-effect algebra

Typing rules for the structural combinators. Each rule takes the operands
and returns the combined signature, or the construction error that makes
the combination meaningless.
*/
use crate::ast::Unit;
use crate::ast::types::{Effect, Signature, Type};
use crate::typechecker::errors::{TypeError, TypeResult};

/// Kind of closure over a shape-preserving child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    /// Zero or more repetitions
    Rep,
    /// Zero or one occurrence
    Opt,
}

impl Closure {
    pub fn describe(self) -> &'static str {
        match self {
            Closure::Rep => "Repetition",
            Closure::Opt => "Option",
        }
    }
}

/// Type a sequence: left, then right
///
/// Failable if either side is.
pub fn sequence(left: &Unit, right: &Unit) -> TypeResult<Signature> {
    let (l, r) = (left.signature(), right.signature());

    let effect = Effect::compose(&l.effect, &r.effect).ok_or_else(|| {
        Box::new(TypeError::OverlapMismatch {
            left: l.effect.clone(),
            right: r.effect.clone(),
            sequence: format!("{} {}", left, right),
        })
    })?;

    Ok(Signature::new(effect, l.failable || r.failable))
}

/// Type an ordered choice: first, else second
///
/// The first alternative must be able to fail, otherwise the second could
/// never run. The result fails only when the second alternative can.
pub fn choice(first: &Unit, second: &Unit) -> TypeResult<Signature> {
    let (a, b) = (first.signature(), second.signature());

    if !a.failable {
        return Err(Box::new(TypeError::InfallibleChoice {
            first: first.to_string(),
        }));
    }

    if a.effect != b.effect {
        return Err(Box::new(TypeError::ChoiceEffectMismatch {
            first: a.effect.clone(),
            second: b.effect.clone(),
            choice: format!("{} | {}", first, second),
        }));
    }

    Ok(Signature::new(a.effect.clone(), b.failable))
}

/// Type a repetition or option
///
/// The child must be failable (its failure ends the loop) and loop-invariant
/// in shape. The closure itself reports failable, although its generated
/// code always restores success.
pub fn closure(kind: Closure, child: &Unit) -> TypeResult<Signature> {
    let sig = child.signature();

    if !sig.failable {
        return Err(Box::new(TypeError::InfallibleClosure {
            closure: kind.describe(),
            child: child.to_string(),
        }));
    }

    if !sig.effect.preserves_shape() {
        return Err(Box::new(TypeError::ShapeChangingClosure {
            closure: kind.describe(),
            child: child.to_string(),
            effect: sig.effect.clone(),
        }));
    }

    Ok(Signature::new(sig.effect.clone(), true))
}

/// Named declarations are methods and return at most one value
pub fn named(name: &str, effect: &Effect) -> TypeResult<()> {
    if effect.outputs.len() > 1 {
        return Err(Box::new(TypeError::TooManyOutputs {
            name: name.to_string(),
            outputs: effect.outputs.clone(),
        }));
    }
    Ok(())
}

/// Parameter names supplied for a declaration must cover its inputs exactly
pub fn parameters(name: &str, inputs: &[Type], params: &[String]) -> TypeResult<()> {
    if inputs.len() != params.len() {
        return Err(Box::new(TypeError::ArityMismatch {
            name: name.to_string(),
            expected: inputs.len(),
            actual: params.len(),
        }));
    }
    Ok(())
}
