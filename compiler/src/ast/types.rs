/**
Type tags and stack effects for combinators

Values flow between combinators like operands on an implicit stack. Every
combinator declares which values it consumes and which it produces, and
whether its generated code can report failure.
*/
use std::fmt;

/// Opaque name of a semantic value kind in the target language
///
/// Equality is by name only. There is no subtyping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type(String);

/// Type of the text matched by a token, passed as the last argument to converters
pub const MATCHED_TEXT: &str = "CharSequence";

impl Type {
    pub fn new(name: impl Into<String>) -> Self {
        Type(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Build a list of type tags from their names
    pub fn list(names: &[&str]) -> Vec<Type> {
        names.iter().map(|name| Type::new(*name)).collect()
    }
}

impl From<&str> for Type {
    fn from(name: &str) -> Self {
        Type::new(name)
    }
}

/// Stack effect signature: (inputs -- outputs)
///
/// Both sides are ordered bottom to top, so the last input is the value the
/// predecessor produced most recently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Effect {
    /// Values consumed, supplied by the calling context
    pub inputs: Vec<Type>,

    /// Values produced for the successor
    pub outputs: Vec<Type>,
}

impl Effect {
    pub fn new(inputs: Vec<Type>, outputs: Vec<Type>) -> Self {
        Effect { inputs, outputs }
    }

    /// Create an effect from type names
    pub fn from_names(inputs: &[&str], outputs: &[&str]) -> Self {
        Effect::new(Type::list(inputs), Type::list(outputs))
    }

    /// Effect that hands its inputs through unchanged
    pub fn identity(types: Vec<Type>) -> Self {
        Effect {
            inputs: types.clone(),
            outputs: types,
        }
    }

    /// True when outputs have the same shape as inputs
    pub fn preserves_shape(&self) -> bool {
        self.inputs == self.outputs
    }

    /// Number of values threaded directly from `first` into `second`
    pub fn overlap(first: &Effect, second: &Effect) -> usize {
        first.outputs.len().min(second.inputs.len())
    }

    /// Compose two effects: first, then second
    ///
    /// The last `k` inputs of `second` must name the last `k` outputs of
    /// `first`, where `k` is the overlap. Inputs of `second` below the
    /// overlap are appended to the composed inputs and outputs of `first`
    /// below the overlap stay underneath the outputs of `second`.
    /// Returns None if the overlapping slices differ.
    pub fn compose(first: &Effect, second: &Effect) -> Option<Effect> {
        let k = Effect::overlap(first, second);
        let kept = first.outputs.len() - k;
        let extra = second.inputs.len() - k;

        if first.outputs[kept..] != second.inputs[extra..] {
            return None;
        }

        let mut inputs = first.inputs.clone();
        inputs.extend_from_slice(&second.inputs[..extra]);

        let mut outputs = first.outputs[..kept].to_vec();
        outputs.extend_from_slice(&second.outputs);

        Some(Effect { inputs, outputs })
    }
}

/// The complete type of a combinator: its effect plus failability
///
/// A non-failable combinator's generated code never checks or propagates
/// the success flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub effect: Effect,
    pub failable: bool,
}

impl Signature {
    pub fn new(effect: Effect, failable: bool) -> Self {
        Signature { effect, failable }
    }

    pub fn inputs(&self) -> &[Type] {
        &self.effect.inputs
    }

    pub fn outputs(&self) -> &[Type] {
        &self.effect.outputs
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn write_types(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for ty in types {
        write!(f, " {}", ty)?;
    }
    Ok(())
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_types(f, &self.inputs)?;
        write!(f, " --")?;
        write_types(f, &self.outputs)?;
        write!(f, " )")
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failable {
            write!(f, "{}?", self.effect)
        } else {
            write!(f, "{}", self.effect)
        }
    }
}
