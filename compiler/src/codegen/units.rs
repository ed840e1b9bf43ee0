/**
Compilation of combinator trees into statements

Every combinator is compiled inline into the body of the declaration that
owns it. Values are threaded through variables; the only control state is
the success flag `status`.

Failure model:
- An atomic failable call (token recognition, failable method) clears
  `status` and has no other effect.
- A choice runs its second alternative only when the first leaves `status`
  cleared.
- Once the left side of a sequence has succeeded, the parse is committed:
  failure of the right side calls `parsingError`, which never returns.
- Closures always restore success afterwards.
*/
use super::emitter::Emitter;
use super::{CodegenError, CodegenResult, STATUS_VAR, escape_string};
use crate::ast::types::Effect;
use crate::ast::{Callee, Unit};

/// Compile `unit`, declaring fresh variables for its outputs
///
/// `inputs` holds exactly one variable per input of the unit. Returns the
/// variables holding the outputs.
pub fn emit_call(
    unit: &Unit,
    out: &mut Emitter,
    inputs: &[String],
    stream: &str,
) -> CodegenResult<Vec<String>> {
    check_arity(unit, inputs)?;

    // Identity: the inputs are the outputs
    if let Unit::Pass(_) = unit {
        return Ok(inputs.to_vec());
    }

    let mut outputs = Vec::with_capacity(unit.signature().outputs().len());
    for ty in unit.signature().outputs() {
        outputs.push(out.declare_var(Some(ty), None)?);
    }

    emit_into(unit, out, inputs, &outputs, stream)?;
    Ok(outputs)
}

/// Compile `unit`, writing its results into the existing `outputs` variables
pub fn emit_into(
    unit: &Unit,
    out: &mut Emitter,
    inputs: &[String],
    outputs: &[String],
    stream: &str,
) -> CodegenResult<()> {
    check_arity(unit, inputs)?;
    log::trace!("emitting {:?} at depth {}", unit.to_string(), out.depth());

    match unit {
        Unit::Pass(_) => assign(out, outputs, inputs),
        Unit::Call(callee) => emit_named(callee, out, inputs, outputs, stream),
        Unit::Then { left, right, .. } => emit_then(unit, left, right, out, inputs, outputs, stream),
        Unit::Or { first, second, .. } => emit_or(unit, first, second, out, inputs, outputs, stream),
        Unit::Rep { child, .. } => emit_rep(unit, child, out, inputs, outputs, stream),
        Unit::Opt { child, .. } => emit_opt(unit, child, out, inputs, outputs, stream),
    }
}

fn check_arity(unit: &Unit, inputs: &[String]) -> CodegenResult<()> {
    let required = unit.signature().inputs().len();
    if inputs.len() != required {
        return Err(CodegenError::InputCountMismatch {
            unit: unit.to_string(),
            required,
            supplied: inputs.len(),
        });
    }
    Ok(())
}

/// `target = source;` for every pair that differs
fn assign(out: &mut Emitter, targets: &[String], sources: &[String]) -> CodegenResult<()> {
    for (target, source) in targets.iter().zip(sources) {
        if target != source {
            out.line(&format!("{} = {};", target, source))?;
        }
    }
    Ok(())
}

fn emit_named(
    callee: &Callee,
    out: &mut Emitter,
    inputs: &[String],
    outputs: &[String],
    stream: &str,
) -> CodegenResult<()> {
    let call = callee.render_call(inputs, stream);

    match outputs.first() {
        None if callee.sig.failable => out.line(&format!("{} = {};", STATUS_VAR, call)),
        None => out.line(&format!("{};", call)),
        Some(result) => {
            out.line(&format!("{} = {};", result, call))?;
            if callee.sig.failable {
                out.line(&format!("{} = {} != null;", STATUS_VAR, result))?;
            }
            Ok(())
        }
    }
}

fn emit_then(
    unit: &Unit,
    left: &Unit,
    right: &Unit,
    out: &mut Emitter,
    inputs: &[String],
    outputs: &[String],
    stream: &str,
) -> CodegenResult<()> {
    out.comment(&unit.to_string())?;

    // Inputs are the left side's inputs followed by the right side's deeper inputs
    let (left_inputs, deeper) = inputs.split_at(left.signature().inputs().len());
    let left_outputs = emit_call(left, out, left_inputs, stream)?;

    let k = Effect::overlap(&left.signature().effect, &right.signature().effect);
    let (kept, threaded) = left_outputs.split_at(left_outputs.len() - k);

    if left.is_failable() {
        out.begin_block(&format!("if({})", STATUS_VAR))?;
    }

    let right_inputs: Vec<String> = deeper.iter().chain(threaded).cloned().collect();
    let right_outputs = emit_call(right, out, &right_inputs, stream)?;

    // Left already succeeded: a failure here is malformed input
    if right.is_failable() {
        out.begin_block(&format!("if(!{})", STATUS_VAR))?;
        out.line(&format!(
            "parsingError({}, \"{}\");",
            stream,
            escape_string(&right.to_string())
        ))?;
    }

    if !outputs.is_empty() {
        if right.is_failable() {
            out.else_block()?;
        }
        let results: Vec<String> = kept.iter().chain(&right_outputs).cloned().collect();
        assign(out, outputs, &results)?;
    }

    if right.is_failable() {
        out.end_block()?;
    }

    if left.is_failable() {
        out.end_block()?;
    }

    out.comment(&format!("end {}", unit))
}

fn emit_or(
    unit: &Unit,
    first: &Unit,
    second: &Unit,
    out: &mut Emitter,
    inputs: &[String],
    outputs: &[String],
    stream: &str,
) -> CodegenResult<()> {
    out.comment(&unit.to_string())?;
    emit_into(first, out, inputs, outputs, stream)?;

    out.begin_block(&format!("if(!{})", STATUS_VAR))?;
    emit_into(second, out, inputs, outputs, stream)?;

    if !second.is_failable() {
        out.line(&format!("{} = true;", STATUS_VAR))?;
    }

    out.end_block()?;
    out.comment(&format!("end {}", unit))
}

fn emit_rep(
    unit: &Unit,
    child: &Unit,
    out: &mut Emitter,
    inputs: &[String],
    outputs: &[String],
    stream: &str,
) -> CodegenResult<()> {
    out.comment(&unit.to_string())?;
    assign(out, outputs, inputs)?;

    // Outputs double as the loop-carried values
    out.begin_block("for(;;)")?;
    let iteration = emit_call(child, out, outputs, stream)?;

    out.begin_block(&format!("if(!{})", STATUS_VAR))?;
    out.line(&format!("{} = true;", STATUS_VAR))?;
    out.line("break;")?;

    if !iteration.is_empty() {
        out.else_block()?;
        assign(out, outputs, &iteration)?;
    }

    out.end_block()?;
    out.end_block()?;
    out.comment(&format!("end {}", unit))
}

fn emit_opt(
    unit: &Unit,
    child: &Unit,
    out: &mut Emitter,
    inputs: &[String],
    outputs: &[String],
    stream: &str,
) -> CodegenResult<()> {
    out.comment(&unit.to_string())?;
    assign(out, outputs, inputs)?;

    let attempt = emit_call(child, out, inputs, stream)?;

    if !outputs.is_empty() {
        out.begin_block(&format!("if({})", STATUS_VAR))?;
        assign(out, outputs, &attempt)?;
        out.end_block()?;
    }

    out.line(&format!("{} = true;", STATUS_VAR))?;
    out.comment(&format!("end {}", unit))
}
