/**
Indentation-aware text builder for generated source

The emitter knows nothing about grammars. It tracks the current block depth,
hands out temporary variable names, and inserts blank lines around blocks
for readability (purely cosmetic).
*/
use super::{CodegenError, CodegenResult};
use crate::ast::types::Type;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct Emitter {
    output: String,
    indent_unit: String,
    depth: usize,
    temp_counter: usize,
    block_just_started: bool,
    block_just_ended: bool,
    /// Depths at which open member blocks started
    members: Vec<usize>,
}

impl Emitter {
    /// Create an emitter indenting by four spaces
    pub fn new() -> Self {
        Self::with_indent(4)
    }

    pub fn with_indent(width: usize) -> Self {
        Emitter {
            output: String::new(),
            indent_unit: " ".repeat(width),
            depth: 0,
            temp_counter: 0,
            block_just_started: true,
            block_just_ended: false,
            members: Vec::new(),
        }
    }

    fn write_line(&mut self, text: &str, block_start: bool, block_end: bool) -> CodegenResult<()> {
        let blank = (block_start && !self.block_just_started)
            || (self.block_just_ended && !block_end);
        if blank {
            writeln!(&mut self.output).map_err(|e| CodegenError::InternalError(e.to_string()))?;
        }

        if !text.is_empty() {
            for _ in 0..self.depth {
                self.output.push_str(&self.indent_unit);
            }
        }
        writeln!(&mut self.output, "{}", text)
            .map_err(|e| CodegenError::InternalError(e.to_string()))?;

        self.block_just_started = false;
        self.block_just_ended = false;
        Ok(())
    }

    /// Write text at the current depth, one output line per input line
    pub fn line(&mut self, text: &str) -> CodegenResult<()> {
        for line in text.split('\n') {
            self.write_line(line, false, false)?;
        }
        Ok(())
    }

    /// Write a `/* ... */` comment line
    pub fn comment(&mut self, text: &str) -> CodegenResult<()> {
        self.line(&format!("/* {} */", text))
    }

    /// Open a block: `header {`
    pub fn begin_block(&mut self, header: &str) -> CodegenResult<()> {
        self.write_line(&format!("{} {{", header), true, false)?;
        self.depth += 1;
        self.block_just_started = true;
        Ok(())
    }

    /// Open a class member block; temporaries restart when it is closed
    pub fn begin_member(&mut self, header: &str) -> CodegenResult<()> {
        self.members.push(self.depth);
        self.temp_counter = 0;
        self.begin_block(header)
    }

    /// Close the current block and open the alternate branch: `} else {`
    pub fn else_block(&mut self) -> CodegenResult<()> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or(CodegenError::UnbalancedBlock)?;
        self.write_line("} else {", false, true)?;
        self.depth += 1;
        self.block_just_started = true;
        Ok(())
    }

    /// Close the current block
    pub fn end_block(&mut self) -> CodegenResult<()> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or(CodegenError::UnbalancedBlock)?;

        if self.members.last() == Some(&self.depth) {
            self.members.pop();
            self.temp_counter = 0;
        }

        self.write_line("}", false, true)?;
        self.block_just_ended = true;
        Ok(())
    }

    /// Generate a fresh temporary variable name
    pub fn fresh_temp(&mut self) -> String {
        let name = format!("var{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Declare a variable initialized to its type's empty value
    ///
    /// `None` declares a boolean initialized to `false`; any named type is
    /// a reference initialized to `null`. Returns the variable's name.
    pub fn declare_var(&mut self, ty: Option<&Type>, name: Option<&str>) -> CodegenResult<String> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.fresh_temp(),
        };

        let declaration = match ty {
            Some(ty) => format!("{} {} = null;", ty, name),
            None => format!("boolean {} = false;", name),
        };
        self.line(&declaration)?;
        Ok(name)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Text written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Take the text written so far, leaving the emitter empty
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
