/**
Output configuration

Controls the source header and layout of generated code. Read from TOML;
every key is optional:

```toml
package = "at.searles.demo"
imports = ["at.searles.parsing.lexer.Lexer", "at.searles.parsing.lexer.TokStream"]
class_name = "Calculator"
indent_width = 2
```
*/
use crate::codegen::{CodegenError, CodegenResult};
use serde::Deserialize;
use std::path::Path;

/// Imports needed by every generated class
pub const DEFAULT_IMPORTS: &[&str] = &[
    "at.searles.parsing.lexer.Lexer",
    "at.searles.parsing.lexer.TokStream",
    "at.searles.parsing.lexer.Token",
    "at.searles.parsing.regex.CharSet",
];

pub const DEFAULT_CLASS_NAME: &str = "Grammar";

pub const DEFAULT_INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Package line, omitted when absent
    pub package: Option<String>,

    /// Imported names, written verbatim as `import <name>;`
    pub imports: Vec<String>,

    /// Name of the generated class
    pub class_name: String,

    /// Spaces per indentation level
    pub indent_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            package: None,
            imports: DEFAULT_IMPORTS.iter().map(|s| s.to_string()).collect(),
            class_name: DEFAULT_CLASS_NAME.to_string(),
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

impl OutputConfig {
    pub fn from_toml_str(text: &str) -> CodegenResult<Self> {
        let config: OutputConfig = toml::from_str(text).map_err(|e| CodegenError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a TOML file
    pub fn load(path: &Path) -> CodegenResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CodegenError::Config {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        log::debug!("loaded output configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> CodegenResult<()> {
        let valid_class = self
            .class_name
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && self
                .class_name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '$');

        if !valid_class {
            return Err(CodegenError::Config {
                message: format!("'{}' is not a valid class name", self.class_name),
            });
        }
        Ok(())
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> CodegenResult<Self> {
        self.class_name = class_name.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }
}
