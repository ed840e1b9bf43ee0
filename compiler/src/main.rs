use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use comboc::ast::decl::Declaration;
use comboc::grammars::{self, Builtin};
use comboc::{CodeGen, Grammar, OutputConfig};
use std::fs;
use std::path::PathBuf;

/// Combo - compiles grammar combinators into parser source code
#[derive(ClapParser)]
#[command(name = "combo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log declarations as they are materialized
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the parser class for a built-in grammar
    Emit {
        /// Grammar to emit (arithmetic, quoted)
        #[arg(value_name = "GRAMMAR")]
        grammar: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// TOML file with package, imports, class_name and indent_width
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Package of the generated class
        #[arg(long)]
        package: Option<String>,

        /// Name of the generated class
        #[arg(long = "class", value_name = "NAME")]
        class_name: Option<String>,

        /// Spaces per indentation level
        #[arg(long, value_name = "WIDTH")]
        indent: Option<usize>,
    },

    /// Build a grammar and print its declarations with their stack effects
    Check {
        /// Grammar to check (arithmetic, quoted)
        #[arg(value_name = "GRAMMAR")]
        grammar: String,
    },

    /// Generate shell completions for bash, zsh, fish, or powershell
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match cli.command {
        Commands::Emit {
            grammar,
            output,
            config,
            package,
            class_name,
            indent,
        } => {
            let builtin = find_builtin(&grammar)?;
            let mut config = match config {
                Some(path) => OutputConfig::load(&path)?,
                None => OutputConfig::default().with_class_name(builtin.class_name)?,
            };
            if let Some(package) = package {
                config = config.with_package(package);
            }
            if let Some(class_name) = class_name {
                config = config.with_class_name(class_name)?;
            }
            if let Some(indent) = indent {
                config = config.with_indent_width(indent);
            }
            emit_command(builtin, config, output)
        }
        Commands::Check { grammar } => check_command(find_builtin(&grammar)?),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn find_builtin(name: &str) -> Result<&'static Builtin, Box<dyn std::error::Error>> {
    grammars::lookup(name).ok_or_else(|| {
        let known: Vec<&str> = grammars::BUILTINS.iter().map(|b| b.name).collect();
        format!("Unknown grammar '{}' (expected one of: {})", name, known.join(", ")).into()
    })
}

fn build(builtin: &Builtin) -> Result<Grammar, Box<dyn std::error::Error>> {
    (builtin.build)().map_err(|e| format!("Grammar error in '{}': {}", builtin.name, e).into())
}

fn emit_command(
    builtin: &Builtin,
    config: OutputConfig,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let grammar = build(builtin)?;

    let mut codegen = CodeGen::with_config(config);
    let source = codegen.compile_grammar(&grammar)?;

    match output {
        Some(path) => {
            fs::write(&path, &source)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            eprintln!("Wrote {} to {}", codegen.config().class_name, path.display());
        }
        None => print!("{}", source),
    }

    Ok(())
}

fn check_command(builtin: &Builtin) -> Result<(), Box<dyn std::error::Error>> {
    let grammar = build(builtin)?;
    grammar.check_complete()?;

    for declaration in grammar.declarations() {
        match declaration {
            Declaration::Rule(id) => {
                let rule = grammar.rule_decl(*id)?;
                let body = rule
                    .definition
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!("rule {} {} = {}", rule.name, rule.sig, body);
            }
            other => println!("{}", other),
        }
    }

    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
