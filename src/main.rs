use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as CliParser, ValueEnum};

use xmlang::ast::dump_ast;
use xmlang::codegen::{self, Compilation};
use xmlang::config::Config;
use xmlang::diagnostics::Reporter;
use xmlang::lexer::{dump_tokens, tokenize_source};
use xmlang::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DumpStage {
    Tokens,
    Ast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Arch {
    Lmx,
}

#[derive(CliParser)]
#[command(name = "xmlang", about = "xmlang compiler", version)]
struct Cli {
    /// file to be compiled
    #[arg(short, long)]
    file: PathBuf,

    /// output file stem
    #[arg(short, long, default_value = "out")]
    output: String,

    /// dumps the given xmlang source after that stage
    #[arg(short, long, value_enum)]
    dump: Option<DumpStage>,

    /// compilation target architecture
    #[arg(long, value_enum)]
    arch: Option<Arch>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            println!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = Config::load_or_default();

    if !cli.file.exists() {
        return Err(format!("source {} does not exist.", cli.file.display()));
    }

    let source = fs::read_to_string(&cli.file)
        .map_err(|error| format!("failed to read {}: {}", cli.file.display(), error))?;

    let tokens = tokenize_source(&source, &cli.file, &config.dialect);

    if cli.dump == Some(DumpStage::Tokens) {
        let dump = serde_json::to_string_pretty(&dump_tokens(&tokens))
            .map_err(|error| error.to_string())?;
        println!("{}", dump);
        return Ok(());
    }

    let mut reporter = Reporter::new(&source);
    let ast = Parser::parse(&tokens, &mut reporter).map_err(|error| error.to_string())?;

    if cli.dump == Some(DumpStage::Ast) {
        let dump =
            serde_json::to_string_pretty(&dump_ast(&ast)).map_err(|error| error.to_string())?;
        println!("{}", dump);
        return Ok(());
    }

    let mut compilation = Compilation::new();

    let image = match cli.arch.unwrap_or(Arch::Lmx) {
        Arch::Lmx => codegen::compile(&ast, &mut compilation, &mut reporter)
            .map_err(|error| error.to_string())?,
    };

    // The binary is only written on a clean compile.
    let output = format!("{}.{}", cli.output, config.output.extension);
    fs::write(&output, image).map_err(|error| format!("failed to write {}: {}", output, error))?;

    Ok(())
}
