use std::{
    io::{self, IsTerminal, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use ariadne::{ColorGenerator, Config, Label, Report, ReportKind, Source};
use clap::{Parser as ClapParser, ValueEnum};
use log::debug;
use sarah::prelude::*;
use sarah::syntax::Span;
use termcolor::{ColorChoice, StandardStream, WriteColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Elaborate a program and print every statement with its type.
#[derive(ClapParser)]
#[command(name = "sarah", version)]
pub struct Arguments {
    /// Path to the input file (standard input when omitted)
    input: Option<PathBuf>,

    /// Elaborate this source text instead of reading a file
    #[arg(short, long, value_name = "SOURCE", conflicts_with = "input")]
    expr: Option<String>,

    /// Also print the negation-normal form of every boolean statement
    #[arg(long)]
    nnf: bool,

    /// Translate the negation of every boolean statement (implies --nnf)
    #[arg(long)]
    negate: bool,

    /// Line width used by the printer (terminal width by default)
    #[arg(long, value_name = "N")]
    width: Option<usize>,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

impl Arguments {
    fn stdout_colors(&self) -> ColorChoice {
        match self.color {
            ColorMode::Auto if io::stdout().is_terminal() => ColorChoice::Auto,
            ColorMode::Auto | ColorMode::Never => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
        }
    }

    fn stderr_colors(&self) -> bool {
        match self.color {
            ColorMode::Auto => io::stderr().is_terminal(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn read_source(args: &Arguments) -> io::Result<(String, String)> {
    match (&args.expr, &args.input) {
        (Some(source), _) => Ok(("<expr>".to_string(), source.clone())),
        (None, Some(path)) => Ok((path.display().to_string(), std::fs::read_to_string(path)?)),
        (None, None) => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}

fn report(
    file: &str,
    source: &str,
    kind: ReportKind<'_>,
    message: &str,
    span: Span,
    color: bool,
) -> io::Result<()> {
    let mut colors = ColorGenerator::new();
    let a = colors.next();
    let span = (file.to_string(), span.range());

    Report::build(kind, span.clone())
        .with_config(Config::default().with_color(color))
        .with_message(message)
        .with_label(
            Label::new(span)
                .with_message("reported here")
                .with_color(a),
        )
        .finish()
        .eprint((file.to_string(), Source::from(source)))
}

fn print_typed(
    out: &mut StandardStream,
    cx: &Context,
    elab: Elaboration,
    prefix: &str,
    width: usize,
) -> io::Result<()> {
    write!(out, "{prefix}")?;
    render_to(cx, elab.expr, width, out)?;
    write!(out, " : ")?;
    render_to(cx, elab.ty, width, out)?;
    out.reset()?;
    writeln!(out)
}

fn run(args: &Arguments) -> io::Result<ExitCode> {
    let (file, source) = read_source(args)?;
    let width = args.width.unwrap_or_else(terminal_width);
    let color = args.stderr_colors();

    let factory = TreeFactory::new();
    let statements = match parse_program(&source, &factory) {
        Ok(statements) => statements,
        Err(errors) => {
            eprintln!("Failed to parse {file}:");
            for error in errors {
                report(&file, &source, ReportKind::Error, &error.message, error.span, color)?;
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut cx = Context::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let results = Elaborator::new(&mut cx, &mut diagnostics).elaborate_program(&statements);

    let mut out = StandardStream::stdout(args.stdout_colors());
    for elab in results.iter().flatten().copied() {
        print_typed(&mut out, &cx, elab, "", width)?;

        // Declarations are typed `bool` too, but have no negation
        if (args.nnf || args.negate) && elab.is_formula(&cx) {
            let mut translator = Translator::new(&mut cx);
            let nnf = if args.negate {
                translator.translate_negated(elab)
            } else {
                translator.translate(elab)
            };
            print_typed(&mut out, &cx, nnf, "  nnf: ", width)?;
        }
    }
    out.flush()?;

    for diagnostic in &diagnostics {
        let kind = match diagnostic.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Note => ReportKind::Advice,
        };
        match diagnostic.span {
            Some(span) => report(&file, &source, kind, &diagnostic.message, span, color)?,
            None => eprintln!("{diagnostic}"),
        }
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    debug!("{} statements, {failed} failed", results.len());
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Arguments::parse();

    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
