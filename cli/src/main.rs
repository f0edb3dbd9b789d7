mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compiler::{CompileOptions, Compiler, FontId, Theme};

const SUBCOMMANDS: &[&str] = &["render", "test", "fonts", "help"];

#[derive(Parser)]
#[command(name = "mdview", version, about = "Markdown to render-command compiler")]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a markdown file and print its command outline
    Render(RenderArgs),

    /// Run .test.md fixture files
    Test(TestArgs),

    /// Print the font faces a renderer must load, in font id order
    Fonts,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown file to compile
    file: String,

    /// TOML theme overriding sizes and colors
    #[arg(long)]
    theme: Option<PathBuf>,

    /// Text arena size in bytes
    #[arg(long)]
    arena_bytes: Option<usize>,

    /// Number ordered lists from their written start instead of 1
    #[arg(long)]
    honor_list_start: bool,

    /// Insert a space after each wide (CJK) character before parsing
    #[arg(long)]
    cjk_spacing: bool,

    /// Print the parser's node events instead of render commands
    #[arg(long)]
    events: bool,

    /// Compile only; exit 1 if anything was reported
    #[arg(long)]
    check: bool,

    /// Do not print the outline
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

#[derive(Debug, Error)]
enum ThemeError {
    #[error("cannot read theme '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid theme '{path}': {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn load_theme(path: &Path) -> Result<Theme, ThemeError> {
    let text = std::fs::read_to_string(path).map_err(|source| ThemeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ThemeError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// `mdview file.md` is shorthand for `mdview render file.md`.
fn with_default_subcommand(mut args: Vec<String>) -> Vec<String> {
    let first_positional = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, a)| !a.starts_with('-'))
        .map(|(i, a)| (i, SUBCOMMANDS.contains(&a.as_str())));
    if let Some((pos, false)) = first_positional {
        args.insert(pos, "render".to_string());
    }
    args
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "error".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_from(with_default_subcommand(std::env::args().collect()));

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
        Command::Fonts => print!("{}", font_table()),
    }
}

fn font_table() -> String {
    let mut out = String::new();
    for id in FontId::ALL {
        let face = id.face_request();
        out.push_str(&format!(
            "{} {} {}px weight {}{} [{}]\n",
            id.index(),
            id,
            face.size_px,
            face.weight,
            if face.italic { " italic" } else { "" },
            face.family
        ));
    }
    out
}

fn do_render(args: RenderArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };
    tracing::info!(file = %args.file, bytes = source.len(), "compiling");
    let source = if args.cjk_spacing {
        mdview::preprocess::inject_cjk_spaces(&source)
    } else {
        source
    };

    let theme = match &args.theme {
        Some(path) => match load_theme(path) {
            Ok(theme) => theme,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => Theme::default(),
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let emit = |diagnostic: &Diagnostic<usize>| {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, diagnostic);
    };

    let parser = mdview::parser::Parser::new(source, file_id);
    let document = match parser.parse() {
        Ok(document) => document,
        Err(errors) => {
            for error in &errors {
                emit(&error.to_diagnostic());
            }
            process::exit(1);
        }
    };

    if args.events {
        for event in document.iter() {
            println!("{}", event);
        }
        return;
    }

    let defaults = CompileOptions::default();
    let options = CompileOptions {
        arena_capacity: args.arena_bytes.unwrap_or(defaults.arena_capacity),
        honor_list_start: args.honor_list_start,
    };
    let mut compiler = Compiler::new(theme, options);
    let compiled = compiler.compile(document);

    for warning in compiled.warnings() {
        emit(&warning.to_diagnostic(file_id));
    }

    if args.check {
        if !compiled.warnings().is_empty() {
            process::exit(1);
        }
        eprintln!("ok: {} compiled to {} commands", args.file, compiled.len());
        return;
    }

    if !args.quiet {
        print!("{}", compiled);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_file_defaults_to_render() {
        assert_eq!(
            with_default_subcommand(args(&["mdview", "--no-color", "notes.md"])),
            args(&["mdview", "--no-color", "render", "notes.md"])
        );
        assert_eq!(
            with_default_subcommand(args(&["mdview", "test", "cases"])),
            args(&["mdview", "test", "cases"])
        );
        assert_eq!(with_default_subcommand(args(&["mdview"])), args(&["mdview"]));
    }

    #[test]
    fn font_table_lists_every_face() {
        let table = font_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), FontId::ALL.len());
        assert!(lines[0].starts_with("0 normal 18px weight 300 ["));
        assert!(lines[7].starts_with("7 large-bold-italic 48px weight 500 italic ["));
        assert!(lines[8].starts_with("8 mono 18px"));
    }

    #[test]
    fn theme_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "h2_size = 30.0\ninline_code = [9, 9, 9, 255]").unwrap();
        let theme = load_theme(file.path()).unwrap();
        assert_eq!(theme.h2_size, 30.0);
        assert_eq!(theme.inline_code, compiler::Color::rgba(9, 9, 9, 255));
        assert_eq!(theme.h1_size, Theme::default().h1_size);
    }

    #[test]
    fn bad_theme_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "h2_size = \"big\"").unwrap();
        assert!(matches!(load_theme(file.path()), Err(ThemeError::Toml { .. })));
        assert!(matches!(
            load_theme(Path::new("/nonexistent/theme.toml")),
            Err(ThemeError::Io { .. })
        ));
    }

    #[test]
    fn fixture_suite_passes() {
        let cases = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/cases");
        assert_eq!(test_runner::run_tests(&cases, true, &[]), 0);
    }
}
