use std::env;
use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use tsdefgen::diagnostic::report_generate_error;
use tsdefgen::logging::init_tracing;
use tsdefgen::{GenerateError, Generator, Options, OptionsResolver, Project, RenderMode};

#[derive(Parser, Debug)]
#[command(
    name = "tsdefgen",
    version,
    about = "Generate TypeScript declaration files from C# classes and enums"
)]
struct Cli {
    /// Enable verbose debug logging (or set TSDEFGEN_LOG)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Global settings file (default: ~/tsdefgen.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate declarations for the given source files
    Generate {
        /// C# sources or JSON host documents
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Project root (default: nearest directory with a project file)
        #[arg(short, long)]
        project: Option<PathBuf>,
        /// Which declarations to emit
        #[arg(long, value_enum, default_value = "full")]
        mode: Mode,
        /// Print the declarations instead of writing files
        #[arg(long)]
        stdout: bool,
    },
    /// Regenerate every source whose declaration file already exists
    Refresh {
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
    /// Print the effective options as JSON
    Options {
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Mode {
    Full,
    EnumsOnly,
    WithoutEnums,
}

impl From<Mode> for RenderMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Full => RenderMode::Full,
            Mode::EnumsOnly => RenderMode::EnumsOnly,
            Mode::WithoutEnums => RenderMode::WithoutEnums,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let color = if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };

    let result = match cli.command {
        Command::Generate {
            files,
            project,
            mode,
            stdout,
        } => run_generate(
            &files,
            project.as_deref(),
            mode.into(),
            stdout,
            cli.config.as_deref(),
            color,
        ),
        Command::Refresh { project } => run_refresh(project.as_deref(), cli.config.as_deref(), color),
        Command::Options { project } => run_options(project.as_deref(), cli.config.as_deref()),
    };

    match result {
        Ok(0) => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Returns the number of failed runs.
fn run_generate(
    files: &[PathBuf],
    explicit_project: Option<&Path>,
    mode: RenderMode,
    stdout: bool,
    config: Option<&Path>,
    color: ColorChoice,
) -> anyhow::Result<usize> {
    let global = Options::load_global(config).context("failed to load global settings")?;
    let mut failures = 0;

    // Files of one project share a generator, in the order first named.
    let mut projects: IndexMap<PathBuf, (Project, Vec<PathBuf>)> = IndexMap::new();
    for file in files {
        let file = match fs::canonicalize(file) {
            Ok(file) => file,
            Err(err) => {
                report_generate_error(&GenerateError::io(file, err), color);
                failures += 1;
                continue;
            }
        };
        let project = match explicit_project {
            Some(root) => Project::at(root),
            None => Project::discover(&file),
        };
        projects
            .entry(project.root().to_path_buf())
            .or_insert_with(|| (project, Vec::new()))
            .1
            .push(file);
    }

    for (_, (project, sources)) in projects {
        let generator = match generator_for(project, &global, mode, color) {
            Some(generator) => generator,
            None => {
                failures += sources.len();
                continue;
            }
        };
        for source in &sources {
            let ok = if stdout {
                print_translation(&generator, source, color)
            } else {
                generate_one(&generator, source, color)
            };
            if !ok {
                failures += 1;
            }
        }
    }
    Ok(failures)
}

fn run_refresh(
    explicit_project: Option<&Path>,
    config: Option<&Path>,
    color: ColorChoice,
) -> anyhow::Result<usize> {
    let global = Options::load_global(config).context("failed to load global settings")?;
    let project = match explicit_project {
        Some(root) => Project::at(root),
        None => Project::discover(&env::current_dir().context("failed to read current directory")?),
    };
    let Some(generator) = generator_for(project, &global, RenderMode::Full, color) else {
        return Ok(1);
    };
    let targets = generator.refresh_targets();
    if targets.is_empty() {
        status(color, Color::Cyan, "Skipped", "no generated declarations found");
    }
    Ok(targets
        .iter()
        .filter(|source| !generate_one(&generator, source, color))
        .count())
}

fn run_options(explicit_project: Option<&Path>, config: Option<&Path>) -> anyhow::Result<usize> {
    let global = Options::load_global(config).context("failed to load global settings")?;
    let project = match explicit_project {
        Some(root) => Project::at(root),
        None => Project::discover(&env::current_dir().context("failed to read current directory")?),
    };
    let resolver = OptionsResolver::for_project(global, &project)?;
    let json = serde_json::to_string_pretty(resolver.effective())
        .context("failed to serialize options")?;
    println!("{json}");
    Ok(0)
}

fn generator_for(
    project: Project,
    global: &Options,
    mode: RenderMode,
    color: ColorChoice,
) -> Option<Generator> {
    match OptionsResolver::for_project(global.clone(), &project) {
        Ok(resolver) => {
            let options = resolver.effective().clone();
            Some(Generator::new(project, options).with_mode(mode))
        }
        Err(err) => {
            report_generate_error(&err, color);
            None
        }
    }
}

fn generate_one(generator: &Generator, source: &Path, color: ColorChoice) -> bool {
    match generator.generate(source) {
        Ok(outcome) => {
            if outcome.written {
                status(color, Color::Green, "Generated", outcome.output.display());
            } else {
                status(color, Color::Cyan, "Skipped", source.display());
            }
            for copy in &outcome.copies {
                status(color, Color::Green, "Copied", copy.display());
            }
            for failure in &outcome.copy_failures {
                status(color, Color::Yellow, "Warning", failure);
            }
            true
        }
        Err(err) => {
            report_generate_error(&err, color);
            false
        }
    }
}

fn print_translation(generator: &Generator, source: &Path, color: ColorChoice) -> bool {
    match generator.translate(source) {
        Ok(translation) => {
            print!("{}", translation.text);
            true
        }
        Err(err) => {
            report_generate_error(&err, color);
            false
        }
    }
}

fn status(color: ColorChoice, fg: Color, label: &str, message: impl Display) {
    let mut out = StandardStream::stderr(color);
    let _ = out.set_color(ColorSpec::new().set_fg(Some(fg)).set_bold(true));
    let _ = write!(out, "{label:>12}");
    let _ = out.reset();
    let _ = writeln!(out, " {message}");
}
