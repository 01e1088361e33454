//! restyle CLI - rebuild documents into a styled Word template

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use restyle::convert::{self, Session};
use restyle::render::{self, JsonFormat};
use restyle::{
    BuildReport, DatePolicy, Margins, ReconstructOptions, Reconstructor, SourceRegistry,
    TemplateOptions,
};

#[derive(Parser)]
#[command(name = "restyle")]
#[command(version)]
#[command(about = "Rebuild text, Word and PDF documents into a styled Word template", long_about = None)]
struct Cli {
    /// Input document (.docx, .doc or .pdf)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output document
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    build: BuildArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild raw text (a file, or stdin with "-")
    Text {
        /// Input text file
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output document
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Rebuild a Word or PDF document
    Convert {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output document
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Show how a document would be classified
    Preview {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a blank template
    InitTemplate {
        /// Template path
        #[arg(value_name = "PATH", default_value = convert::DEFAULT_TEMPLATE_NAME)]
        path: PathBuf,

        /// Centered header text
        #[arg(long)]
        header: Option<String>,

        /// Centered footer text
        #[arg(long)]
        footer: Option<String>,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone, Default)]
struct BuildArgs {
    /// Destination template (defaults to ./template.docx or ./templates/template.docx)
    #[arg(long, value_name = "FILE", env = "RESTYLE_TEMPLATE")]
    template: Option<PathBuf>,

    /// When to stamp a date paragraph
    #[arg(long, value_enum)]
    date_policy: Option<DateMode>,

    /// Apply 1.5in top/bottom and 1.0in left/right page margins
    #[arg(long)]
    margins: bool,

    /// Print the document as base64 instead of writing a file
    #[arg(long)]
    base64: bool,

    /// Print the build report as JSON
    #[arg(long)]
    report: bool,

    /// JSON options file
    #[arg(long, value_name = "FILE", env = "RESTYLE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DateMode {
    /// Only when a date is found in the input
    Detected,
    /// Always; today's date when none is found
    Always,
}

impl From<DateMode> for DatePolicy {
    fn from(mode: DateMode) -> Self {
        match mode {
            DateMode::Detected => DatePolicy::Detected,
            DateMode::Always => DatePolicy::AlwaysStamp,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Text {
            input,
            output,
            build,
        }) => cmd_text(input.as_deref(), output.as_deref(), &cli.build.merge(build)),
        Some(Commands::Convert {
            input,
            output,
            build,
        }) => cmd_convert(&input, output.as_deref(), &cli.build.merge(build)),
        Some(Commands::Preview { input, json }) => cmd_preview(&input, json),
        Some(Commands::InitTemplate {
            path,
            header,
            footer,
        }) => cmd_init_template(&path, header, footer),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), &cli.build)
            } else {
                println!("{}", "Usage: restyle <FILE> [OUTPUT]".yellow());
                println!("       restyle --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

impl BuildArgs {
    /// Subcommand flags win over the top-level ones.
    fn merge(&self, other: BuildArgs) -> BuildArgs {
        BuildArgs {
            template: other.template.or_else(|| self.template.clone()),
            date_policy: other.date_policy.or(self.date_policy),
            margins: other.margins || self.margins,
            base64: other.base64 || self.base64,
            report: other.report || self.report,
            config: other.config.or_else(|| self.config.clone()),
        }
    }

    fn options(&self) -> restyle::Result<ReconstructOptions> {
        let mut options = match &self.config {
            Some(path) => {
                log::debug!("Loading options from {}", path.display());
                ReconstructOptions::from_json_file(path)?
            }
            None => ReconstructOptions::default(),
        };
        if let Some(mode) = self.date_policy {
            options = options.with_date_policy(mode.into());
        }
        if self.margins {
            options = options.with_margins(Margins::classic());
        }
        Ok(options)
    }

    fn template(&self) -> restyle::Result<PathBuf> {
        match &self.template {
            Some(path) => Ok(path.clone()),
            None => convert::locate_template(convert::default_template_candidates()),
        }
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn read_text_input(input: Option<&Path>) -> std::io::Result<String> {
    match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// `-o` as given, or the default output name in the working directory.
fn output_path(output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            path.with_file_name(convert::output_file_name(name.as_deref()))
        }
        None => PathBuf::from(convert::DEFAULT_OUTPUT_NAME),
    }
}

fn cmd_text(input: Option<&Path>, output: Option<&Path>, build: &BuildArgs) -> CliResult {
    let text = read_text_input(input)?;
    let options = build.options()?;
    let template = build.template()?;

    let pb = spinner("Rebuilding text...");
    if build.base64 {
        let session = Session::with_options(&template, options)?;
        let name = output.and_then(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned());
        let rendered = session.render_text(&text, name.as_deref());
        pb.finish_and_clear();
        let rendered = rendered?;
        println!("{}", rendered.to_base64());
        return print_report(&rendered.report, build.report);
    }

    let output = output_path(output);
    let report = Reconstructor::new(options).build_from_text(&text, &template, &output);
    pb.finish_and_clear();
    finish(&report?, &output, build.report)
}

fn cmd_convert(input: &Path, output: Option<&Path>, build: &BuildArgs) -> CliResult {
    let options = build.options()?;
    let template = build.template()?;

    let pb = spinner("Rebuilding document...");
    if build.base64 {
        let bytes = fs::read(input).map_err(|_| restyle::Error::SourceNotFound(input.to_path_buf()))?;
        let upload = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let name = output.and_then(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned());
        let session = Session::with_options(&template, options)?;
        let rendered = session.render_upload(&upload, &bytes, name.as_deref());
        pb.finish_and_clear();
        let rendered = rendered?;
        println!("{}", rendered.to_base64());
        return print_report(&rendered.report, build.report);
    }

    let output = match output {
        Some(path) => output_path(Some(path)),
        None => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            PathBuf::from(format!("{}_restyled.docx", stem))
        }
    };
    let report = Reconstructor::new(options).build_from_document(input, &template, &output);
    pb.finish_and_clear();
    finish(&report?, &output, build.report)
}

fn finish(report: &BuildReport, output: &Path, json: bool) -> CliResult {
    if json {
        return print_report(report, true);
    }

    println!("{} {}", "Saved to".green(), output.display());
    if let Some(date) = &report.date {
        println!("  {} date {}", "├─".dimmed(), date);
    }
    println!(
        "  {} {} paragraphs ({} headings, {} subheadings)",
        "├─".dimmed(),
        report.paragraphs,
        report.headings,
        report.subheadings
    );
    println!("  {} {} tables, {} images", "└─".dimmed(), report.tables, report.images);
    for degradation in &report.degradations {
        println!("{} {}", "Warning:".yellow().bold(), degradation.message());
    }
    Ok(())
}

fn print_report(report: &BuildReport, enabled: bool) -> CliResult {
    if enabled {
        println!("{}", render::to_json(report, JsonFormat::Pretty)?);
    }
    Ok(())
}

fn cmd_preview(input: &Path, json: bool) -> CliResult {
    let content = SourceRegistry::with_defaults().read(input)?;
    if json {
        println!("{}", render::to_json(&render::outline(&content), JsonFormat::Pretty)?);
        return Ok(());
    }

    println!("{}", "Outline".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}", render::to_outline(&content));
    if !content.is_structured() {
        println!();
        println!(
            "{} page-oriented source: tables and images will not be recovered",
            "Note:".yellow().bold()
        );
    }
    Ok(())
}

fn cmd_init_template(path: &Path, header: Option<String>, footer: Option<String>) -> CliResult {
    let mut options = TemplateOptions::new();
    if let Some(header) = header {
        options = options.with_header(header);
    }
    if let Some(footer) = footer {
        options = options.with_footer(footer);
    }

    restyle::init_template(path, &options)?;
    println!("{} {}", "Template written to".green(), path.display());
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "restyle".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Template-driven document reconstruction");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(None), PathBuf::from("generated_document.docx"));
        assert_eq!(output_path(Some(Path::new("out/letter"))), PathBuf::from("out/letter.docx"));
        assert_eq!(output_path(Some(Path::new("memo.docx"))), PathBuf::from("memo.docx"));
    }

    #[test]
    fn test_merge_prefers_subcommand() {
        let top = BuildArgs {
            template: Some(PathBuf::from("top.docx")),
            margins: true,
            ..BuildArgs::default()
        };
        let sub = BuildArgs {
            template: Some(PathBuf::from("sub.docx")),
            date_policy: Some(DateMode::Always),
            ..BuildArgs::default()
        };

        let merged = top.merge(sub);
        assert_eq!(merged.template, Some(PathBuf::from("sub.docx")));
        assert!(merged.margins);
        assert!(merged.date_policy == Some(DateMode::Always));
    }

    #[test]
    fn test_options_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("restyle.json");
        fs::write(&config, r#"{"date_policy": "always_stamp"}"#).unwrap();

        let args = BuildArgs {
            config: Some(config),
            margins: true,
            ..BuildArgs::default()
        };
        let options = args.options().unwrap();
        assert_eq!(options.date_policy, DatePolicy::AlwaysStamp);
        assert_eq!(options.margins, Some(Margins::classic()));
    }

    #[test]
    fn test_read_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, "HELLO\nworld").unwrap();
        assert_eq!(read_text_input(Some(&path)).unwrap(), "HELLO\nworld");
    }
}
