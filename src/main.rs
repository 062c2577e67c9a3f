//! press – compose HTML templates and render them to PDF.
//!
//! Set `RUST_LOG=debug` to see what the composer and the engines are doing.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use html_press::chrome::{ChromeConfig, ChromeEngine};
use html_press::compose::{
    concat_fragments, encode, inject_fragment, load_fragment, substitute_placeholders_with,
    validate, PlaceholderMap, Substitution,
};
use html_press::gateway::{RenderEngine, RenderGateway};
use html_press::options::{Length, Margins, PaperFormat, RenderOptions};
use html_press::pipeline::NativeEngine;
use html_press::templates;

type CliResult = Result<(), Box<dyn Error>>;

/// press - HTML template composition and PDF rendering
#[derive(Parser)]
#[command(name = "press")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Build a page from fragments and fill in placeholders
    press compose header.html body.html footer.html --data values.json -o page.html

    # Render with the built-in engine on US Letter, 1 inch margins
    press render page.html -o page.pdf --format letter --margin 1in

    # Render through headless Chrome with page numbers in the footer
    press render page.html --engine chrome --header-footer --no-sandbox")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a document has <html>, <body> and </body>
    Validate {
        /// HTML file to check
        input: PathBuf,
    },

    /// Concatenate fragments, inject sections and substitute placeholders
    Compose {
        /// Fragment files, in order. Missing files are treated as empty
        #[arg(required = true)]
        fragments: Vec<PathBuf>,

        /// Replace TOKEN with the contents of PATH (repeatable)
        #[arg(long = "inject", value_name = "TOKEN=PATH", value_parser = parse_injection)]
        injections: Vec<(String, PathBuf)>,

        #[command(flatten)]
        data: DataArgs,

        /// HTML-encode placeholder values before substitution
        #[arg(long)]
        encode_values: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render an HTML document to PDF
    Render {
        /// HTML document to render
        input: PathBuf,

        /// Output PDF path (default: input with a .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rendering engine
        #[arg(long, value_enum, default_value_t = EngineKind::Native)]
        engine: EngineKind,

        /// JSON file with render options; flags below override it
        #[arg(long, value_name = "FILE")]
        options: Option<PathBuf>,

        /// Paper format (letter, legal, tabloid, ledger, a0 to a6)
        #[arg(long)]
        format: Option<PaperFormat>,

        /// Landscape orientation
        #[arg(long)]
        landscape: bool,

        /// Margin on every edge, e.g. "1in", "20mm", "36pt"
        #[arg(long, value_name = "LEN")]
        margin: Option<Length>,

        /// Do not paint background colours
        #[arg(long)]
        no_background: bool,

        /// Draw the header and footer bands
        #[arg(long)]
        header_footer: bool,

        /// Rendering scale, 0.1 to 2.0
        #[arg(long)]
        scale: Option<f64>,

        /// Pages to keep, e.g. "1-3, 5"
        #[arg(long, value_name = "RANGES")]
        pages: Option<String>,

        /// Document title when the HTML has no <title>
        #[arg(long)]
        title: Option<String>,

        /// Chrome or Chromium executable (chrome engine)
        #[arg(long, value_name = "PATH")]
        chrome: Option<PathBuf>,

        /// Launch Chrome without its sandbox (chrome engine)
        #[arg(long)]
        no_sandbox: bool,

        #[command(flatten)]
        data: DataArgs,

        /// Also write the computed page layout as JSON (native engine)
        #[arg(long, value_name = "FILE")]
        dump_layout: Option<PathBuf>,
    },

    /// Write the bundled sample invoice
    Sample {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Placeholder values shared by `compose` and `render`.
#[derive(clap::Args)]
struct DataArgs {
    /// JSON object mapping tokens to values
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Set one placeholder, e.g. --set "{{name}}=Acme" (repeatable)
    #[arg(long = "set", value_name = "TOKEN=VALUE", value_parser = parse_assignment)]
    values: Vec<(String, String)>,

    /// Re-scan substituted text so values may contain further tokens
    #[arg(long)]
    cascade: bool,
}

impl DataArgs {
    fn is_empty(&self) -> bool {
        self.data.is_none() && self.values.is_empty()
    }

    fn load(&self) -> Result<PlaceholderMap, Box<dyn Error>> {
        let mut map = match &self.data {
            Some(path) => PlaceholderMap::from_file(path)?,
            None => PlaceholderMap::new(),
        };
        map.extend(self.values.iter().cloned());
        Ok(map)
    }

    fn strategy(&self) -> Substitution {
        if self.cascade {
            Substitution::Cascading
        } else {
            Substitution::SinglePass
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    Native,
    Chrome,
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected TOKEN=VALUE, got {arg:?}"))
}

fn parse_injection(arg: &str) -> Result<(String, PathBuf), String> {
    let (token, path) = parse_assignment(arg)?;
    Ok((token, PathBuf::from(path)))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Validate { input } => run_validate(&input),
        Commands::Compose {
            fragments,
            injections,
            data,
            encode_values,
            output,
        } => run_compose(&fragments, &injections, &data, encode_values, output.as_deref()),
        Commands::Render {
            input,
            output,
            engine,
            options,
            format,
            landscape,
            margin,
            no_background,
            header_footer,
            scale,
            pages,
            title,
            chrome,
            no_sandbox,
            data,
            dump_layout,
        } => {
            let mut opts = match options {
                Some(path) => match RenderOptions::from_file(&path) {
                    Ok(o) => o,
                    Err(e) => {
                        eprintln!("Error: {}: {e}", path.display());
                        process::exit(1);
                    }
                },
                None => RenderOptions::default(),
            };
            if let Some(format) = format {
                opts.format = format;
            }
            if landscape {
                opts.landscape = true;
            }
            if let Some(margin) = margin {
                opts.margin = Margins::uniform(margin);
            }
            if no_background {
                opts.print_background = false;
            }
            if header_footer {
                opts.display_header_footer = true;
            }
            if let Some(scale) = scale {
                opts.scale = scale;
            }
            if pages.is_some() {
                opts.page_ranges = pages;
            }
            if title.is_some() {
                opts.title = title;
            }

            let engine: Box<dyn RenderEngine> = match engine {
                EngineKind::Native => Box::new(NativeEngine::new()),
                EngineKind::Chrome => Box::new(ChromeEngine::new(ChromeConfig {
                    executable: chrome,
                    sandbox: !no_sandbox,
                    ..ChromeConfig::default()
                })),
            };
            if dump_layout.is_some() && engine.name() != "native" {
                log::warn!("--dump-layout only applies to the native engine");
            }

            run_render(RenderArgs {
                input: &input,
                output: output.as_deref(),
                engine,
                options: &opts,
                data: &data,
                dump_layout: dump_layout.as_deref(),
            })
        }
        Commands::Sample { output } => write_text(output.as_deref(), &templates::sample_document()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_validate(input: &Path) -> CliResult {
    let html = fs::read_to_string(input)?;
    validate(&html)?;
    println!("ok");
    Ok(())
}

fn run_compose(
    fragments: &[PathBuf],
    injections: &[(String, PathBuf)],
    data: &DataArgs,
    encode_values: bool,
    output: Option<&Path>,
) -> CliResult {
    let texts = fragments
        .iter()
        .map(|path| read_fragment(path))
        .collect::<Result<Vec<_>, _>>()?;
    let mut html = concat_fragments(&texts);

    for (token, path) in injections {
        let section = read_fragment(path)?;
        html = inject_fragment(&html, token, section.as_str());
    }

    let mut map = data.load()?;
    if encode_values {
        map = map.iter().map(|(token, value)| (token, encode(value))).collect();
    }
    if !map.is_empty() {
        html = substitute_placeholders_with(&html, &map, data.strategy());
    }

    write_text(output, &html)
}

struct RenderArgs<'a> {
    input: &'a Path,
    output: Option<&'a Path>,
    engine: Box<dyn RenderEngine>,
    options: &'a RenderOptions,
    data: &'a DataArgs,
    dump_layout: Option<&'a Path>,
}

fn run_render(args: RenderArgs<'_>) -> CliResult {
    let mut html = fs::read_to_string(args.input)
        .map_err(|e| format!("reading '{}': {e}", args.input.display()))?;
    if !args.data.is_empty() {
        let map = args.data.load()?;
        html = substitute_placeholders_with(&html, &map, args.data.strategy());
    }

    let output = args.output.map(Path::to_path_buf).unwrap_or_else(|| {
        let mut o = args.input.to_path_buf();
        o.set_extension("pdf");
        o
    });

    let dump_native = args.engine.name() == "native";
    let gateway = RenderGateway::new(args.engine);
    let written = gateway.render_to_file(&html, Some(args.options), &output)?;

    if let (Some(path), true) = (args.dump_layout, dump_native) {
        let layout = NativeEngine::new().layout_document(&html, args.options)?;
        fs::write(path, layout.to_json())?;
        eprintln!(
            "Wrote layout '{}' ({} page{})",
            path.display(),
            layout.pages.len(),
            if layout.pages.len() == 1 { "" } else { "s" }
        );
    }

    eprintln!("Wrote '{}' ({written} bytes)", output.display());
    Ok(())
}

fn read_fragment(path: &Path) -> Result<String, Box<dyn Error>> {
    if !path.is_file() {
        log::warn!("Fragment '{}' not found, using empty text", path.display());
    }
    load_fragment(path).map_err(|e| format!("reading '{}': {e}", path.display()).into())
}

fn write_text(output: Option<&Path>, text: &str) -> CliResult {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, text)?;
            eprintln!("Wrote '{}' ({} bytes)", path.display(), text.len());
        }
        None => print!("{text}"),
    }
    Ok(())
}
