//! spanview - Inspect the byte-level structure of PDF files
//!
//! This tool scans PDF files into byte-accurate structure trees and prints
//! them as annotated outlines, summaries or lists of malformed input.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use spanview_core::diagnostics;
use spanview_core::outline::{render_to_string, walk};
use spanview_core::{
    DescriptionProvider, Document, ItemKind, NoDescriptions, ParserConfig, RenderConfig,
    ScanStrategy, Scanner, ScannerConfig, Section, StandardDescriptions, StatsVisitor, ToOutline,
};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Inspect the byte-level structure of PDF files
#[derive(Parser, Debug)]
#[command(name = "spanview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Directory to write reports into (default: print to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Report format
    #[arg(long, value_enum, default_value = "tree")]
    format: OutputFormat,

    /// Maximum number of sections to parse per file (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_sections: usize,

    /// Maximum container nesting depth
    #[arg(long, default_value = "256")]
    max_nesting: usize,

    /// Deepest outline level to print (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_depth: usize,

    /// Omit whitespace and skipped-byte items from the tree
    #[arg(long)]
    hide_fillers: bool,

    /// Omit item descriptions from the tree
    #[arg(long)]
    no_descriptions: bool,

    /// Overwrite existing report files
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single PDF file to inspect
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of PDF files to inspect
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Indented outline of every item with its byte span
    Tree,
    /// Item counts and document facts
    Summary,
    /// Malformed input found in the file
    Diagnostics,
}

impl OutputFormat {
    /// Suffix for report file names
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Tree => "outline.txt",
            OutputFormat::Summary => "summary.txt",
            OutputFormat::Diagnostics => "diagnostics.txt",
        }
    }
}

/// Tracks processed inputs for deduplication and report naming
#[derive(Default)]
struct ReportRegistry {
    /// Maps content hash -> first input with that content
    seen: HashMap<String, PathBuf>,
    /// Report file names already handed out
    names: HashSet<String>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    conflicts_renamed: usize,
    written: usize,
    with_problems: usize,
}

impl ReportRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &[u8]) -> String {
        let hash = blake3::hash(content);
        hash.to_hex()[..8].to_string()
    }

    /// Record an input; returns `false` if identical content was already seen
    fn register(&mut self, path: &Path, content_hash: &str) -> bool {
        self.stats.total_found += 1;

        if let Some(first) = self.seen.get(content_hash) {
            debug!(
                "Skipping duplicate: {} (same content as {})",
                path.display(),
                first.display()
            );
            self.stats.duplicates_skipped += 1;
            return false;
        }

        self.seen.insert(content_hash.to_string(), path.to_path_buf());
        true
    }

    /// Resolve the report path for an input, renaming on stem collisions
    fn report_path(
        &mut self,
        source: &Path,
        content_hash: &str,
        output_dir: &Path,
        format: OutputFormat,
    ) -> PathBuf {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");

        let mut name = format!("{}.{}", stem, format.extension());
        if self.names.contains(&name) {
            let renamed = format!("{}~{}.{}", stem, content_hash, format.extension());
            info!("Conflict resolved: {} -> {} (content differs)", name, renamed);
            self.stats.conflicts_renamed += 1;
            name = renamed;
        }
        self.names.insert(name.clone());
        output_dir.join(name)
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} conflicts renamed, {} written, {} with problems",
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.conflicts_renamed,
            self.stats.written,
            self.stats.with_problems
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Process a single PDF file
fn process_single_file(cli: &Cli, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let mut registry = ReportRegistry::new();
    process_pdf(cli, file, &mut registry)?;
    registry.print_summary();

    Ok(())
}

/// Process a directory of PDF files recursively
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut registry = ReportRegistry::new();
    let mut files_processed = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !is_pdf(path) {
            trace!("Skipping non-PDF: {}", path.display());
            continue;
        }

        debug!("Processing: {}", path.display());
        if let Err(e) = process_pdf(cli, path, &mut registry) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
        }
        files_processed += 1;
    }

    info!("Processed {} files", files_processed);
    registry.print_summary();

    Ok(())
}

/// Returns `true` for paths with a `.pdf` extension, in any case
fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Scan one PDF and emit its report
fn process_pdf(cli: &Cli, path: &Path, registry: &mut ReportRegistry) -> Result<()> {
    trace!("Reading {}", path.display());
    let data =
        fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let content_hash = ReportRegistry::content_hash(&data);
    if !registry.register(path, &content_hash) {
        return Ok(());
    }

    let config = ScannerConfig::new()
        .max_sections(cli.max_sections)
        .parser(ParserConfig::new().max_depth(cli.max_nesting));
    let document = Scanner::with_config(config)
        .scan(&data)
        .with_context(|| format!("Failed to scan: {}", path.display()))?;

    debug!(
        "Found {} section(s) in {}",
        document.sections.len(),
        path.display()
    );

    let problems = diagnostics::collect(&document, &data);
    if !problems.is_empty() {
        registry.stats.with_problems += 1;
        warn!("{}: {} problem(s) found", path.display(), problems.len());
    }

    let report = match cli.format {
        OutputFormat::Tree => render_tree(cli, &document),
        OutputFormat::Summary => render_summary(path, &document, problems.len())?,
        OutputFormat::Diagnostics => render_diagnostics(path, &problems)?,
    };

    match &cli.output {
        None => {
            print!("{}", report);
        }
        Some(output_dir) => {
            let report_path = registry.report_path(path, &content_hash, output_dir, cli.format);
            match write_report(&report_path, &report, cli.force) {
                Ok(()) => {
                    println!("Wrote {}", report_path.display());
                    registry.stats.written += 1;
                }
                Err(e) => {
                    error!("Failed to write {}: {:#}", report_path.display(), e);
                }
            }
        }
    }

    Ok(())
}

fn render_tree(cli: &Cli, document: &Document) -> String {
    let provider: &dyn DescriptionProvider = if cli.no_descriptions {
        &NoDescriptions
    } else {
        &StandardDescriptions
    };
    let config = RenderConfig::new()
        .show_fillers(!cli.hide_fillers)
        .show_descriptions(!cli.no_descriptions)
        .max_depth(cli.max_depth);
    render_to_string(&document.to_outline(provider), &config)
}

fn render_summary(path: &Path, document: &Document, problems: usize) -> Result<String> {
    let mut stats = StatsVisitor::default();
    walk(&document.to_outline(&NoDescriptions), &mut stats)
        .context("Failed to summarize outline")?;

    let mut out = String::new();
    writeln!(out, "file: {}", path.display())?;
    writeln!(out, "size: {} bytes", document.len)?;
    writeln!(out, "version: {}", document.version().unwrap_or("unknown"))?;
    writeln!(out, "sections: {}", document.sections.len())?;
    let has_eof = document
        .sections
        .iter()
        .any(|s| matches!(s, Section::Comment(c) if c.is_eof_marker()));
    writeln!(out, "eof marker: {}", if has_eof { "yes" } else { "no" })?;
    writeln!(out, "objects: {}", stats.count(ItemKind::IndirectObject))?;
    writeln!(
        out,
        "streams: {} ({} bytes)",
        stats.count(ItemKind::Payload),
        stats.payload_bytes
    )?;
    writeln!(out, "unparsed sections: {}", stats.count(ItemKind::Unparsed))?;
    writeln!(out, "items: {}", stats.total())?;
    writeln!(out, "max depth: {}", stats.max_depth)?;
    writeln!(out, "problems: {}", problems)?;
    Ok(out)
}

fn render_diagnostics(path: &Path, problems: &[diagnostics::Diagnostic]) -> Result<String> {
    let mut out = String::new();
    if problems.is_empty() {
        writeln!(out, "{}: no problems found", path.display())?;
    }
    for problem in problems {
        writeln!(out, "{}: {}", path.display(), problem)?;
    }
    Ok(out)
}

/// Write a report file, refusing to clobber without `--force`
fn write_report(output_path: &Path, content: &str, force: bool) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &[u8] = b"%PDF-1.5\n1 0 obj\n<</Length 3>>\nstream\nabc\nendstream\nendobj\n%%EOF\n";

    fn scan(data: &[u8]) -> Document {
        Scanner::new().scan(data).unwrap()
    }

    #[test]
    fn test_registry_deduplication() {
        let mut registry = ReportRegistry::new();
        let hash = ReportRegistry::content_hash(SAMPLE);

        assert!(registry.register(Path::new("a/one.pdf"), &hash));
        assert!(!registry.register(Path::new("b/copy.pdf"), &hash));

        assert_eq!(registry.stats.total_found, 2);
        assert_eq!(registry.stats.duplicates_skipped, 1);
    }

    #[test]
    fn test_report_path_conflict_gets_hash_suffix() {
        let mut registry = ReportRegistry::new();
        let temp_dir = TempDir::new().unwrap();

        let first = registry.report_path(
            Path::new("a/doc.pdf"),
            "11111111",
            temp_dir.path(),
            OutputFormat::Tree,
        );
        assert!(first.ends_with("doc.outline.txt"));

        let second = registry.report_path(
            Path::new("b/doc.pdf"),
            "22222222",
            temp_dir.path(),
            OutputFormat::Tree,
        );
        assert!(second.ends_with("doc~22222222.outline.txt"));
        assert_eq!(registry.stats.conflicts_renamed, 1);
    }

    #[test]
    fn test_content_hash() {
        let hash1 = ReportRegistry::content_hash(b"hello");
        let hash2 = ReportRegistry::content_hash(b"hello");
        let hash3 = ReportRegistry::content_hash(b"world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 8);
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("/tmp/report.pdf")));
        assert!(is_pdf(Path::new("/tmp/REPORT.PDF")));
        assert!(!is_pdf(Path::new("/tmp/report.txt")));
        assert!(!is_pdf(Path::new("/tmp/pdf")));
    }

    #[test]
    fn test_render_summary() {
        let document = scan(SAMPLE);
        let summary = render_summary(Path::new("sample.pdf"), &document, 0).unwrap();

        assert!(summary.contains("version: 1.5\n"));
        assert!(summary.contains("objects: 1\n"));
        assert!(summary.contains("eof marker: yes\n"));
        assert!(summary.contains("streams: 1 (4 bytes)\n"));
        assert!(summary.contains("problems: 0\n"));
    }

    #[test]
    fn test_render_diagnostics() {
        let data = b"1 0 obj\n[1 2\n";
        let document = scan(data);
        let problems = diagnostics::collect(&document, data);
        let text = render_diagnostics(Path::new("broken.pdf"), &problems).unwrap();

        assert!(text.contains("has no endobj"));
        assert!(text.contains("array is never closed"));

        let clean = render_diagnostics(Path::new("ok.pdf"), &[]).unwrap();
        assert_eq!(clean, "ok.pdf: no problems found\n");
    }

    #[test]
    fn test_write_report_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("doc.outline.txt");

        write_report(&path, "first", false).unwrap();
        assert!(write_report(&path, "second", false).is_err());
        write_report(&path, "third", true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "third");
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
