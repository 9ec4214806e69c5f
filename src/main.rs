//! textmark: mark search terms, regex matches or character ranges in an
//! HTML file and print the marked document.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use regex::Regex;

use textmark::dom::html;
use textmark::dom::subtree::FsSubtreeLoader;
use textmark::matcher::parse_ranges;
use textmark::{
    logging, MarkError, MarkHandler, MarkOptions, MarkSession, MarkSummary, RangeRejection,
    RangeSpec,
};

#[derive(Parser)]
#[command(name = "textmark", about = "Mark text inside HTML documents")]
struct Args {
    /// HTML file to mark.
    file: PathBuf,

    /// Term to mark; repeatable.
    #[arg(short, long = "term")]
    terms: Vec<String>,

    /// Regular expression to mark.
    #[arg(long)]
    regex: Option<String>,

    /// JSON array of `{"start": n, "length": n}` character ranges.
    #[arg(long)]
    ranges: Option<String>,

    /// JSON options file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Match across element boundaries.
    #[arg(long)]
    across: bool,

    /// Remove existing markers first.
    #[arg(long)]
    unmark: bool,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write logs to a daily rolling file in this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

/// Logs everything the session reports.
#[derive(Default)]
struct Reporter {
    totals: MarkSummary,
}

impl MarkHandler for Reporter {
    fn no_match(&mut self, term: &str) {
        tracing::info!(term, "no match");
    }

    fn range_rejected(&mut self, range: &RangeSpec, reason: RangeRejection) {
        tracing::warn!(start = ?range.start, length = ?range.length, reason = %reason, "range rejected");
    }

    fn subtree_unavailable(&mut self, error: &MarkError) {
        tracing::warn!(error = %error, "sub-tree skipped");
    }

    fn done(&mut self, summary: &MarkSummary) {
        self.totals.marked += summary.marked;
        self.totals.matches += summary.matches;
        for (term, count) in &summary.terms {
            *self.totals.terms.entry(term.clone()).or_default() += count;
        }
        self.totals.aborted |= summary.aborted;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = logging::init(args.log_dir.as_deref());

    match run(args).await {
        Ok(summary) => {
            eprintln!(
                "textmark: {} marker(s), {} match(es)",
                summary.marked, summary.matches
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "textmark failed");
            eprintln!("textmark: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> textmark::Result<MarkSummary> {
    let source = tokio::fs::read_to_string(&args.file).await?;
    let mut options = match &args.config {
        Some(path) => MarkOptions::from_json(&tokio::fs::read_to_string(path).await?)?,
        None => MarkOptions::default(),
    };
    if args.across {
        options.across_elements = true;
    }

    let ranges = match &args.ranges {
        Some(json) => Some(parse_ranges(&serde_json::from_str(json)?)?),
        None => None,
    };
    let regex = args.regex.as_deref().map(Regex::new).transpose()?;

    let mut doc = html::parse(&source)?;
    let base = args
        .file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let mut reporter = Reporter::default();

    {
        let mut session = MarkSession::with_loader(&mut doc, options, FsSubtreeLoader::new(base))?;
        if args.unmark {
            session.unmark();
        }
        if !args.terms.is_empty() {
            session.mark(&args.terms, &mut reporter).await?;
        }
        if let Some(regex) = &regex {
            session.mark_regex(regex, &mut reporter).await?;
        }
        if let Some(ranges) = &ranges {
            session.mark_ranges(ranges, None, &mut reporter).await?;
        }
    }

    let output = html::serialize(&doc);
    match &args.output {
        Some(path) => tokio::fs::write(path, output).await?,
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(output.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(reporter.totals)
}
