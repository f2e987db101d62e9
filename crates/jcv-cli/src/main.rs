//! Command-line interface for `jcv`.
//!
//! Plays the role of the original tool's toolbar: loads the two documents
//! (file, STDIN, or URL), runs the optional sort/filter normalization,
//! prints a change summary or a full report, and handles shared-state
//! encoding and snapshot persistence.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use jcv_core::format::{to_value, Format};
use jcv_core::normalize::to_pretty_string;
use jcv_core::report::{html_report, markdown_report, text_summary, ReportInputs};
use jcv_core::{Session, SharedState, Side, SnapshotStore};
use tracing_subscriber::EnvFilter;

const AUTOSAVE_DELAY: Duration = Duration::from_millis(500);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FETCH_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Plain-text change summary (the clipboard form).
    #[default]
    Text,
    /// Self-contained Markdown report.
    Markdown,
    /// Self-contained HTML report.
    Html,
}

#[derive(Debug, Parser)]
#[command(
    name = "jcv",
    version,
    about = "Compare two JSON-like documents and summarize their differences",
    override_usage = "jcv [OPTIONS] [LEFT] [RIGHT]"
)]
struct Cli {
    /// Inputs: a file path, `-` for STDIN, or an http(s) URL.
    #[arg(value_name = "LEFT", index = 1)]
    left: Option<String>,

    /// Second input; same forms as LEFT.
    #[arg(value_name = "RIGHT", index = 2)]
    right: Option<String>,

    /// Input format of LEFT (default: by file extension, else json).
    #[arg(long = "format-left", value_name = "FORMAT")]
    format_left: Option<Format>,

    /// Input format of RIGHT (default: by file extension, else json).
    #[arg(long = "format-right", value_name = "FORMAT")]
    format_right: Option<Format>,

    /// Display label for LEFT (default: file name or URL).
    #[arg(long = "label-left")]
    label_left: Option<String>,

    /// Display label for RIGHT (default: file name or URL).
    #[arg(long = "label-right")]
    label_right: Option<String>,

    /// Sort keys and reformat both sides before comparing.
    #[arg(long = "sort", action = ArgAction::SetTrue)]
    sort: bool,

    /// Comma-separated key names to remove from both sides at every depth.
    #[arg(long = "remove-keys", value_name = "KEYS")]
    remove_keys: Option<String>,

    /// Exchange the two sides before comparing.
    #[arg(long = "swap", action = ArgAction::SetTrue)]
    swap: bool,

    /// Output form of the comparison.
    #[arg(long = "report", value_enum, default_value = "text")]
    report: ReportFormat,

    /// Write the report to FILE instead of STDOUT.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the encoded shareable state for the loaded pair and exit.
    #[arg(long = "share", action = ArgAction::SetTrue)]
    share: bool,

    /// Boot the session from an encoded shareable state value.
    #[arg(long = "state", value_name = "VALUE")]
    state: Option<String>,

    /// Boot the session from the persisted snapshot.
    #[arg(long = "resume", action = ArgAction::SetTrue)]
    resume: bool,

    /// Persist the session as the snapshot after the run.
    #[arg(long = "save", action = ArgAction::SetTrue)]
    save: bool,

    /// Remove the persisted snapshot and exit.
    #[arg(long = "clear", action = ArgAction::SetTrue)]
    clear: bool,
}

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "jcv: {err:#}");
            std::process::exit(2);
        }
    }
}

fn try_main() -> Result<i32> {
    init_tracing();
    let cli = Cli::parse();

    if cli.clear {
        let store = SnapshotStore::open().context("failed to open snapshot store")?;
        store.clear().context("failed to clear snapshot")?;
        return Ok(0);
    }

    let mut session = Session::new(AUTOSAVE_DELAY);
    bootstrap(&mut session, &cli)?;

    let mut stdin_used = false;
    if let Some(input) = &cli.left {
        load_input(
            &mut session,
            Side::Left,
            input,
            cli.format_left,
            cli.label_left.as_deref(),
            &mut stdin_used,
        )?;
    }
    if let Some(input) = &cli.right {
        load_input(
            &mut session,
            Side::Right,
            input,
            cli.format_right,
            cli.label_right.as_deref(),
            &mut stdin_used,
        )?;
    }

    if cli.swap {
        session.swap();
    }

    if let Some(raw) = &cli.remove_keys {
        let keys = parse_remove_keys(raw)?;
        for side in [Side::Left, Side::Right] {
            if let Err(err) = session.filter_side(side, &keys) {
                tracing::warn!(side = ?side, error = %err, "key filter skipped; side kept intact");
            }
        }
    }

    if cli.sort {
        for side in [Side::Left, Side::Right] {
            if let Err(err) = session.format_side(side) {
                tracing::warn!(side = ?side, error = %err, "sort skipped; side kept intact");
            }
        }
    }

    if cli.share {
        let state = SharedState {
            original: session.text(Side::Left).to_string(),
            modified: session.text(Side::Right).to_string(),
        };
        println!("{}", state.encode());
        persist_if_requested(&cli, &mut session)?;
        return Ok(0);
    }

    let mut summary = session
        .summary()
        .context("both sides must be valid JSON to compare (use --sort to check each side)")?;
    summary.sort_by_path();

    let rendered = match cli.report {
        ReportFormat::Text => text_summary(&summary),
        ReportFormat::Markdown => markdown_report(&report_inputs(&session), &summary),
        ReportFormat::Html => html_report(&report_inputs(&session), &summary),
    };

    if let Some(path) = &cli.output {
        fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    } else {
        print!("{rendered}");
        io::stdout().flush().ok();
    }

    persist_if_requested(&cli, &mut session)?;

    Ok(i32::from(!summary.is_empty()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Seeds the session before explicit inputs are applied: an encoded state
/// value wins, then the persisted snapshot, then nothing. An undecodable
/// state value is logged and falls through to the next source.
fn bootstrap(session: &mut Session, cli: &Cli) -> Result<()> {
    let mut try_snapshot = cli.resume;

    if let Some(encoded) = &cli.state {
        match SharedState::decode(encoded) {
            Ok(state) => {
                session.load(Side::Left, "shared", &state.original);
                session.load(Side::Right, "shared", &state.modified);
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring undecodable shared state");
                try_snapshot = true;
            }
        }
    }

    if try_snapshot {
        let store = SnapshotStore::open().context("failed to open snapshot store")?;
        match store.load().context("failed to read snapshot")? {
            Some(snapshot) => {
                session.load(Side::Left, &snapshot.left_label, &snapshot.original);
                session.load(Side::Right, &snapshot.right_label, &snapshot.modified);
            }
            None => tracing::debug!("no snapshot to resume from"),
        }
    }

    Ok(())
}

fn persist_if_requested(cli: &Cli, session: &mut Session) -> Result<()> {
    if !cli.save {
        return Ok(());
    }
    let store = SnapshotStore::open().context("failed to open snapshot store")?;
    if let Some(snapshot) = session.flush_autosave() {
        store.save(&snapshot).context("failed to save snapshot")?;
        tracing::debug!(path = %store.path().display(), "snapshot saved");
    }
    Ok(())
}

fn report_inputs(session: &Session) -> ReportInputs<'_> {
    ReportInputs {
        left_label: session.label(Side::Left),
        right_label: session.label(Side::Right),
        original: session.text(Side::Left),
        modified: session.text(Side::Right),
    }
}

fn parse_remove_keys(raw: &str) -> Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    for segment in raw.split(',') {
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            bail!("--remove-keys contains an empty key: {raw}");
        }
        keys.insert(trimmed.to_string());
    }
    Ok(keys)
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reads one input source, converts it to JSON if a non-JSON format is
/// declared or detected, and replaces that side of the session. A read or
/// parse failure aborts before the buffer is touched.
fn load_input(
    session: &mut Session,
    side: Side,
    input: &str,
    declared: Option<Format>,
    label_override: Option<&str>,
    stdin_used: &mut bool,
) -> Result<()> {
    let (bytes, default_label, detected) = read_source(input, stdin_used)?;
    let format = declared.or(detected).unwrap_or(Format::Json);
    let label = label_override.unwrap_or(&default_label);

    let text = if format == Format::Json {
        // Native JSON is loaded verbatim; validity is checked at compare
        // time so a half-edited document can still be loaded and shared.
        String::from_utf8(bytes).with_context(|| format!("{label} is not valid UTF-8"))?
    } else {
        let value = to_value(&bytes, format)
            .with_context(|| format!("failed to convert {label} from {format}"))?;
        to_pretty_string(&value)
    };

    session.load(side, label, &text);
    Ok(())
}

fn read_source(input: &str, stdin_used: &mut bool) -> Result<(Vec<u8>, String, Option<Format>)> {
    if input == "-" {
        if *stdin_used {
            bail!("STDIN can supply at most one side");
        }
        *stdin_used = true;
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).context("failed to read STDIN")?;
        return Ok((buffer, "stdin".to_string(), None));
    }

    if is_url(input) {
        let body = fetch_text(input)?;
        let detected = Format::from_path(Path::new(input));
        return Ok((body.into_bytes(), input.to_string(), detected));
    }

    let path = Path::new(input);
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let label = path
        .file_name()
        .map_or_else(|| input.to_string(), |name| name.to_string_lossy().into_owned());
    Ok((bytes, label, Format::from_path(path)))
}

fn fetch_text(url: &str) -> Result<String> {
    let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
    let response =
        agent.get(url).call().with_context(|| format!("failed to fetch {url}"))?;
    read_body(response.into_reader(), url)
}

/// Reads a response body up to `MAX_FETCH_BYTES`; anything larger is an
/// error rather than a silently truncated document.
fn read_body(reader: impl Read, url: &str) -> Result<String> {
    let mut body = Vec::new();
    reader
        .take(MAX_FETCH_BYTES + 1)
        .read_to_end(&mut body)
        .with_context(|| format!("failed to read response from {url}"))?;
    if body.len() as u64 > MAX_FETCH_BYTES {
        bail!("response from {url} is larger than {MAX_FETCH_BYTES} bytes");
    }
    String::from_utf8(body)
        .with_context(|| format!("response from {url} is not readable text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_keys_splits_and_trims() {
        let keys = parse_remove_keys("a, b ,c").unwrap();
        let expected: BTreeSet<String> =
            ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn remove_keys_rejects_empty_segments() {
        assert!(parse_remove_keys("a,,b").is_err());
        assert!(parse_remove_keys("").is_err());
    }

    #[test]
    fn url_inputs_are_recognized() {
        assert!(is_url("https://example.com/a.json"));
        assert!(is_url("http://localhost:8080/doc"));
        assert!(!is_url("data/a.json"));
        assert!(!is_url("-"));
    }

    #[test]
    fn report_format_default_is_text() {
        assert_eq!(ReportFormat::default(), ReportFormat::Text);
    }

    #[test]
    fn small_response_bodies_pass_through() {
        let body = read_body(&b"{\"a\": 1}"[..], "http://example/a.json").unwrap();
        assert_eq!(body, "{\"a\": 1}");
    }

    #[test]
    fn oversized_response_bodies_are_an_error_not_a_truncation() {
        let err = read_body(io::repeat(b'a'), "http://example/big.json").unwrap_err();
        assert!(err.to_string().contains("larger than"));
    }
}
