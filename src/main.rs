//! canopy - list directory contents as a filtered, sorted tree.
//!
//! Usage:
//!   canopy [PATH]                 Tree of PATH (defaults to .)
//!   canopy -P '*.rs' --prune      Only Rust files, no empty directories
//!   canopy --du -s --sort size    Directories sized by content, largest first
//!   canopy --json [PATH]          Export the tree as JSON
//!   canopy --help                 Show help
//!
//! Exit status is 0 on success, 1 on a fatal error and 2 when some
//! directories could not be opened.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use canopy_core::{Entry, MetaSort, Renderer, SortKey, TreeConfig};
use canopy_scan::{FileTree, GlobIgnore, TreeBuilder};

/// Name of the environment variable holding the log filter.
const LOG_ENV: &str = "CANOPY_LOG";

#[derive(Parser)]
#[command(
    name = "canopy",
    version,
    about = "List directory contents as a tree",
    long_about = "canopy walks a directory hierarchy and prints it as a tree.\n\n\
                  Patterns use a small glob dialect: `*`, `?`, `[...]`, `**` for any \
                  number of path segments, `|` for alternatives and a trailing `/` \
                  to match directories only."
)]
struct Cli {
    /// Directory to list
    #[arg(default_value = ".")]
    path: PathBuf,

    /// List all files, including those starting with a dot
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// List directories only
    #[arg(short = 'd', long = "dirs-only")]
    dirs_only: bool,

    /// Follow symbolic links to directories
    #[arg(short = 'l', long = "follow")]
    follow: bool,

    /// Stay on the file system of the root
    #[arg(short = 'x', long = "one-file-system")]
    one_file_system: bool,

    /// Descend at most this many levels
    #[arg(short = 'L', long = "level", value_name = "LEVEL")]
    level: Option<usize>,

    /// List only files matching a pattern (repeatable)
    #[arg(short = 'P', long = "pattern", value_name = "PATTERN")]
    patterns: Vec<String>,

    /// Do not list entries matching a pattern (repeatable)
    #[arg(short = 'I', long = "ignore", value_name = "PATTERN")]
    ignores: Vec<String>,

    /// Ignore ASCII case when matching patterns
    #[arg(long)]
    ignore_case: bool,

    /// Apply -P patterns to directory names too
    #[arg(long)]
    matchdirs: bool,

    /// Remove empty directories from the output
    #[arg(long)]
    prune: bool,

    /// Report directory sizes as the sum of their contents
    #[arg(long)]
    du: bool,

    /// Do not descend into directories with more than this many entries
    #[arg(long, value_name = "N")]
    filelimit: Option<usize>,

    /// Sort by: name, version, size, mtime, ctime, none
    #[arg(long, value_name = "KEY")]
    sort: Option<SortKey>,

    /// Reverse the sort order
    #[arg(short = 'r', long)]
    reverse: bool,

    /// Sort by modification time
    #[arg(short = 't')]
    by_mtime: bool,

    /// Sort by status change time
    #[arg(short = 'c')]
    by_ctime: bool,

    /// Sort by version
    #[arg(short = 'v')]
    by_version: bool,

    /// Leave entries unsorted
    #[arg(short = 'U')]
    unsorted: bool,

    /// List directories before files
    #[arg(long, conflicts_with = "filesfirst")]
    dirsfirst: bool,

    /// List files before directories
    #[arg(long)]
    filesfirst: bool,

    /// Print the size of each entry
    #[arg(short = 's', long = "size")]
    size: bool,

    /// Omit the directory and file count at the end
    #[arg(long)]
    noreport: bool,

    /// Print the tree as JSON
    #[arg(short = 'J', long)]
    json: bool,

    /// Drop paths matching a glob before they are listed (repeatable)
    #[arg(long = "ignore-path", value_name = "GLOB")]
    ignore_paths: Vec<String>,
}

impl Cli {
    fn sort_key(&self) -> SortKey {
        if let Some(key) = self.sort {
            key
        } else if self.unsorted {
            SortKey::Unordered
        } else if self.by_version {
            SortKey::Version
        } else if self.by_mtime {
            SortKey::Modified
        } else if self.by_ctime {
            SortKey::Changed
        } else {
            SortKey::Name
        }
    }

    fn meta_sort(&self) -> Option<MetaSort> {
        if self.unsorted {
            None
        } else if self.dirsfirst {
            Some(MetaSort::DirsFirst)
        } else if self.filesfirst {
            Some(MetaSort::FilesFirst)
        } else {
            None
        }
    }

    fn config(&self) -> Result<TreeConfig> {
        let config = TreeConfig::builder()
            .show_hidden(self.all)
            .dirs_only(self.dirs_only)
            .follow_links(self.follow)
            .one_filesystem(self.one_file_system)
            .max_depth(self.level)
            .file_limit(self.filelimit)
            .include_patterns(self.patterns.clone())
            .exclude_patterns(self.ignores.clone())
            .ignore_case(self.ignore_case)
            .match_dirs(self.matchdirs)
            .prune(self.prune)
            .aggregate_sizes(self.du)
            .sort(self.sort_key())
            .reverse(self.reverse)
            .meta_sort(self.meta_sort())
            .build()
            .context("Invalid options")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();
    let tree = run(&cli)?;

    if tree.error_count() > 0 {
        std::process::exit(2);
    }
    Ok(())
}

/// Install the stderr log subscriber, filtered by `CANOPY_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Build the tree and print it.
fn run(cli: &Cli) -> Result<FileTree> {
    let mut builder = TreeBuilder::new(cli.config()?).context("Invalid options")?;
    if !cli.ignore_paths.is_empty() {
        builder = builder.with_ignore(GlobIgnore::new(&cli.ignore_paths)?);
    }

    let tree = builder
        .build(&cli.path)
        .with_context(|| format!("Cannot list {}", cli.path.display()))?;

    let mut out = BufWriter::new(io::stdout().lock());
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &tree)?;
        writeln!(out)?;
    } else {
        let mut renderer = PlainRenderer::new(&mut out, cli.size);
        tree.render(&mut renderer)?;
        if !cli.noreport {
            write_report(&mut out, &tree, cli.dirs_only)?;
        }
    }
    out.flush()?;

    Ok(tree)
}

/// Print the "N directories, M files" line.
fn write_report(out: &mut impl Write, tree: &FileTree, dirs_only: bool) -> io::Result<()> {
    let dirs = tree.stats.directories;
    let dir_word = if dirs == 1 { "directory" } else { "directories" };
    if dirs_only {
        writeln!(out, "\n{dirs} {dir_word}")
    } else {
        let files = tree.stats.files;
        let file_word = if files == 1 { "file" } else { "files" };
        writeln!(out, "\n{dirs} {dir_word}, {files} {file_word}")
    }
}

/// Draws the tree with box-drawing connectors.
struct PlainRenderer<W: Write> {
    out: W,
    sizes: bool,
}

impl<W: Write> PlainRenderer<W> {
    fn new(out: W, sizes: bool) -> Self {
        Self { out, sizes }
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn visit(&mut self, entry: &Entry, depth: usize, last: &[bool]) -> io::Result<()> {
        let mut indent = String::new();
        let mut line = String::new();
        if let Some((&is_last, ancestors)) = last.split_last() {
            for &done in ancestors {
                indent.push_str(if done { "    " } else { "│   " });
            }
            line.push_str(&indent);
            line.push_str(if is_last { "└── " } else { "├── " });
            indent.push_str(if is_last { "    " } else { "│   " });
        }

        if self.sizes && depth > 0 {
            line.push_str(&format!("[{:>10}]  ", format_size(entry.size)));
        }
        line.push_str(&entry.name);
        if let Some(target) = &entry.link_target {
            line.push_str(" -> ");
            line.push_str(target);
            if entry.orphan {
                line.push_str(" (broken)");
            }
        }
        if let Some(error) = &entry.error {
            line.push_str(&format!("  [{error}]"));
        }
        writeln!(self.out, "{line}")?;

        for comment in entry.comment.iter().flatten() {
            writeln!(self.out, "{indent}# {comment}")?;
        }
        Ok(())
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
