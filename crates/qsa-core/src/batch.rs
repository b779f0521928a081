//! Batch conversion of QS scripts
//!
//! Each file is an independent translation unit: it owns its AST and token
//! stream, and only reads the shared configuration. Files run in parallel on
//! a rayon pool. A file whose destination already exists is skipped, so
//! earlier outputs act as a cache; deleting an output forces regeneration.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::ast::{build_source, to_xml};
use crate::config::TranspileConfig;
use crate::emit::{emit_source, write_tokens};
use crate::error::{ConvertError, Result, UNNAMED_SOURCE};
use crate::parser::Parser;
use crate::polish::polish;
use crate::source::{ArtifactSink, FsSink};

/// Extension of the optional AST dump written next to each output
const AST_DUMP_EXTENSION: &str = "xml";

/// What happened to one file of a batch
#[derive(Debug)]
pub enum FileOutcome {
    Converted,
    /// The destination already existed
    Skipped,
    Failed { error: ConvertError },
}

/// Result of [`parse_script_list`]
#[derive(Debug)]
pub struct BatchReport {
    /// No file failed
    pub success: bool,
    /// Outcome per input path, in input order
    pub files: Vec<(PathBuf, FileOutcome)>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Converted))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Skipped))
    }

    /// Failed files with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ConvertError)> {
        self.files.iter().filter_map(|(path, outcome)| match outcome {
            FileOutcome::Failed { error } => Some((path.as_path(), error)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|(_, outcome)| pred(outcome)).count()
    }
}

struct Converted {
    python: String,
    ast_xml: Option<String>,
}

/// Convert one QS script to Python source
///
/// # Errors
///
/// Returns [`ConvertError::Syntax`] when the script does not parse.
pub fn transpile_source(text: &str, config: &TranspileConfig) -> Result<String> {
    convert(text, config, false).map(|converted| converted.python)
}

fn convert(text: &str, config: &TranspileConfig, dump_ast: bool) -> Result<Converted> {
    let tree = Parser::parse_source(text).map_err(|errors| ConvertError::syntax(text, &errors))?;
    let ast = build_source(&tree);
    let ast_xml = dump_ast.then(|| to_xml(&ast).to_xml_string());
    let ast = polish(ast, &config.known_symbols);
    let tokens = emit_source(&ast, config);
    let python = write_tokens(&tokens, config.blank_line_threshold).map_err(|source| {
        ConvertError::Writer {
            file: PathBuf::from(UNNAMED_SOURCE),
            source,
        }
    })?;
    Ok(Converted { python, ast_xml })
}

/// Destination of a converted script
pub fn output_path(path: &Path, config: &TranspileConfig) -> PathBuf {
    path.with_extension(&config.output_extension)
}

/// Convert a list of script files, writing each output next to its source
pub fn parse_script_list<P>(paths: &[P], config: &TranspileConfig) -> BatchReport
where
    P: AsRef<Path> + Sync,
{
    parse_script_list_with(paths, config, &FsSink)
}

/// [`parse_script_list`] with a custom artifact sink
pub fn parse_script_list_with<P, S>(paths: &[P], config: &TranspileConfig, sink: &S) -> BatchReport
where
    P: AsRef<Path> + Sync,
    S: ArtifactSink + ?Sized,
{
    tracing::info!("converting {} scripts", paths.len());
    let run = || {
        paths
            .par_iter()
            .map(|path| {
                let path: &Path = path.as_ref();
                (path.to_path_buf(), convert_file(path, config, sink))
            })
            .collect::<Vec<_>>()
    };
    let files = match config.workers {
        Some(workers) => match ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                tracing::warn!("failed to build a pool of {workers} workers, using the global pool: {e}");
                run()
            }
        },
        None => run(),
    };

    let report = BatchReport {
        success: files
            .iter()
            .all(|(_, outcome)| !matches!(outcome, FileOutcome::Failed { .. })),
        files,
    };
    tracing::info!(
        "batch finished: {} converted, {} skipped, {} failed",
        report.converted(),
        report.skipped(),
        report.failures().count()
    );
    report
}

fn convert_file<S>(path: &Path, config: &TranspileConfig, sink: &S) -> FileOutcome
where
    S: ArtifactSink + ?Sized,
{
    let dest = output_path(path, config);
    if sink.exists(&dest) {
        tracing::debug!("{} already exists, skipping", dest.display());
        return FileOutcome::Skipped;
    }

    tracing::debug!("converting {}", path.display());
    match write_output(path, &dest, config, sink) {
        Ok(()) => {
            tracing::debug!("wrote {}", dest.display());
            FileOutcome::Converted
        }
        Err(error) => {
            tracing::warn!("{error}");
            if let Err(e) = sink.remove_file(&dest) {
                tracing::warn!("failed to remove partial output {}: {e}", dest.display());
            }
            FileOutcome::Failed { error }
        }
    }
}

fn write_output<S>(path: &Path, dest: &Path, config: &TranspileConfig, sink: &S) -> Result<()>
where
    S: ArtifactSink + ?Sized,
{
    let bytes = std::fs::read(path).map_err(ConvertError::io(path))?;
    let text = config
        .encoding
        .decode(&bytes)
        .map_err(|_| ConvertError::Decode {
            path: path.to_path_buf(),
            encoding: config.encoding,
        })?;
    let converted = convert(&text, config, config.dump_ast).map_err(|e| e.with_file(path))?;

    sink.write_file(dest, converted.python.as_bytes())
        .map_err(ConvertError::io(dest))?;
    if let Some(xml) = converted.ast_xml {
        let xml_path = dest.with_extension(AST_DUMP_EXTENSION);
        sink.write_file(&xml_path, xml.as_bytes())
            .map_err(ConvertError::io(&xml_path))?;
    }
    Ok(())
}
