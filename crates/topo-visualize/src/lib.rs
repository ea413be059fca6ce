#![forbid(unsafe_code)]

//! Sequence-to-image pipeline: fold, convert to structure-graph text,
//! optionally collapse internal loops, then render.

mod collaborators;
mod config;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use topo_parser::{CollapseStats, collapse_internal_loops_with_stats};
use tracing::{debug, info};

pub use collaborators::{
    Converter, Folded, Folder, GraphvizRenderer, Renderer, RnaFoldFolder, ScriptConverter,
    parse_fold_output,
};
pub use config::{ConverterConfig, FolderConfig, RendererConfig, VisualizeConfig};

#[derive(Debug, Error)]
pub enum VisualizeError {
    #[error("invalid RNA sequence: {reason}")]
    InvalidSequence { reason: String },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("could not find a structure and energy in folding output: {output:?}")]
    FoldOutput { output: String },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {origin}: {source}")]
    Config {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizeRequest {
    pub sequence: String,
    pub output_image: PathBuf,
    /// Collapse internal loops before rendering.
    pub simple: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualizeReport {
    pub folded: Folded,
    pub graph_output: PathBuf,
    pub image: PathBuf,
    pub collapse: Option<CollapseStats>,
}

/// Progress of a pipeline run, reported as each stage finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisualizeEvent<'a> {
    Folded(&'a Folded),
    GraphWritten(&'a Path),
    Rendered(&'a Path),
}

/// The three collaborators a pipeline run needs.
pub struct Collaborators<'a> {
    pub folder: &'a dyn Folder,
    pub converter: &'a dyn Converter,
    pub renderer: &'a dyn Renderer,
}

/// Process-backed collaborators built from a config.
pub struct SystemCollaborators {
    pub folder: RnaFoldFolder,
    pub converter: ScriptConverter,
    pub renderer: GraphvizRenderer,
}

impl SystemCollaborators {
    #[must_use]
    pub fn from_config(config: &VisualizeConfig) -> Self {
        Self {
            folder: RnaFoldFolder::new(config.folder.clone()),
            converter: ScriptConverter::new(config.converter.clone()),
            renderer: GraphvizRenderer::new(config.renderer.clone()),
        }
    }

    #[must_use]
    pub fn as_collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            folder: &self.folder,
            converter: &self.converter,
            renderer: &self.renderer,
        }
    }
}

/// Checks that `sequence` is a non-empty string over `A`, `U`, `G`, `C`
/// (either case) and returns it upper-cased.
pub fn normalize_sequence(sequence: &str) -> Result<String, VisualizeError> {
    let trimmed = sequence.trim();
    if trimmed.is_empty() {
        return Err(VisualizeError::InvalidSequence {
            reason: "sequence is empty".to_string(),
        });
    }
    if let Some((position, ch)) = trimmed
        .char_indices()
        .find(|(_, ch)| !matches!(ch.to_ascii_uppercase(), 'A' | 'U' | 'G' | 'C'))
    {
        return Err(VisualizeError::InvalidSequence {
            reason: format!("unexpected {ch:?} at position {}", position + 1),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Runs fold, convert, optional collapse, write and render in order.
///
/// `progress` sees each stage as soon as it succeeds, so a caller can show
/// the fold result even when a later collaborator fails.
pub fn generate_rna_graph(
    request: &VisualizeRequest,
    config: &VisualizeConfig,
    collaborators: &Collaborators<'_>,
    progress: &mut dyn FnMut(VisualizeEvent<'_>),
) -> Result<VisualizeReport, VisualizeError> {
    let sequence = normalize_sequence(&request.sequence)?;

    let folded = collaborators.folder.fold(&sequence)?;
    info!(structure = %folded.structure, mfe = folded.mfe, "folded sequence");
    progress(VisualizeEvent::Folded(&folded));

    let mut graph_text = collaborators
        .converter
        .convert(&sequence, &folded.structure)?;
    debug!(bytes = graph_text.len(), "converted structure to graph text");

    let collapse = if request.simple {
        let collapsed = collapse_internal_loops_with_stats(&graph_text);
        debug!(stats = ?collapsed.stats, "collapsed internal loops");
        graph_text = collapsed.text;
        Some(collapsed.stats)
    } else {
        None
    };

    write_graph_output(&config.graph_output, &graph_text)?;
    info!(path = %config.graph_output.display(), "wrote graph text");
    progress(VisualizeEvent::GraphWritten(&config.graph_output));

    collaborators
        .renderer
        .render(&graph_text, &request.output_image)?;
    info!(path = %request.output_image.display(), "rendered graph image");
    progress(VisualizeEvent::Rendered(&request.output_image));

    Ok(VisualizeReport {
        folded,
        graph_output: config.graph_output.clone(),
        image: request.output_image.clone(),
        collapse,
    })
}

fn write_graph_output(path: &Path, graph_text: &str) -> Result<(), VisualizeError> {
    std::fs::write(path, graph_text).map_err(|source| VisualizeError::Io {
        context: format!("failed to write {}", path.display()),
        source,
    })
}
