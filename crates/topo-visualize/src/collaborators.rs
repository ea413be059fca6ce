//! External tools behind the visualization pipeline.
//!
//! Each collaborator is a trait so the pipeline can run against in-process
//! fakes. The default implementations shell out to ViennaRNA, a
//! structure-to-graph converter script and Graphviz.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::VisualizeError;
use crate::config::{ConverterConfig, FolderConfig, RendererConfig};

/// Minimum-free-energy fold of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Folded {
    /// Dot-bracket structure, one character per nucleotide.
    pub structure: String,
    /// Minimum free energy in kcal/mol.
    pub mfe: f64,
}

pub trait Folder {
    fn fold(&self, sequence: &str) -> Result<Folded, VisualizeError>;
}

pub trait Converter {
    /// Turns a folded sequence into structure-graph dialect text.
    fn convert(&self, sequence: &str, structure: &str) -> Result<String, VisualizeError>;
}

pub trait Renderer {
    fn render(&self, graph_text: &str, output: &Path) -> Result<(), VisualizeError>;
}

/// Runs `RNAfold` with the sequence on stdin.
#[derive(Debug, Clone, Default)]
pub struct RnaFoldFolder {
    config: FolderConfig,
}

impl RnaFoldFolder {
    #[must_use]
    pub fn new(config: FolderConfig) -> Self {
        Self { config }
    }
}

impl Folder for RnaFoldFolder {
    fn fold(&self, sequence: &str) -> Result<Folded, VisualizeError> {
        let stdin = format!("{sequence}\n");
        let output = run_program(&self.config.program, &self.config.args, Some(&stdin))?;
        parse_fold_output(&output)
    }
}

/// Reads the `<structure> (<mfe>)` line printed by RNAfold.
pub fn parse_fold_output(output: &str) -> Result<Folded, VisualizeError> {
    let malformed = || VisualizeError::FoldOutput {
        output: output.trim().to_string(),
    };

    for line in output.lines().map(str::trim) {
        let Some(open) = line.rfind('(') else {
            continue;
        };
        let (structure, energy) = line.split_at(open);
        let structure = structure.trim();
        if structure.is_empty() || !structure.chars().all(|ch| matches!(ch, '.' | '(' | ')')) {
            continue;
        }
        let mfe = energy
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed())?;
        return Ok(Folded {
            structure: structure.to_string(),
            mfe,
        });
    }

    Err(malformed())
}

/// Runs a converter script on a temporary dot-bracket file and captures the
/// graph text it prints.
#[derive(Debug, Clone, Default)]
pub struct ScriptConverter {
    config: ConverterConfig,
}

impl ScriptConverter {
    #[must_use]
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }
}

impl Converter for ScriptConverter {
    fn convert(&self, sequence: &str, structure: &str) -> Result<String, VisualizeError> {
        let mut input = tempfile::Builder::new()
            .suffix(".dotbracket")
            .tempfile()
            .map_err(|source| VisualizeError::Io {
                context: "failed to create structure file".to_string(),
                source,
            })?;
        write!(input, ">{sequence}\n{structure}\n")
            .and_then(|()| input.flush())
            .map_err(|source| VisualizeError::Io {
                context: format!("failed to write {}", input.path().display()),
                source,
            })?;

        let mut args = self.config.args.clone();
        args.push(input.path().display().to_string());
        args.push("-T".to_string());
        args.push(self.config.layout_engine.clone());
        run_program(&self.config.program, &args, None)
    }
}

/// Pipes graph text through a Graphviz layout program into an image file.
#[derive(Debug, Clone, Default)]
pub struct GraphvizRenderer {
    config: RendererConfig,
}

impl GraphvizRenderer {
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }
}

impl Renderer for GraphvizRenderer {
    fn render(&self, graph_text: &str, output: &Path) -> Result<(), VisualizeError> {
        let image = tempfile::Builder::new()
            .suffix(&format!(".{}", self.config.format))
            .tempfile()
            .map_err(|source| VisualizeError::Io {
                context: "failed to create temporary image".to_string(),
                source,
            })?;

        let args = [
            format!("-T{}", self.config.format),
            "-o".to_string(),
            image.path().display().to_string(),
        ];
        run_program(&self.config.program, &args, Some(graph_text))?;

        std::fs::copy(image.path(), output).map_err(|source| VisualizeError::Io {
            context: format!("failed to copy image to {}", output.display()),
            source,
        })?;
        Ok(())
    }
}

/// Runs `program`, optionally feeding `stdin`, and returns its stdout.
pub(crate) fn run_program(
    program: &str,
    args: &[String],
    stdin: Option<&str>,
) -> Result<String, VisualizeError> {
    debug!(program, ?args, "spawning collaborator");

    let spawn_error = |source: io::Error| VisualizeError::Spawn {
        program: program.to_string(),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    // stdin is written concurrently with draining stdout and stderr.
    let (output, written) = thread::scope(|scope| {
        let writer = stdin
            .zip(child.stdin.take())
            .map(|(text, mut pipe)| scope.spawn(move || pipe.write_all(text.as_bytes())));
        let output = child.wait_with_output();
        let written = match writer {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
            None => Ok(()),
        };
        (output, written)
    });

    let output = output.map_err(spawn_error)?;
    if let Err(err) = written
        && err.kind() != io::ErrorKind::BrokenPipe
    {
        return Err(spawn_error(err));
    }
    if !output.status.success() {
        return Err(VisualizeError::Exit {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
