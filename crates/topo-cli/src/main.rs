#![forbid(unsafe_code)]

//! RNA topology CLI.
//!
//! # Commands
//!
//! - `longest`: Longest path through a structure graph, by edges or bases
//! - `visualize`: Fold a sequence, convert it to a structure graph and render it
//! - `collapse`: Replace internal loops with direct neighbor edges
//! - `parse`: Summarize a structure graph as JSON

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use topo_core::LongestPath;
use topo_parser::{collapse_internal_loops_with_stats, parse, parse_file, parse_summary_json};
use topo_path::{longest_by_bases, longest_by_edges};
use topo_visualize::{
    SystemCollaborators, VisualizeConfig, VisualizeEvent, VisualizeRequest, generate_rna_graph,
};
use tracing::{debug, error, info, warn};

/// RNA topology CLI - longest paths and structure graph rendering.
#[derive(Debug, Parser)]
#[command(
    name = "topo",
    version,
    about = "RNA topology CLI - longest paths and structure graph rendering",
    long_about = "Analyzes RNA secondary-structure graphs.\n\n\
        Finds longest paths by edge or base count, collapses internal loops,\n\
        and drives folding, conversion and rendering of structure graphs."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find the longest path in a structure graph file.
    Longest {
        /// Path to the graph definition file.
        input_file: PathBuf,

        /// Use base counts to determine the longest path.
        #[arg(short, long)]
        base: bool,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a structure graph image from an RNA sequence.
    Visualize {
        /// RNA sequence (A, U, G, C).
        rna_sequence: String,

        /// Path to save the output image.
        #[arg(default_value = "graph.png")]
        output_image_path: PathBuf,

        /// Exclude internal loops (i) from the graph.
        #[arg(short, long)]
        simple: bool,

        /// TOML file overriding collaborator programs and output paths
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Collapse internal loops in a structure graph.
    Collapse {
        /// Input file path or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Parse a structure graph and print a JSON summary.
    Parse {
        /// Input file path or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Longest {
            input_file,
            base,
            json,
        } => cmd_longest(&input_file, base, json),

        Command::Visualize {
            rna_sequence,
            output_image_path,
            simple,
            config,
        } => cmd_visualize(rna_sequence, output_image_path, simple, config),

        Command::Collapse { input, output } => cmd_collapse(&input, output.as_deref()),

        Command::Parse { input, pretty } => cmd_parse(&input, pretty),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

// =============================================================================
// Command: longest
// =============================================================================

fn cmd_longest(input_file: &Path, base: bool, json_output: bool) -> Result<()> {
    let parsed = parse_file(input_file)?;

    debug!(
        "Parsed: nodes={}, edges={}, weighted={}, warnings={}",
        parsed.graph.node_count(),
        parsed.graph.edge_count(),
        parsed.weights.len(),
        parsed.warnings.len()
    );
    for warning in &parsed.warnings {
        warn!("Parse warning: {warning}");
    }

    let result = if base {
        longest_by_bases(&parsed.graph, &parsed.weights)
    } else {
        longest_by_edges(&parsed.graph)
    };

    if json_output {
        let json = serde_json::to_string_pretty(&result)?;
        println!("{json}");
        return Ok(());
    }

    print!("{}", format_longest(&result));
    Ok(())
}

fn format_longest(result: &LongestPath) -> String {
    let Some((first, last)) = result.endpoints() else {
        warn!("No pair of nodes is connected by a path with a positive score");
        return "No path found\n".to_string();
    };

    format!(
        "{first} ~ {last}\nLongest Path: {}\n{}: {}\n",
        quoted_list(&result.nodes),
        result.metric.label(),
        result.value
    )
}

/// Renders ids as a list literal, `['a', 'b']`, quoting each id with single
/// quotes unless it contains one and no double quote.
fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| {
            let escaped = item.replace('\\', "\\\\");
            if item.contains('\'') && !item.contains('"') {
                format!("\"{escaped}\"")
            } else {
                format!("'{}'", escaped.replace('\'', "\\'"))
            }
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

// =============================================================================
// Command: visualize
// =============================================================================

fn cmd_visualize(
    sequence: String,
    output_image: PathBuf,
    simple: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => VisualizeConfig::load(&path)
            .context(format!("Failed to load config: {}", path.display()))?,
        None => VisualizeConfig::default(),
    };

    let request = VisualizeRequest {
        sequence,
        output_image,
        simple,
    };
    let system = SystemCollaborators::from_config(&config);

    let mut report_stage = |event: VisualizeEvent<'_>| {
        print!("{}", format_visualize_event(event));
    };

    // Collaborator failures end the run without a failing exit status.
    match generate_rna_graph(
        &request,
        &config,
        &system.as_collaborators(),
        &mut report_stage,
    ) {
        Ok(report) => {
            if let Some(stats) = &report.collapse {
                info!(
                    "Collapsed {} internal loops into {} generated edges ({} edges total)",
                    stats.intermediates, stats.generated_edges, stats.output_edges
                );
            }
        }
        Err(err) => {
            error!("Visualization failed: {err}");
            println!("An error occurred: {err}");
        }
    }
    Ok(())
}

fn format_visualize_event(event: VisualizeEvent<'_>) -> String {
    match event {
        VisualizeEvent::Folded(folded) => format!(
            "RNA Structure (Dot-Bracket): {}\nMinimum Free Energy: {:?} kcal/mol\n",
            folded.structure, folded.mfe
        ),
        VisualizeEvent::GraphWritten(path) => {
            format!("Graph output saved to: {}\n", path.display())
        }
        VisualizeEvent::Rendered(path) => format!("Graph image saved at: {}\n", path.display()),
    }
}

// =============================================================================
// Command: collapse
// =============================================================================

fn cmd_collapse(input: &str, output: Option<&str>) -> Result<()> {
    let source = load_input(input)?;
    let collapsed = collapse_internal_loops_with_stats(&source);

    debug!(
        "Collapsed: removed_declarations={}, direct={}, intermediates={}, generated={}, duplicates={}",
        collapsed.stats.removed_declarations,
        collapsed.stats.direct_edges,
        collapsed.stats.intermediates,
        collapsed.stats.generated_edges,
        collapsed.stats.duplicate_edges
    );

    write_output(output, &collapsed.text)
}

// =============================================================================
// Command: parse
// =============================================================================

fn cmd_parse(input: &str, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    let parsed = parse(&source);

    for warning in &parsed.warnings {
        warn!("Parse warning: {warning}");
    }

    let summary = parse_summary_json(&parsed);
    let output = if pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        summary.to_string()
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use topo_core::{LongestPath, PathMetric};
    use topo_visualize::{Folded, VisualizeEvent};

    use super::{Cli, Command, format_longest, format_visualize_event, quoted_list};

    #[test]
    fn longest_output_lists_endpoints_path_and_metric() {
        let result = LongestPath {
            metric: PathMetric::Bases,
            nodes: vec!["n1".into(), "n2".into(), "n3".into()],
            value: 10,
        };
        assert_eq!(
            format_longest(&result),
            "n1 ~ n3\nLongest Path: ['n1', 'n2', 'n3']\nTotal Base Count: 10\n"
        );
    }

    #[test]
    fn quoted_list_picks_quotes_per_item() {
        let items = [
            "s0".to_string(),
            "it's".to_string(),
            "a\"b".to_string(),
            "back\\slash".to_string(),
        ];
        assert_eq!(
            quoted_list(&items),
            r#"['s0', "it's", 'a"b', 'back\\slash']"#
        );
        assert_eq!(quoted_list(&[]), "[]");
    }

    #[test]
    fn empty_longest_result_is_not_indexed() {
        assert_eq!(
            format_longest(&LongestPath::empty(PathMetric::Edges)),
            "No path found\n"
        );
    }

    #[test]
    fn visualize_stage_lines() {
        let folded = Folded {
            structure: "((...))".to_string(),
            mfe: -1.2,
        };
        assert_eq!(
            format_visualize_event(VisualizeEvent::Folded(&folded)),
            "RNA Structure (Dot-Bracket): ((...))\nMinimum Free Energy: -1.2 kcal/mol\n"
        );
        assert_eq!(
            format_visualize_event(VisualizeEvent::GraphWritten(Path::new("graph_output.txt"))),
            "Graph output saved to: graph_output.txt\n"
        );
        assert_eq!(
            format_visualize_event(VisualizeEvent::Rendered(Path::new("graph.png"))),
            "Graph image saved at: graph.png\n"
        );
    }

    #[test]
    fn whole_energies_keep_a_decimal() {
        let folded = Folded {
            structure: "....".to_string(),
            mfe: 0.0,
        };
        assert!(
            format_visualize_event(VisualizeEvent::Folded(&folded))
                .ends_with("Minimum Free Energy: 0.0 kcal/mol\n")
        );
    }

    #[test]
    fn visualize_arguments_default_output_path() {
        let cli = Cli::try_parse_from(["topo", "visualize", "GGAAACC", "-s"]).expect("cli");
        match cli.command {
            Command::Visualize {
                rna_sequence,
                output_image_path,
                simple,
                config,
            } => {
                assert_eq!(rna_sequence, "GGAAACC");
                assert_eq!(output_image_path, PathBuf::from("graph.png"));
                assert!(simple);
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn longest_accepts_base_flag() {
        let cli = Cli::try_parse_from(["topo", "longest", "graph.txt", "--base", "-vv"])
            .expect("cli");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Longest { base: true, json: false, .. }));
    }
}
