//! Line rules of the structure-graph dialect.
//!
//! Each rule is a pure function over a single line. Scope tracking lives in
//! the callers.

const LABEL_OPEN: &str = "label=\"";
const LABEL_CLOSE: &str = ")\"]";
const NODE_TERMINATOR: &str = "};";
const NODE_BLOCK_OPEN: &str = "{node";
const LOOP_LABEL: &str = "label=\"i";
const GRAPH_OPEN: &str = "graph G {";
const GRAPH_CLOSE: &str = "}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeMatch<'a> {
    pub a: &'a str,
    pub b: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledNodeMatch<'a> {
    pub node: &'a str,
    pub digits: &'a str,
}

impl LabeledNodeMatch<'_> {
    /// Base count encoded in the label. `None` if it does not fit in a `u64`.
    #[must_use]
    pub fn base_count(&self) -> Option<u64> {
        self.digits.parse().ok()
    }
}

/// Matches `<ws>*<A> -- <B>;` at the start of `line`.
///
/// Exactly one whitespace character sits on each side of `--`. `B` runs up to
/// the last `;` of its whitespace-free run, anything after that is ignored.
#[must_use]
pub fn match_edge_line(line: &str) -> Option<EdgeMatch<'_>> {
    let rest = line.trim_start();
    let a_len = rest.find(char::is_whitespace)?;
    let (a, after_a) = rest.split_at(a_len);
    let after_a = skip_one_whitespace(after_a)?;
    let after_op = after_a.strip_prefix("--")?;
    let tail = skip_one_whitespace(after_op)?;
    let run = leading_run(tail);
    let semicolon = run.rfind(';').filter(|index| *index > 0)?;
    Some(EdgeMatch {
        a,
        b: &run[..semicolon],
    })
}

/// Finds `label="…(<digits>)"]<ws>+<id>};` anywhere in `line`.
///
/// The earliest `label="` that can complete a match wins, and within it the
/// first `(<digits>)"]` that is followed by a node id.
#[must_use]
pub fn match_labeled_node_line(line: &str) -> Option<LabeledNodeMatch<'_>> {
    let mut search_from = 0;
    while let Some(offset) = line[search_from..].find(LABEL_OPEN) {
        let label_start = search_from + offset + LABEL_OPEN.len();
        if let Some(found) = match_label_tail(&line[label_start..]) {
            return Some(found);
        }
        search_from += offset + 1;
    }
    None
}

fn match_label_tail(text: &str) -> Option<LabeledNodeMatch<'_>> {
    for (paren, _) in text.match_indices('(') {
        // label text never spans lines
        if text[..paren].contains('\n') {
            return None;
        }
        let after_paren = &text[paren + 1..];
        let digits_len = after_paren
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(after_paren.len());
        if digits_len == 0 {
            continue;
        }
        let (digits, rest) = after_paren.split_at(digits_len);
        let Some(rest) = rest.strip_prefix(LABEL_CLOSE) else {
            continue;
        };
        let id_text = rest.trim_start();
        if id_text.len() == rest.len() {
            continue;
        }
        let run = leading_run(id_text);
        let Some(terminator) = run.rfind(NODE_TERMINATOR).filter(|index| *index > 0) else {
            continue;
        };
        return Some(LabeledNodeMatch {
            node: &run[..terminator],
            digits,
        });
    }
    None
}

/// True for node-block declarations whose label marks an internal loop.
#[must_use]
pub fn is_loop_declaration(line: &str) -> bool {
    line.trim().starts_with(NODE_BLOCK_OPEN) && line.contains(LOOP_LABEL)
}

#[must_use]
pub fn opens_graph_block(line: &str) -> bool {
    line.trim().starts_with(GRAPH_OPEN)
}

#[must_use]
pub fn closes_graph_block(line: &str) -> bool {
    line.trim() == GRAPH_CLOSE
}

/// Internal-loop node ids carry an `i` somewhere in the token.
#[must_use]
pub fn is_loop_token(token: &str) -> bool {
    token.contains('i')
}

#[must_use]
pub fn format_edge_line(a: &str, b: &str) -> String {
    format!("    {a} -- {b};")
}

/// First run of ASCII decimal digits in `token`.
#[must_use]
pub fn first_digit_run(token: &str) -> Option<&str> {
    let start = token.find(|ch: char| ch.is_ascii_digit())?;
    let tail = &token[start..];
    let len = tail
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(tail.len());
    Some(&tail[..len])
}

fn skip_one_whitespace(text: &str) -> Option<&str> {
    let ch = text.chars().next().filter(|ch| ch.is_whitespace())?;
    Some(&text[ch.len_utf8()..])
}

fn leading_run(text: &str) -> &str {
    let len = text.find(char::is_whitespace).unwrap_or(text.len());
    &text[..len]
}
