//! Explicit filter-graph structure.
//!
//! Nodes are wired by labeled pads. [`GraphBuilder`] checks connectivity as
//! nodes are added, so a [`FilterGraph`] that exists is structurally valid:
//! every label has exactly one producer, is consumed exactly once (by a
//! node or an output map) and every `concat` node's `n` matches its inputs.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Name of an intermediate stream, e.g. `v0`, `vcat`, `aout`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Media type of an encoder input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

/// One end of an edge: an encoder input stream or a labeled node output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pad {
    /// Stream of the `index`-th encoder input, e.g. `0:v` or `4:a:0`.
    Input {
        index: usize,
        kind: StreamKind,
        stream: Option<usize>,
    },
    /// Output of another node.
    Label(Label),
}

impl Pad {
    /// First video stream of input `index`.
    pub fn video(index: usize) -> Self {
        Pad::Input {
            index,
            kind: StreamKind::Video,
            stream: None,
        }
    }

    /// First audio stream of input `index`, selected explicitly.
    pub fn audio(index: usize) -> Self {
        Pad::Input {
            index,
            kind: StreamKind::Audio,
            stream: Some(0),
        }
    }

    pub fn label(name: impl Into<Label>) -> Self {
        Pad::Label(name.into())
    }

    fn spec(&self) -> String {
        match self {
            Pad::Input {
                index,
                kind,
                stream,
            } => {
                let kind = match kind {
                    StreamKind::Video => "v",
                    StreamKind::Audio => "a",
                };
                match stream {
                    Some(s) => format!("{index}:{kind}:{s}"),
                    None => format!("{index}:{kind}"),
                }
            }
            Pad::Label(label) => label.to_string(),
        }
    }
}

/// Position of a node in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single filter invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub id: NodeId,
    /// Filter name, e.g. `scale`, `concat`, `drawtext`.
    pub filter: String,
    /// Ordered `key=value` options.
    pub params: Vec<(String, String)>,
    pub inputs: Vec<Pad>,
    pub outputs: Vec<Label>,
}

impl FilterNode {
    /// Value of option `key`, if set.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn spec(&self) -> String {
        let mut out = String::new();
        for pad in &self.inputs {
            out.push('[');
            out.push_str(&pad.spec());
            out.push(']');
        }
        out.push_str(&self.filter);
        if !self.params.is_empty() {
            out.push('=');
            let options = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}={}", escape_option_value(v)))
                .collect::<Vec<_>>()
                .join(":");
            out.push_str(&options);
        }
        for label in &self.outputs {
            out.push('[');
            out.push_str(label.as_str());
            out.push(']');
        }
        out
    }
}

/// Structural problems detected while assembling a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("label [{0}] is produced more than once")]
    DuplicateLabel(Label),

    #[error("label [{0}] is consumed before any node produces it")]
    UnknownLabel(Label),

    #[error("label [{0}] is consumed more than once")]
    LabelConsumedTwice(Label),

    #[error("label [{0}] is produced but never consumed or mapped")]
    DanglingLabel(Label),

    #[error("input #{index} does not exist (graph has {available} inputs)")]
    UnknownInput { index: usize, available: usize },

    #[error("concat declares n={declared} but is fed {actual} segments")]
    ConcatArity { declared: usize, actual: usize },

    #[error("filter {filter} must have at least one input and one output")]
    MissingPads { filter: String },

    #[error("filter graph has no nodes")]
    EmptyGraph,

    #[error("filter graph maps no output streams")]
    NoOutputs,
}

/// A validated filter graph plus its output stream mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
    maps: Vec<Label>,
    shortest: bool,
}

impl FilterGraph {
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Labels mapped to the output file, primary video first.
    pub fn maps(&self) -> &[Label] {
        &self.maps
    }

    /// Whether encoding stops at the shortest mapped stream.
    pub fn shortest(&self) -> bool {
        self.shortest
    }

    /// All nodes running `filter`.
    pub fn nodes_named<'a>(&'a self, filter: &'a str) -> impl Iterator<Item = &'a FilterNode> + 'a {
        self.nodes.iter().filter(move |node| node.filter == filter)
    }

    pub fn contains_filter(&self, filter: &str) -> bool {
        self.nodes_named(filter).next().is_some()
    }

    /// Node producing `label`.
    pub fn producer_of(&self, label: &str) -> Option<&FilterNode> {
        self.nodes
            .iter()
            .find(|node| node.outputs.iter().any(|l| l.as_str() == label))
    }

    /// Render the `-filter_complex` argument.
    pub fn to_filter_complex(&self) -> String {
        self.nodes
            .iter()
            .map(FilterNode::spec)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// `-map` arguments, followed by `-shortest` when enabled.
    pub fn map_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.maps.len() * 2 + 1);
        for label in &self.maps {
            args.push("-map".to_string());
            args.push(format!("[{label}]"));
        }
        if self.shortest {
            args.push("-shortest".to_string());
        }
        args
    }
}

/// Incremental, validating graph constructor.
#[derive(Debug)]
pub struct GraphBuilder {
    input_count: usize,
    nodes: Vec<FilterNode>,
    producers: HashMap<Label, NodeId>,
    consumed: HashSet<Label>,
}

impl GraphBuilder {
    /// Start a graph over `input_count` encoder inputs.
    pub fn new(input_count: usize) -> Self {
        Self {
            input_count,
            nodes: Vec::new(),
            producers: HashMap::new(),
            consumed: HashSet::new(),
        }
    }

    /// Append a node. Its inputs must already be produced and unconsumed.
    pub fn node(
        &mut self,
        filter: &str,
        params: Vec<(String, String)>,
        inputs: Vec<Pad>,
        outputs: Vec<Label>,
    ) -> Result<NodeId, GraphError> {
        if inputs.is_empty() || outputs.is_empty() {
            return Err(GraphError::MissingPads {
                filter: filter.to_string(),
            });
        }

        if filter == "concat" {
            let declared = params
                .iter()
                .find(|(k, _)| k == "n")
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(2);
            if declared != inputs.len() {
                return Err(GraphError::ConcatArity {
                    declared,
                    actual: inputs.len(),
                });
            }
        }

        let mut seen_here = HashSet::new();
        for pad in &inputs {
            match pad {
                Pad::Input { index, .. } => {
                    if *index >= self.input_count {
                        return Err(GraphError::UnknownInput {
                            index: *index,
                            available: self.input_count,
                        });
                    }
                }
                Pad::Label(label) => {
                    if !self.producers.contains_key(label) {
                        return Err(GraphError::UnknownLabel(label.clone()));
                    }
                    if self.consumed.contains(label) || !seen_here.insert(label.clone()) {
                        return Err(GraphError::LabelConsumedTwice(label.clone()));
                    }
                }
            }
        }

        let mut fresh = HashSet::new();
        for label in &outputs {
            if self.producers.contains_key(label) || !fresh.insert(label.clone()) {
                return Err(GraphError::DuplicateLabel(label.clone()));
            }
        }

        let id = NodeId(self.nodes.len());
        for pad in &inputs {
            if let Pad::Label(label) = pad {
                self.consumed.insert(label.clone());
            }
        }
        for label in &outputs {
            self.producers.insert(label.clone(), id);
        }

        self.nodes.push(FilterNode {
            id,
            filter: filter.to_string(),
            params,
            inputs,
            outputs,
        });
        Ok(id)
    }

    /// Single-input, single-output convenience over [`GraphBuilder::node`].
    pub fn chain(
        &mut self,
        filter: &str,
        params: Vec<(String, String)>,
        input: Pad,
        output: impl Into<Label>,
    ) -> Result<Label, GraphError> {
        let output = output.into();
        self.node(filter, params, vec![input], vec![output.clone()])?;
        Ok(output)
    }

    /// Close the graph, mapping `maps` to the output file.
    pub fn finish(self, maps: Vec<Label>, shortest: bool) -> Result<FilterGraph, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        if maps.is_empty() {
            return Err(GraphError::NoOutputs);
        }

        let mut mapped = HashSet::new();
        for label in &maps {
            if !self.producers.contains_key(label) {
                return Err(GraphError::UnknownLabel(label.clone()));
            }
            if self.consumed.contains(label) || !mapped.insert(label.clone()) {
                return Err(GraphError::LabelConsumedTwice(label.clone()));
            }
        }

        // Report dangling labels in production order for stable errors.
        for node in &self.nodes {
            for label in &node.outputs {
                if !self.consumed.contains(label) && !mapped.contains(label) {
                    return Err(GraphError::DanglingLabel(label.clone()));
                }
            }
        }

        Ok(FilterGraph {
            nodes: self.nodes,
            maps,
            shortest,
        })
    }
}

/// Build an option list from `(key, value)` pairs.
pub fn params<V: ToString>(pairs: &[(&str, V)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Escape an option value for use inside `-filter_complex`.
///
/// ffmpeg parses filter options first at graph level, then at option
/// level, so a value is escaped for the option parser (`\ ' :`) and the
/// result again for the graph parser (`\ ' [ ] , ;`).
pub fn escape_option_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
