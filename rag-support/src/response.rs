//! Response post-processing graph.
//!
//! A [`ResponsePipeline`] is a small single-entry directed graph of named
//! [`ResponseStage`]s. Each stage receives the whole [`QueryState`] and returns
//! it, so later stages can look at the question as well as the answer. The
//! execution order is resolved once, when the pipeline is built.
//!
//! # Example
//!
//! ```rust
//! use rag_support::response::{LengthLimit, QueryState, ResponsePipeline};
//!
//! let pipeline = ResponsePipeline::builder()
//!     .stage(LengthLimit::new(5))
//!     .entry("format")
//!     .build()
//!     .unwrap();
//!
//! let state = pipeline.run(QueryState::new("why?", "because of reasons"));
//! assert_eq!(state.answer, "becau");
//! ```

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::DEFAULT_MAX_ANSWER_CHARS;
use crate::error::{RagError, Result};

/// The record flowing through the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryState {
    /// The question as asked.
    pub question: String,
    /// The answer, rewritten by each stage in turn.
    pub answer: String,
}

impl QueryState {
    /// Create a state from a question and a raw answer.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into() }
    }
}

/// A deterministic, synchronous transform over a [`QueryState`].
pub trait ResponseStage: Send + Sync {
    /// Unique stage name used for edges and the entry point.
    fn name(&self) -> &str;

    /// Transform the state.
    fn apply(&self, state: QueryState) -> QueryState;
}

/// Truncates the answer to at most `max_chars` characters.
///
/// Registered under the name `format`.
#[derive(Debug, Clone, Copy)]
pub struct LengthLimit {
    max_chars: usize,
}

impl LengthLimit {
    /// Create a limit of `max_chars` characters.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// The configured limit.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

impl Default for LengthLimit {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ANSWER_CHARS)
    }
}

impl ResponseStage for LengthLimit {
    fn name(&self) -> &str {
        "format"
    }

    fn apply(&self, mut state: QueryState) -> QueryState {
        if let Some((cut, _)) = state.answer.char_indices().nth(self.max_chars) {
            state.answer.truncate(cut);
        }
        state
    }
}

/// A stage built from a plain function.
pub struct FnStage<F> {
    name: String,
    f: F,
}

impl<F> FnStage<F>
where
    F: Fn(QueryState) -> QueryState + Send + Sync,
{
    /// Wrap `f` as a stage called `name`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> ResponseStage for FnStage<F>
where
    F: Fn(QueryState) -> QueryState + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, state: QueryState) -> QueryState {
        (self.f)(state)
    }
}

/// A compiled response graph.
pub struct ResponsePipeline {
    stages: Vec<Box<dyn ResponseStage>>,
    /// Indices into `stages`, in execution order.
    order: Vec<usize>,
}

impl std::fmt::Debug for ResponsePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsePipeline").field("order", &self.stage_names()).finish()
    }
}

impl Default for ResponsePipeline {
    /// A single `format` stage with the default length limit.
    fn default() -> Self {
        Self { stages: vec![Box::new(LengthLimit::default())], order: vec![0] }
    }
}

impl ResponsePipeline {
    /// Create a new [`ResponsePipelineBuilder`].
    pub fn builder() -> ResponsePipelineBuilder {
        ResponsePipelineBuilder::default()
    }

    /// A single `format` stage limiting answers to `max_chars` characters.
    pub fn with_length_limit(max_chars: usize) -> Self {
        Self { stages: vec![Box::new(LengthLimit::new(max_chars))], order: vec![0] }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.stages[i].name()).collect()
    }

    /// Run every stage in order, starting from the entry stage.
    pub fn run(&self, state: QueryState) -> QueryState {
        self.order.iter().fold(state, |state, &i| {
            let stage = &self.stages[i];
            trace!(stage = stage.name(), "applying response stage");
            stage.apply(state)
        })
    }
}

/// Builder for a [`ResponsePipeline`].
///
/// If no entry is set, the first registered stage is the entry.
#[derive(Default)]
pub struct ResponsePipelineBuilder {
    stages: Vec<Box<dyn ResponseStage>>,
    edges: Vec<(String, String)>,
    entry: Option<String>,
}

impl ResponsePipelineBuilder {
    /// Register a stage.
    pub fn stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a directed edge `from -> to`.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Set the entry stage.
    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Validate the graph and resolve its execution order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if there are no stages, a stage name
    /// repeats, the entry or an edge names an unknown stage, the graph has a
    /// cycle, or a stage is unreachable from the entry.
    pub fn build(self) -> Result<ResponsePipeline> {
        if self.stages.is_empty() {
            return Err(RagError::ConfigError("response pipeline has no stages".to_string()));
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.name(), i).is_some() {
                return Err(RagError::ConfigError(format!(
                    "duplicate response stage '{}'",
                    stage.name()
                )));
            }
        }
        let lookup = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| RagError::ConfigError(format!("unknown response stage '{name}'")))
        };

        let entry = match &self.entry {
            Some(name) => lookup(name)?,
            None => 0,
        };

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); self.stages.len()];
        for (from, to) in &self.edges {
            let (from, to) = (lookup(from)?, lookup(to)?);
            if !successors[from].contains(&to) {
                successors[from].push(to);
            }
        }
        for next in &mut successors {
            next.sort_unstable();
        }

        // nodes reachable from the entry
        let mut reachable = vec![false; self.stages.len()];
        let mut stack = vec![entry];
        while let Some(node) = stack.pop() {
            if !std::mem::replace(&mut reachable[node], true) {
                stack.extend(successors[node].iter().copied());
            }
        }
        if let Some(orphan) = reachable.iter().position(|r| !r) {
            return Err(RagError::ConfigError(format!(
                "response stage '{}' is unreachable from the entry",
                self.stages[orphan].name()
            )));
        }

        let mut in_degree = vec![0usize; self.stages.len()];
        for next in &successors {
            for &to in next {
                in_degree[to] += 1;
            }
        }
        if in_degree[entry] != 0 {
            return Err(RagError::ConfigError(format!(
                "response graph has a cycle through entry '{}'",
                self.stages[entry].name()
            )));
        }

        // Kahn's algorithm; ready nodes leave in registration order
        let mut order = Vec::with_capacity(self.stages.len());
        let mut ready = VecDeque::from([entry]);
        while let Some(node) = ready.pop_front() {
            order.push(node);
            for &to in &successors[node] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    let at = ready.iter().position(|&r| r > to).unwrap_or(ready.len());
                    ready.insert(at, to);
                }
            }
        }
        if order.len() != self.stages.len() {
            return Err(RagError::ConfigError("response graph has a cycle".to_string()));
        }

        Ok(ResponsePipeline { stages: self.stages, order })
    }
}
