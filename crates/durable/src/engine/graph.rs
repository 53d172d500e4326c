//! Step graph definition and validation

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use tradegate_core::WorkflowState;

use super::executor::{ExecutorConfig, StepGraph};
use super::step::Step;
use crate::audit::AuditSink;

/// Where an edge leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Another step by name
    Step(String),
    /// Terminal marker
    End,
    /// Halt and hand the state back for later resumption
    Suspend,
}

impl Target {
    pub fn step(name: impl Into<String>) -> Self {
        Target::Step(name.into())
    }
}

/// Picks a route label from the current state. Must not mutate anything.
pub type Router = Arc<dyn Fn(&WorkflowState) -> String + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Edge {
    Direct(Target),
    Conditional {
        router: Router,
        routes: HashMap<String, Target>,
    },
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional { routes, .. } => f
                .debug_struct("Conditional")
                .field("routes", routes)
                .finish_non_exhaustive(),
        }
    }
}

/// Errors from graph validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("graph has no entry step")]
    MissingEntry,

    #[error("entry step '{0}' is not defined")]
    UnknownEntry(String),

    #[error("step '{0}' is defined twice")]
    DuplicateStep(String),

    #[error("step '{0}' has more than one outgoing edge")]
    DuplicateEdge(String),

    #[error("step '{0}' has no outgoing edge")]
    MissingEdge(String),

    #[error("edge from undefined step '{0}'")]
    UnknownSource(String),

    #[error("edge from '{from}' targets undefined step '{to}'")]
    UnknownTarget { from: String, to: String },

    #[error("conditional edge from '{0}' has no routes")]
    EmptyRoutes(String),

    #[error("required step '{0}' was not provided")]
    MissingStep(&'static str),
}

/// Builder for a [`StepGraph`]
///
/// # Example
///
/// ```
/// use tradegate_durable::engine::{from_fn, StepGraphBuilder, Target};
///
/// let graph = StepGraphBuilder::new("example")
///     .step("a", from_fn(|_| Ok(())))
///     .step("b", from_fn(|_| Ok(())))
///     .entry("a")
///     .edge("a", Target::step("b"))
///     .edge("b", Target::End)
///     .build()
///     .unwrap();
/// assert_eq!(graph.entry(), "a");
/// ```
pub struct StepGraphBuilder {
    name: String,
    steps: HashMap<String, Arc<dyn Step>>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
    config: ExecutorConfig,
    audit: Option<Arc<dyn AuditSink>>,
    errors: Vec<GraphError>,
}

impl StepGraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            config: ExecutorConfig::default(),
            audit: None,
            errors: Vec::new(),
        }
    }

    /// Add a step
    pub fn step(self, name: impl Into<String>, step: impl Step + 'static) -> Self {
        self.shared_step(name, Arc::new(step))
    }

    /// Add a step that is shared with other graphs
    pub fn shared_step(mut self, name: impl Into<String>, step: Arc<dyn Step>) -> Self {
        let name = name.into();
        if self.steps.insert(name.clone(), step).is_some() {
            self.errors.push(GraphError::DuplicateStep(name));
        }
        self
    }

    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Unconditional edge
    pub fn edge(self, from: impl Into<String>, to: Target) -> Self {
        self.add_edge(from.into(), Edge::Direct(to))
    }

    /// Conditional edge: `router` yields a label, `routes` maps labels to targets
    pub fn conditional<F, I, L>(self, from: impl Into<String>, router: F, routes: I) -> Self
    where
        F: Fn(&WorkflowState) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (L, Target)>,
        L: Into<String>,
    {
        let routes = routes
            .into_iter()
            .map(|(label, target)| (label.into(), target))
            .collect();
        self.add_edge(
            from.into(),
            Edge::Conditional {
                router: Arc::new(router),
                routes,
            },
        )
    }

    fn add_edge(mut self, from: String, edge: Edge) -> Self {
        if self.edges.insert(from.clone(), edge).is_some() {
            self.errors.push(GraphError::DuplicateEdge(from));
        }
        self
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Record one audit entry per terminal run segment
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Validate and freeze the graph
    pub fn build(self) -> Result<StepGraph, GraphError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let entry = self.entry.ok_or(GraphError::MissingEntry)?;
        if !self.steps.contains_key(&entry) {
            return Err(GraphError::UnknownEntry(entry));
        }

        // Sorted so the reported error does not depend on hash order
        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort();
        for from in sources {
            if !self.steps.contains_key(from) {
                return Err(GraphError::UnknownSource(from.clone()));
            }
            let targets: Vec<&Target> = match &self.edges[from] {
                Edge::Direct(target) => vec![target],
                Edge::Conditional { routes, .. } => {
                    if routes.is_empty() {
                        return Err(GraphError::EmptyRoutes(from.clone()));
                    }
                    routes.values().collect()
                }
            };
            for target in targets {
                if let Target::Step(to) = target {
                    if !self.steps.contains_key(to) {
                        return Err(GraphError::UnknownTarget {
                            from: from.clone(),
                            to: to.clone(),
                        });
                    }
                }
            }
        }

        let mut names: Vec<&String> = self.steps.keys().collect();
        names.sort();
        for name in names {
            if !self.edges.contains_key(name) {
                return Err(GraphError::MissingEdge(name.clone()));
            }
        }

        debug!(
            graph = %self.name,
            steps = self.steps.len(),
            entry = %entry,
            "step graph validated"
        );

        Ok(StepGraph::new(
            self.name,
            entry,
            self.steps,
            self.edges,
            self.config,
            self.audit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::step::from_fn;

    fn noop() -> impl Step {
        from_fn(|_| Ok(()))
    }

    #[test]
    fn test_missing_entry() {
        let err = StepGraphBuilder::new("g")
            .step("a", noop())
            .edge("a", Target::End)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::MissingEntry);
    }

    #[test]
    fn test_unknown_entry() {
        let err = StepGraphBuilder::new("g")
            .step("a", noop())
            .entry("b")
            .edge("a", Target::End)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownEntry("b".into()));
    }

    #[test]
    fn test_every_step_needs_an_edge() {
        let err = StepGraphBuilder::new("g")
            .step("a", noop())
            .step("b", noop())
            .entry("a")
            .edge("a", Target::step("b"))
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::MissingEdge("b".into()));
    }

    #[test]
    fn test_single_outgoing_edge() {
        let err = StepGraphBuilder::new("g")
            .step("a", noop())
            .entry("a")
            .edge("a", Target::End)
            .edge("a", Target::Suspend)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateEdge("a".into()));
    }

    #[test]
    fn test_conditional_targets_must_exist() {
        let err = StepGraphBuilder::new("g")
            .step("a", noop())
            .entry("a")
            .conditional(
                "a",
                |_| "x".to_string(),
                [("x", Target::End), ("y", Target::step("missing"))],
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownTarget {
                from: "a".into(),
                to: "missing".into()
            }
        );
    }

    #[test]
    fn test_duplicate_step() {
        let err = StepGraphBuilder::new("g")
            .step("a", noop())
            .step("a", noop())
            .entry("a")
            .edge("a", Target::End)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateStep("a".into()));
    }

    #[test]
    fn test_edge_from_unknown_step() {
        let err = StepGraphBuilder::new("g")
            .step("a", noop())
            .entry("a")
            .edge("a", Target::End)
            .edge("ghost", Target::End)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownSource("ghost".into()));
    }
}
