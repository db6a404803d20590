//! Per-call request context
//!
//! Holds the role selection, the request-scoped artifact cache and the
//! resolved configuration. Rules read parsed artifacts through it; the
//! first rule to ask for a role parses its candidate and every later rule
//! gets the cached structure.

use crate::config::ResolvedConfig;
use argcheck_artifact::{
    AnnotationDocument, ArgdownGraph, Artifact, ArtifactCandidate, ArtifactType, ParsedArtifact,
    ParsedGraph, XmlDocument,
};
use argcheck_extract::{ArtifactCache, ParseError, ParserRegistry, Role};
use argcheck_logic::EntailmentSolver;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// State of one verification call
pub struct RequestContext<'a> {
    selection: IndexMap<Role, Option<&'a ArtifactCandidate>>,
    cache: ArtifactCache,
    parsers: &'a ParserRegistry,
    solver: &'a dyn EntailmentSolver,
    config: &'a ResolvedConfig,
    source: Option<&'a str>,
    failures: RefCell<HashMap<Role, ParseError>>,
}

impl std::fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let selection: Vec<(Role, Option<&str>)> = self
            .selection
            .iter()
            .map(|(role, cand)| (*role, cand.map(|c| c.id())))
            .collect();
        f.debug_struct("RequestContext")
            .field("selection", &selection)
            .field("parsers", self.parsers)
            .field("solver", &self.solver.name())
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> RequestContext<'a> {
    /// Select one candidate per configured role
    ///
    /// Each role gets the matching candidate with the highest position.
    #[must_use]
    pub fn new(
        candidates: &'a [ArtifactCandidate],
        config: &'a ResolvedConfig,
        parsers: &'a ParserRegistry,
        solver: &'a dyn EntailmentSolver,
    ) -> Self {
        let selection = config
            .filters
            .iter()
            .map(|(role, filter)| {
                let selected = filter.select(candidates);
                tracing::debug!(
                    role = role.as_str(),
                    candidate = selected.map(ArtifactCandidate::id),
                    "role selection"
                );
                (*role, selected)
            })
            .collect();
        Self {
            selection,
            cache: ArtifactCache::default(),
            parsers,
            solver,
            config,
            source: None,
            failures: RefCell::new(HashMap::new()),
        }
    }

    /// With source text the artifacts describe
    #[must_use]
    pub fn with_source(mut self, source: Option<&'a str>) -> Self {
        self.source = source;
        self
    }

    /// With cache of the given capacity
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache = ArtifactCache::new(capacity);
        self
    }

    /// Candidate selected for a role
    #[must_use]
    pub fn selected(&self, role: Role) -> Option<&'a ArtifactCandidate> {
        self.selection.get(&role).copied().flatten()
    }

    /// Roles of this call with their selections
    pub fn selection(&self) -> impl Iterator<Item = (Role, Option<&'a ArtifactCandidate>)> + '_ {
        self.selection.iter().map(|(role, cand)| (*role, *cand))
    }

    /// Resolved configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResolvedConfig {
        self.config
    }

    /// Entailment solver
    #[inline]
    #[must_use]
    pub fn solver(&self) -> &dyn EntailmentSolver {
        self.solver
    }

    /// Source text, if given
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<&'a str> {
        self.source
    }

    /// Parse result for an Argdown role; `None` when the role is absent
    pub fn parse_graph(&self, role: Role) -> Option<Result<Arc<ParsedGraph>, ParseError>> {
        self.load::<ArgdownGraph, _>(role, |c| self.parsers.argdown().parse_candidate(c))
            .map(|r| r.map(|a| a.shared()))
    }

    /// Parse result for an annotation role; `None` when the role is absent
    pub fn parse_document(&self, role: Role) -> Option<Result<Arc<AnnotationDocument>, ParseError>> {
        self.load::<XmlDocument, _>(role, |c| self.parsers.xml().parse_candidate(c))
            .map(|r| r.map(|a| a.shared()))
    }

    /// Parsed graph for a role, if selected and well-formed
    #[must_use]
    pub fn graph(&self, role: Role) -> Option<Arc<ParsedGraph>> {
        self.parse_graph(role).and_then(Result::ok)
    }

    /// Parsed annotation document for a role, if selected and well-formed
    #[must_use]
    pub fn document(&self, role: Role) -> Option<Arc<AnnotationDocument>> {
        self.parse_document(role).and_then(Result::ok)
    }

    /// Parsed structure of a role for reporting
    #[must_use]
    pub fn snapshot(&self, role: Role) -> Option<ParsedArtifact> {
        match role {
            Role::Arganno => self.document(role).map(|d| ParsedArtifact::Document((*d).clone())),
            Role::Argmap | Role::Infreco | Role::Logreco => {
                self.graph(role).map(|g| ParsedArtifact::Graph((*g).clone()))
            }
        }
    }

    fn load<T, F>(&self, role: Role, parse: F) -> Option<Result<Artifact<T>, ParseError>>
    where
        T: ArtifactType,
        F: FnOnce(&ArtifactCandidate) -> Result<T::Content, ParseError>,
    {
        let candidate = self.selected(role)?;
        if let Some(err) = self.failures.borrow().get(&role) {
            return Some(Err(err.clone()));
        }
        let result = self.cache.try_get_or_insert_with::<T, _, _>(candidate, || parse(candidate));
        if let Err(err) = &result {
            tracing::debug!(role = role.as_str(), candidate = candidate.id(), error = %err, "parse failed");
            self.failures.borrow_mut().insert(role, err.clone());
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argcheck_artifact::{DataType, Metadata};
    use argcheck_extract::{default_parsers, RoleFilter};
    use argcheck_logic::FiniteModelSolver;

    fn candidates() -> Vec<ArtifactCandidate> {
        vec![
            ArtifactCandidate::new(0, DataType::Argdown, "[A]: a.\n", Metadata::new()),
            ArtifactCandidate::new(1, DataType::Xml, "<proposition id=\"1\">x</proposition>", Metadata::new()),
        ]
    }

    #[test]
    fn selection_and_parsing() {
        let cands = candidates();
        let config = ResolvedConfig::new()
            .with_filter(RoleFilter::new(Role::Argmap))
            .with_filter(RoleFilter::new(Role::Arganno));
        let parsers = default_parsers();
        let solver = FiniteModelSolver::new();
        let ctx = RequestContext::new(&cands, &config, &parsers, &solver);

        assert_eq!(ctx.selected(Role::Argmap).map(ArtifactCandidate::position), Some(0));
        let first = ctx.graph(Role::Argmap).unwrap();
        let second = ctx.graph(Role::Argmap).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ctx.document(Role::Arganno).unwrap().spans.len(), 1);
        assert!(ctx.graph(Role::Infreco).is_none());
        assert!(matches!(ctx.snapshot(Role::Argmap), Some(ParsedArtifact::Graph(_))));
    }

    #[test]
    fn parse_failures_are_remembered() {
        let cands = vec![ArtifactCandidate::new(0, DataType::Xml, "<proposition>", Metadata::new())];
        let config = ResolvedConfig::new().with_filter(RoleFilter::new(Role::Arganno));
        let parsers = default_parsers();
        let solver = FiniteModelSolver::new();
        let ctx = RequestContext::new(&cands, &config, &parsers, &solver);

        assert!(matches!(ctx.parse_document(Role::Arganno), Some(Err(_))));
        assert!(ctx.document(Role::Arganno).is_none());
        assert!(ctx.snapshot(Role::Arganno).is_none());
    }
}
