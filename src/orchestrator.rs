//! Stylesheet traversal: collects custom properties and rewrites eligible at-rules
//!
//! Two traversal modes are supported:
//!
//! - **Document order** (default): a single depth-first pass. Declarations are
//!   recorded as they are met, so an at-rule only sees properties declared
//!   before it.
//! - **By walk**: every declaration in the tree is recorded first, then a
//!   second pass rewrites the at-rules. Every property is visible to every
//!   at-rule regardless of where it is declared.

use crate::ast::{AtRule, Node, Position, Stylesheet};
use crate::at_rules::AtRuleFilter;
use crate::overrides::VariableOverrides;
use crate::property_table::PropertyTable;
use crate::resolver::ReferenceResolver;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    #[default]
    DocumentOrder,
    DeclarationByWalk,
}

/// Processing state of one stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Resolving,
    Done,
}

/// A reference left untouched because no value was known
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedReference {
    pub name: String,
    pub at_rule: String,
    pub position: Position,
}

/// What happened while processing one stylesheet
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessReport {
    /// Distinct custom properties collected
    pub custom_properties: usize,
    /// Eligible at-rules visited
    pub at_rules_visited: usize,
    /// Eligible at-rules whose parameters changed
    pub at_rules_rewritten: usize,
    pub substitutions: usize,
    pub cycles_broken: usize,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Everything that stays fixed across stylesheets
#[derive(Debug, Clone, Default)]
pub struct ResolutionConfig {
    pub filter: AtRuleFilter,
    pub overrides: VariableOverrides,
    pub mode: TraversalMode,
}

pub struct Orchestrator<'a> {
    config: &'a ResolutionConfig,
    resolver: ReferenceResolver,
    table: PropertyTable,
    report: ProcessReport,
    phase: Phase,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a ResolutionConfig) -> Self {
        Self {
            config,
            resolver: ReferenceResolver::new(),
            table: PropertyTable::new(),
            report: ProcessReport::default(),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Custom properties collected by the last run
    pub fn table(&self) -> &PropertyTable {
        &self.table
    }

    /// Rewrite eligible at-rule parameters of `sheet` in place
    pub fn run(&mut self, sheet: &mut Stylesheet) -> ProcessReport {
        self.table = PropertyTable::new();
        self.report = ProcessReport::default();

        match self.config.mode {
            TraversalMode::DocumentOrder => {
                self.enter(Phase::Resolving);
                self.visit(&mut sheet.nodes, true, true);
            }
            TraversalMode::DeclarationByWalk => {
                self.enter(Phase::Scanning);
                self.visit(&mut sheet.nodes, true, false);
                log::debug!("Collected {} custom properties before resolving", self.table.len());
                log::trace!("Custom properties: {}", self.table.names().join(", "));
                self.enter(Phase::Resolving);
                self.visit(&mut sheet.nodes, false, true);
            }
        }

        self.enter(Phase::Done);
        self.report.custom_properties = self.table.len();
        std::mem::take(&mut self.report)
    }

    /// Resolve a stylesheet only for its report; the rewritten tree is dropped
    pub fn inspect(&mut self, mut sheet: Stylesheet) -> ProcessReport {
        self.run(&mut sheet)
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn visit(&mut self, nodes: &mut [Node], collect: bool, resolve: bool) {
        for node in nodes.iter_mut() {
            match node {
                Node::Declaration(decl) => {
                    if collect {
                        self.table.record(decl);
                    }
                }
                Node::AtRule(at_rule) => {
                    if resolve {
                        self.resolve_at_rule(at_rule);
                    }
                    if let Some(children) = at_rule.nodes.as_mut() {
                        self.visit(children, collect, resolve);
                    }
                }
                Node::Rule(rule) => self.visit(&mut rule.nodes, collect, resolve),
                Node::Comment(_) => {}
            }
        }
    }

    fn resolve_at_rule(&mut self, at_rule: &mut AtRule) {
        if !self.config.filter.is_eligible(&at_rule.name) {
            log::trace!("{}: skipping @{}", at_rule.position, at_rule.name);
            return;
        }

        self.report.at_rules_visited += 1;
        if !self.resolver.has_references(&at_rule.params) {
            return;
        }

        let outcome = self.resolver.resolve(&at_rule.params, &self.table, &self.config.overrides);

        for name in outcome.unresolved.iter() {
            self.report.unresolved.push(UnresolvedReference {
                name: name.clone(),
                at_rule: at_rule.name.clone(),
                position: at_rule.position,
            });
        }
        self.report.substitutions += outcome.substitutions;
        self.report.cycles_broken += outcome.cycles_broken;

        if outcome.changed() {
            log::debug!(
                "{}: @{} '{}' -> '{}'",
                at_rule.position, at_rule.name, at_rule.params, outcome.value
            );
            at_rule.params = outcome.value;
            self.report.at_rules_rewritten += 1;
        }
    }
}
