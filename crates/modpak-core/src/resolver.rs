//! Dependency resolution: load-order computation over the installed set.
//!
//! The resolver is a pure function of the snapshot it is given: the
//! caller provides every installed package's metadata, and two calls
//! with the same input produce identical output. Nothing is read from
//! ambient state, so tests construct arbitrary installed sets without
//! filesystem fixtures.
//!
//! Failures are aggregated: every missing dependency and version
//! mismatch across the whole set is reported in one pass, so a user sees
//! the complete list of problems at once rather than fixing them one
//! resolve at a time.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use modpak_schema::{LoadPhase, ModId, PackageMetadata, VersionConstraint};
use semver::Version;
use tracing::debug;

/// A successfully computed load order plus advisory warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Mod identifiers in load order: every required dependency precedes
    /// its dependent, grouped by phase and then by descending priority.
    pub load_order: Vec<ModId>,

    /// Declared conflicts among installed mods. Never block resolution;
    /// the host decides whether to proceed.
    pub warnings: Vec<ConflictWarning>,
}

/// A declared conflict between two installed mods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictWarning {
    /// The mod declaring the conflict.
    pub mod_a: ModId,
    /// The mod it conflicts with.
    pub mod_b: ModId,
    /// The declared reason.
    pub reason: String,
}

/// One problem found during resolution.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionProblem {
    /// Two installed packages declare the same identifier. The intended
    /// precedence is not defined, so this is an explicit error rather
    /// than a silent preference.
    #[error("Duplicate mod identifier '{mod_id}' in the installed set")]
    DuplicateIdentifier {
        /// The repeated identifier.
        mod_id: ModId,
    },

    /// A required dependency is not installed.
    #[error("'{dependent}' requires '{mod_id}' ({constraint}) which is not installed")]
    MissingDependency {
        /// The mod declaring the dependency.
        dependent: ModId,
        /// The missing mod.
        mod_id: ModId,
        /// The declared constraint.
        constraint: VersionConstraint,
    },

    /// A dependency is installed at an incompatible version.
    #[error("'{dependent}' requires '{mod_id}' {constraint} but {installed} is installed")]
    VersionMismatch {
        /// The mod declaring the dependency.
        dependent: ModId,
        /// The depended-on mod.
        mod_id: ModId,
        /// The version actually installed.
        installed: Version,
        /// The declared constraint.
        constraint: VersionConstraint,
    },

    /// The dependency graph contains a cycle.
    #[error("Circular dependency: {}", cycle.iter().map(ModId::as_str).collect::<Vec<_>>().join(" -> "))]
    CircularDependency {
        /// Every mod on the cycle, in traversal order.
        cycle: Vec<ModId>,
    },
}

/// Resolution failure carrying every problem found, never just the first.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// All problems, in discovery order.
    pub problems: Vec<ResolutionProblem>,
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Resolution failed with {} problem(s):", self.problems.len())?;
        for p in &self.problems {
            writeln!(f, "  - {p}")?;
        }
        Ok(())
    }
}

/// Compute a deterministic load order for the installed set.
///
/// Either a complete, valid order is returned or none at all; a failure
/// never partially applies. Conflicts are advisory and ride along in
/// [`Resolution::warnings`].
///
/// # Errors
///
/// Returns a [`ResolutionFailure`] listing every duplicate identifier,
/// missing dependency, and version mismatch found, or the dependency
/// cycles if the graph is not acyclic.
pub fn resolve(installed: &[PackageMetadata]) -> Result<Resolution, ResolutionFailure> {
    let mut problems = Vec::new();

    // Index by identifier; duplicates are an explicit error.
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(installed.len());
    let mut duplicates: HashSet<&str> = HashSet::new();
    for (i, meta) in installed.iter().enumerate() {
        if index.contains_key(meta.mod_id.as_str()) {
            if duplicates.insert(meta.mod_id.as_str()) {
                problems.push(ResolutionProblem::DuplicateIdentifier {
                    mod_id: meta.mod_id.clone(),
                });
            }
        } else {
            index.insert(meta.mod_id.as_str(), i);
        }
    }

    // Dependency edges point dependency -> dependent. Required edges
    // must be present and compatible; optional edges only order (and
    // version-check) dependencies that happen to be installed.
    let n = installed.len();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];

    for (i, meta) in installed.iter().enumerate() {
        if index.get(meta.mod_id.as_str()) != Some(&i) {
            continue; // duplicate occurrence, already reported
        }
        for dep in &meta.dependencies {
            match index.get(dep.mod_id.as_str()) {
                None => {
                    if dep.required {
                        problems.push(ResolutionProblem::MissingDependency {
                            dependent: meta.mod_id.clone(),
                            mod_id: dep.mod_id.clone(),
                            constraint: dep.version_constraint.clone(),
                        });
                    }
                }
                Some(&j) => {
                    if !dep.version_constraint.matches(&installed[j].version) {
                        problems.push(ResolutionProblem::VersionMismatch {
                            dependent: meta.mod_id.clone(),
                            mod_id: dep.mod_id.clone(),
                            installed: installed[j].version.clone(),
                            constraint: dep.version_constraint.clone(),
                        });
                    }
                    edges[j].push(i);
                    in_degree[i] += 1;
                }
            }
        }
    }

    if !problems.is_empty() {
        return Err(ResolutionFailure { problems });
    }

    // Cycle detection: depth-first with an explicit recursion stack so
    // every reported cycle names its mods in traversal order.
    find_cycles(installed, &edges, &mut problems);
    if !problems.is_empty() {
        return Err(ResolutionFailure { problems });
    }

    // Kahn's algorithm, always selecting the ready node with the
    // smallest (phase, descending priority, discovery index) key. Ties
    // preserve input order, so the result is deterministic and
    // independent of hash iteration order.
    let sort_key = |i: usize| {
        let hint = installed[i].load_order;
        (hint.phase, Reverse(hint.priority), i)
    };

    let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut load_order = Vec::with_capacity(n);
    let mut in_degree = in_degree;

    while !ready.is_empty() {
        let pos = ready
            .iter()
            .enumerate()
            .min_by_key(|&(_, &i)| sort_key(i))
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        let node = ready.swap_remove(pos);
        load_order.push(installed[node].mod_id.clone());

        for &next in &edges[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(next);
            }
        }
    }

    debug_assert_eq!(load_order.len(), n, "acyclic graph sorts completely");

    // Advisory conflicts among installed mods.
    let mut warnings = Vec::new();
    for meta in installed {
        for conflict in &meta.conflicts {
            if index.contains_key(conflict.mod_id.as_str()) && conflict.mod_id != meta.mod_id {
                warnings.push(ConflictWarning {
                    mod_a: meta.mod_id.clone(),
                    mod_b: conflict.mod_id.clone(),
                    reason: conflict.reason.clone(),
                });
            }
        }
    }

    debug!(mods = n, warnings = warnings.len(), "resolved load order");
    Ok(Resolution {
        load_order,
        warnings,
    })
}

/// Group an already-resolved order by load phase, preserving order
/// within each phase. Convenience for hosts that extract phase by phase.
pub fn group_by_phase<'a>(
    resolution: &'a Resolution,
    installed: &'a [PackageMetadata],
) -> Vec<(LoadPhase, Vec<&'a ModId>)> {
    let phase_of: HashMap<&str, LoadPhase> = installed
        .iter()
        .map(|m| (m.mod_id.as_str(), m.load_order.phase))
        .collect();

    let mut groups: Vec<(LoadPhase, Vec<&ModId>)> = Vec::new();
    for id in &resolution.load_order {
        let phase = phase_of.get(id.as_str()).copied().unwrap_or_default();
        match groups.last_mut() {
            Some((last, ids)) if *last == phase => ids.push(id),
            _ => groups.push((phase, vec![id])),
        }
    }
    groups
}

fn find_cycles(
    installed: &[PackageMetadata],
    edges: &[Vec<usize>],
    problems: &mut Vec<ResolutionProblem>,
) {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        InStack,
        Done,
    }

    fn visit(
        node: usize,
        installed: &[PackageMetadata],
        edges: &[Vec<usize>],
        state: &mut [State],
        stack: &mut Vec<usize>,
        problems: &mut Vec<ResolutionProblem>,
    ) {
        state[node] = State::InStack;
        stack.push(node);

        for &next in &edges[node] {
            match state[next] {
                State::Unvisited => visit(next, installed, edges, state, stack, problems),
                State::InStack => {
                    let start = stack
                        .iter()
                        .position(|&x| x == next)
                        .unwrap_or(0);
                    let cycle = stack[start..]
                        .iter()
                        .map(|&x| installed[x].mod_id.clone())
                        .collect();
                    problems.push(ResolutionProblem::CircularDependency { cycle });
                }
                State::Done => {}
            }
        }

        stack.pop();
        state[node] = State::Done;
    }

    let mut state = vec![State::Unvisited; installed.len()];
    let mut stack = Vec::new();
    for node in 0..installed.len() {
        if state[node] == State::Unvisited {
            visit(node, installed, edges, &mut state, &mut stack, problems);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modpak_schema::{Conflict, Dependency, LoadOrderHint};

    fn meta(id: &str, version: &str) -> PackageMetadata {
        PackageMetadata::from_slice(
            format!(r#"{{"mod_id": "{id}", "version": "{version}"}}"#).as_bytes(),
        )
        .unwrap()
    }

    fn with_deps(mut m: PackageMetadata, deps: &[(&str, &str, bool)]) -> PackageMetadata {
        m.dependencies = deps
            .iter()
            .map(|(id, constraint, required)| Dependency {
                mod_id: ModId::new(*id).unwrap(),
                version_constraint: VersionConstraint::parse(constraint).unwrap(),
                required: *required,
            })
            .collect();
        m
    }

    fn with_order(mut m: PackageMetadata, phase: LoadPhase, priority: i32) -> PackageMetadata {
        m.load_order = LoadOrderHint { phase, priority };
        m
    }

    fn order_of(installed: &[PackageMetadata]) -> Vec<String> {
        resolve(installed)
            .unwrap()
            .load_order
            .iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_simple_resolution() {
        let installed = vec![
            with_deps(meta("a", "1.0.0"), &[("b", ">=1.0.0", true)]),
            meta("b", "1.0.0"),
        ];
        assert_eq!(order_of(&installed), vec!["b", "a"]);
    }

    #[test]
    fn test_diamond_resolution() {
        let installed = vec![
            with_deps(
                meta("a", "1.0.0"),
                &[("b", ">=1.0.0", true), ("c", ">=1.0.0", true)],
            ),
            with_deps(meta("b", "1.0.0"), &[("d", ">=1.0.0", true)]),
            with_deps(meta("c", "1.0.0"), &[("d", ">=1.0.0", true)]),
            meta("d", "1.0.0"),
        ];
        let order = order_of(&installed);
        let pos = |x: &str| order.iter().position(|o| o == x).unwrap();
        assert!(pos("d") < pos("b"));
        assert!(pos("d") < pos("c"));
        assert!(pos("b") < pos("a"));
        assert!(pos("c") < pos("a"));
    }

    #[test]
    fn test_missing_and_mismatch_reported_together() {
        let installed = vec![
            with_deps(
                meta("a", "1.0.0"),
                &[("gone", ">=1.0.0", true), ("b", "^2.0.0", true)],
            ),
            with_deps(meta("b", "1.5.0"), &[("also-gone", "=1.0.0", true)]),
        ];
        let failure = resolve(&installed).unwrap_err();
        assert_eq!(failure.problems.len(), 3);
        assert!(failure.problems.iter().any(|p| matches!(
            p,
            ResolutionProblem::MissingDependency { mod_id, .. } if *mod_id == "gone"
        )));
        assert!(failure.problems.iter().any(|p| matches!(
            p,
            ResolutionProblem::MissingDependency { mod_id, .. } if *mod_id == "also-gone"
        )));
        assert!(failure.problems.iter().any(|p| matches!(
            p,
            ResolutionProblem::VersionMismatch { mod_id, .. } if *mod_id == "b"
        )));
    }

    #[test]
    fn test_optional_dependency_absent_is_fine() {
        let installed = vec![with_deps(meta("a", "1.0.0"), &[("extra", ">=1.0.0", false)])];
        assert_eq!(order_of(&installed), vec!["a"]);
    }

    #[test]
    fn test_optional_dependency_present_orders_and_checks() {
        let installed = vec![
            with_deps(meta("a", "1.0.0"), &[("extra", ">=2.0.0", false)]),
            meta("extra", "2.1.0"),
        ];
        assert_eq!(order_of(&installed), vec!["extra", "a"]);

        let installed = vec![
            with_deps(meta("a", "1.0.0"), &[("extra", ">=2.0.0", false)]),
            meta("extra", "1.0.0"),
        ];
        assert!(resolve(&installed).is_err());
    }

    #[test]
    fn test_two_cycle_names_both_mods() {
        let installed = vec![
            with_deps(meta("a", "1.0.0"), &[("b", ">=1.0.0", true)]),
            with_deps(meta("b", "1.0.0"), &[("a", ">=1.0.0", true)]),
        ];
        let failure = resolve(&installed).unwrap_err();
        let ResolutionProblem::CircularDependency { cycle } = &failure.problems[0] else {
            panic!("expected a cycle, got {:?}", failure.problems);
        };
        let names: Vec<&str> = cycle.iter().map(ModId::as_str).collect();
        assert!(names.contains(&"a") && names.contains(&"b"));
        assert_eq!(cycle.len(), 2);
    }

    #[test]
    fn test_three_cycle_names_all_mods() {
        let installed = vec![
            with_deps(meta("a", "1.0.0"), &[("b", ">=1.0.0", true)]),
            with_deps(meta("b", "1.0.0"), &[("c", ">=1.0.0", true)]),
            with_deps(meta("c", "1.0.0"), &[("a", ">=1.0.0", true)]),
        ];
        let failure = resolve(&installed).unwrap_err();
        let ResolutionProblem::CircularDependency { cycle } = &failure.problems[0] else {
            panic!("expected a cycle");
        };
        assert_eq!(cycle.len(), 3);
        for id in ["a", "b", "c"] {
            assert!(cycle.iter().any(|c| *c == id), "cycle should name {id}");
        }
    }

    #[test]
    fn test_phase_groups_before_priority() {
        // B (after_base, prio 1) always precedes A (after_campaign,
        // prio 10) regardless of input order.
        let a = with_order(meta("a", "1.0.0"), LoadPhase::AfterCampaign, 10);
        let b = with_order(meta("b", "1.0.0"), LoadPhase::AfterBase, 1);

        assert_eq!(order_of(&[a.clone(), b.clone()]), vec!["b", "a"]);
        assert_eq!(order_of(&[b, a]), vec!["b", "a"]);
    }

    #[test]
    fn test_priority_descending_within_phase() {
        let low = with_order(meta("low", "1.0.0"), LoadPhase::Base, 1);
        let high = with_order(meta("high", "1.0.0"), LoadPhase::Base, 50);
        assert_eq!(order_of(&[low, high]), vec!["high", "low"]);
    }

    #[test]
    fn test_equal_priority_preserves_input_order() {
        let installed = vec![meta("first", "1.0.0"), meta("second", "1.0.0")];
        assert_eq!(order_of(&installed), vec!["first", "second"]);
    }

    #[test]
    fn test_dependency_edge_beats_phase() {
        // early-phase mod depends on a late-phase mod; the edge wins.
        let early = with_order(
            with_deps(meta("early", "1.0.0"), &[("late", ">=1.0.0", true)]),
            LoadPhase::Base,
            0,
        );
        let late = with_order(meta("late", "1.0.0"), LoadPhase::AfterMap, 0);
        assert_eq!(order_of(&[early, late]), vec!["late", "early"]);
    }

    #[test]
    fn test_deterministic() {
        let installed = vec![
            with_order(meta("x", "1.0.0"), LoadPhase::Campaign, 3),
            with_deps(meta("y", "1.0.0"), &[("x", "^1.0.0", true)]),
            with_order(meta("z", "1.0.0"), LoadPhase::Base, -5),
        ];
        let first = resolve(&installed).unwrap();
        let second = resolve(&installed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_identifier_is_error() {
        let installed = vec![meta("same", "1.0.0"), meta("same", "2.0.0")];
        let failure = resolve(&installed).unwrap_err();
        assert_eq!(failure.problems.len(), 1);
        assert!(matches!(
            &failure.problems[0],
            ResolutionProblem::DuplicateIdentifier { mod_id } if *mod_id == "same"
        ));
    }

    #[test]
    fn test_conflicts_warn_but_do_not_block() {
        let mut a = meta("a", "1.0.0");
        a.conflicts = vec![Conflict {
            mod_id: ModId::new("b").unwrap(),
            reason: "patches the same entities".to_string(),
        }];
        let installed = vec![a, meta("b", "1.0.0")];

        let resolution = resolve(&installed).unwrap();
        assert_eq!(resolution.load_order.len(), 2);
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].mod_a, "a");
        assert_eq!(resolution.warnings[0].mod_b, "b");
    }

    #[test]
    fn test_conflict_with_absent_mod_is_silent() {
        let mut a = meta("a", "1.0.0");
        a.conflicts = vec![Conflict {
            mod_id: ModId::new("not-installed").unwrap(),
            reason: String::new(),
        }];
        let resolution = resolve(&[a]).unwrap();
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_group_by_phase() {
        let installed = vec![
            with_order(meta("b1", "1.0.0"), LoadPhase::Base, 0),
            with_order(meta("b2", "1.0.0"), LoadPhase::Base, 0),
            with_order(meta("m1", "1.0.0"), LoadPhase::Map, 0),
        ];
        let resolution = resolve(&installed).unwrap();
        let groups = group_by_phase(&resolution, &installed);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, LoadPhase::Base);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, LoadPhase::Map);
    }
}
