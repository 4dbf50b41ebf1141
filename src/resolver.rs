use crate::error::{Diagnostic, ErrorKind};
use crate::model::ResolvedField;
use std::collections::{BTreeSet, HashMap, HashSet};

/// DFS colouring for cycle detection.
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// A `tracking_id` marker on one element, recorded before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingClaim {
    pub base_name: String,
    pub element_id: String,
}

/// At most one element may claim the canonical tracking id. Claims are
/// counted per element before any field is suppressed, so a claimant that
/// fails for another reason, or repeats a base name, still counts. When
/// several claim it, one diagnostic names every claimant and none wins.
pub fn check_tracking_claims(claims: &[TrackingClaim], diagnostics: &mut Vec<Diagnostic>) {
    if claims.len() < 2 {
        return;
    }
    let mut names: Vec<String> = Vec::new();
    for claim in claims {
        if !names.contains(&claim.base_name) {
            names.push(claim.base_name.clone());
        }
    }
    let ids: Vec<&str> = claims.iter().map(|claim| claim.element_id.as_str()).collect();
    diagnostics.push(
        Diagnostic::new(
            ErrorKind::DuplicateTrackingId,
            &names[0],
            format!(
                "{} elements are marked `tracking_id`: {}",
                claims.len(),
                ids.join(", ")
            ),
        )
        .with_involved(names),
    );
}

/// Whole-set checks over the aggregated fields: link carriers, dependency
/// targets and dependency cycles.
///
/// Fields rejected here are removed, and so is every field whose dependency
/// target was removed, so each `dependsOn` in the result names a field that
/// is also in the result.
pub fn resolve_relationships(
    fields: Vec<ResolvedField>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ResolvedField> {
    check_links(&fields, diagnostics);

    let mut rejected: HashSet<usize> = HashSet::new();
    let index: HashMap<&str, usize> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| (field.base_name.as_str(), i))
        .collect();
    let edges = build_edges(&fields, &index, &mut rejected, diagnostics);
    detect_cycles(&fields, &edges, &mut rejected, diagnostics);
    cascade(&fields, &edges, &mut rejected, diagnostics);

    fields
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !rejected.contains(i))
        .map(|(_, field)| field)
        .collect()
}

/// A link is expected on the tracking-id field or a generated field.
/// Anywhere else it is allowed, with a warning.
fn check_links(fields: &[ResolvedField], diagnostics: &mut Vec<Diagnostic>) {
    for field in fields {
        let Some(link) = &field.link else { continue };
        if field.tracking_id || field.constraints.generated {
            continue;
        }
        tracing::warn!(base_name = %field.base_name, %link, "link without a tracking or generated carrier");
        diagnostics.push(
            Diagnostic::new(
                ErrorKind::UnanchoredLink,
                &field.base_name,
                format!(
                    "link `{}` is on a field that is neither the tracking id nor generated",
                    link
                ),
            )
            .with_element(&field.element_id),
        );
    }
}

/// Arena edges: `edges[i] = Some(j)` when field `i` depends on field `j`.
fn build_edges(
    fields: &[ResolvedField],
    index: &HashMap<&str, usize>,
    rejected: &mut HashSet<usize>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Option<usize>> {
    let mut edges = vec![None; fields.len()];
    for (i, field) in fields.iter().enumerate() {
        let Some(dep) = &field.depends_on else { continue };
        if dep.target == field.base_name {
            diagnostics.push(
                Diagnostic::new(
                    ErrorKind::DependencyCycle,
                    &field.base_name,
                    format!("`{}` depends on itself", field.base_name),
                )
                .with_element(&field.element_id)
                .with_involved(vec![field.base_name.clone()]),
            );
            rejected.insert(i);
            continue;
        }
        match index.get(dep.target.as_str()) {
            Some(&target) => edges[i] = Some(target),
            None => {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorKind::MissingDependencyTarget,
                        &field.base_name,
                        format!(
                            "`{}` depends on `{}`, which is not among the resolved fields",
                            field.base_name, dep.target
                        ),
                    )
                    .with_element(&field.element_id),
                );
                rejected.insert(i);
            }
        }
    }
    edges
}

/// Depth-first search with visiting/done marks. Each distinct cycle is
/// reported once, naming every member, and all members are rejected.
fn detect_cycles(
    fields: &[ResolvedField],
    edges: &[Option<usize>],
    rejected: &mut HashSet<usize>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut marks = vec![Mark::Unvisited; fields.len()];
    let mut reported: HashSet<BTreeSet<usize>> = HashSet::new();

    for start in 0..fields.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        let mut stack = Vec::new();
        let mut node = Some(start);
        while let Some(current) = node {
            match marks[current] {
                Mark::Unvisited => {
                    marks[current] = Mark::Visiting;
                    stack.push(current);
                    node = edges[current];
                }
                Mark::Visiting => {
                    let from = stack.iter().position(|&n| n == current).unwrap_or(0);
                    let members = &stack[from..];
                    if reported.insert(members.iter().copied().collect()) {
                        report_cycle(fields, members, diagnostics);
                    }
                    rejected.extend(members.iter().copied());
                    node = None;
                }
                Mark::Done => node = None,
            }
        }
        for n in stack {
            marks[n] = Mark::Done;
        }
    }
}

fn report_cycle(fields: &[ResolvedField], members: &[usize], diagnostics: &mut Vec<Diagnostic>) {
    let names: Vec<String> = members
        .iter()
        .map(|&i| fields[i].base_name.clone())
        .collect();
    let mut path = names.clone();
    path.push(names[0].clone());
    diagnostics.push(
        Diagnostic::new(
            ErrorKind::DependencyCycle,
            &names[0],
            format!("dependency cycle: {}", path.join(" -> ")),
        )
        .with_involved(names),
    );
}

/// Reject, to a fixed point, every field whose dependency target was rejected.
fn cascade(
    fields: &[ResolvedField],
    edges: &[Option<usize>],
    rejected: &mut HashSet<usize>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    loop {
        let newly: Vec<usize> = (0..fields.len())
            .filter(|i| !rejected.contains(i))
            .filter(|&i| edges[i].is_some_and(|target| rejected.contains(&target)))
            .collect();
        if newly.is_empty() {
            return;
        }
        for i in newly {
            let field = &fields[i];
            let target = edges[i].map(|t| fields[t].base_name.as_str()).unwrap_or_default();
            diagnostics.push(
                Diagnostic::new(
                    ErrorKind::MissingDependencyTarget,
                    &field.base_name,
                    format!(
                        "`{}` depends on `{}`, which did not resolve",
                        field.base_name, target
                    ),
                )
                .with_element(&field.element_id),
            );
            rejected.insert(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{resolve_fields, RawElement};

    fn resolve(ids: &[&str]) -> crate::Resolution {
        let elements: Vec<RawElement> = ids.iter().map(|id| RawElement::new(*id, "")).collect();
        resolve_fields(&elements)
    }

    #[test]
    fn two_field_cycle_names_both_members() {
        let resolution = resolve(&["A.text.depends_B", "B.text.depends_A"]);
        assert!(resolution.fields.is_empty());
        assert_eq!(resolution.diagnostics.len(), 1);
        let diag = &resolution.diagnostics[0];
        assert_eq!(diag.kind, ErrorKind::DependencyCycle);
        let mut involved = diag.involved.clone();
        involved.sort();
        assert_eq!(involved, vec!["A", "B"]);
    }

    #[test]
    fn three_field_cycle_spares_unrelated_fields() {
        let resolution = resolve(&[
            "a.text.depends_c",
            "other.text",
            "b.text.depends_a",
            "c.text.depends_b",
        ]);
        assert_eq!(resolution.fields.len(), 1);
        assert_eq!(resolution.fields[0].base_name, "other");
        let cycles: Vec<_> = resolution
            .diagnostics
            .iter()
            .filter(|d| d.kind == ErrorKind::DependencyCycle)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].involved.len(), 3);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let resolution = resolve(&["a.text.depends_a"]);
        assert!(resolution.fields.is_empty());
        assert_eq!(resolution.diagnostics[0].kind, ErrorKind::DependencyCycle);
        assert_eq!(resolution.diagnostics[0].involved, vec!["a"]);
    }

    #[test]
    fn missing_target() {
        let resolution = resolve(&["city.text.depends_Country", "zip.text"]);
        assert_eq!(resolution.fields.len(), 1);
        assert_eq!(
            resolution.diagnostics[0].kind,
            ErrorKind::MissingDependencyTarget
        );
        assert_eq!(resolution.diagnostics[0].base_name, "city");
    }

    #[test]
    fn dependents_of_cycle_members_are_rejected() {
        let resolution = resolve(&["A.text.depends_B", "B.text.depends_A", "C.text.depends_A"]);
        assert!(resolution.fields.is_empty());
        let c = resolution
            .diagnostics
            .iter()
            .find(|d| d.base_name == "C")
            .expect("C is reported");
        assert_eq!(c.kind, ErrorKind::MissingDependencyTarget);
    }

    #[test]
    fn dependency_on_select_field() {
        let resolution = resolve(&[
            "Country.select_USA",
            "Country.select_Canada",
            "City.text.depends_Country",
        ]);
        assert!(resolution.diagnostics.is_empty());
        assert_eq!(
            resolution.field("City").unwrap().depends_on.as_ref().unwrap().target,
            "Country"
        );
    }

    #[test]
    fn duplicate_tracking_id_rejects_every_claimant() {
        let resolution = resolve(&[
            "order.text.tracking_id",
            "name.text",
            "ref.gen.max_8.tracking_id",
        ]);
        assert_eq!(resolution.fields.len(), 1);
        assert_eq!(resolution.fields[0].base_name, "name");
        let diag = &resolution.diagnostics[0];
        assert_eq!(diag.kind, ErrorKind::DuplicateTrackingId);
        assert_eq!(diag.involved, vec!["order", "ref"]);
    }

    #[test]
    fn claimant_failing_validation_still_blocks_the_other() {
        let resolution = resolve(&["a.text.tracking_id", "b.gen.tracking_id", "c.text"]);
        assert_eq!(resolution.fields.len(), 1);
        assert_eq!(resolution.fields[0].base_name, "c");
        assert!(resolution.fields.iter().all(|field| !field.tracking_id));
        let dup = resolution
            .diagnostics
            .iter()
            .find(|d| d.kind == ErrorKind::DuplicateTrackingId)
            .expect("duplicate tracking id is reported");
        assert_eq!(dup.involved, vec!["a", "b"]);
        assert!(resolution
            .diagnostics
            .iter()
            .any(|d| d.kind == ErrorKind::MissingPrerequisite && d.base_name == "b"));
    }

    #[test]
    fn repeated_base_name_claims_are_duplicates() {
        let resolution = resolve(&["t.text.tracking_id", "t.text.tracking_id"]);
        assert!(resolution.fields.is_empty());
        let dup = resolution
            .diagnostics
            .iter()
            .find(|d| d.kind == ErrorKind::DuplicateTrackingId)
            .expect("duplicate tracking id is reported");
        assert_eq!(dup.base_name, "t");
        assert_eq!(dup.involved, vec!["t"]);
    }

    #[test]
    fn single_claim_is_accepted() {
        let resolution = resolve(&["order.text.tracking_id", "name.text"]);
        assert!(resolution.diagnostics.is_empty());
        assert!(resolution.field("order").unwrap().tracking_id);
    }

    #[test]
    fn link_without_carrier_is_only_a_warning() {
        let resolution = resolve(&["site.text.link_https://example.com/a.b"]);
        assert_eq!(resolution.fields.len(), 1);
        assert_eq!(
            resolution.fields[0].link.as_deref(),
            Some("https://example.com/a.b")
        );
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(resolution.diagnostics[0].kind, ErrorKind::UnanchoredLink);
        assert!(!resolution.has_errors());
    }

    #[test]
    fn link_on_tracking_field_is_silent() {
        let resolution = resolve(&["order.text.tracking_id.link_https://example.com/t"]);
        assert!(resolution.diagnostics.is_empty());
        assert!(resolution.fields[0].tracking_id);
    }
}
