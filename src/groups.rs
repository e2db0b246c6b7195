// src/groups.rs

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::{errors::CatalogError, toggles::OptionValue};

/// Current option values by key.
pub type ValueMap = IndexMap<String, OptionValue>;

/// Whether each gated option should currently be shown.
pub type VisibilityMap = IndexMap<String, bool>;

/// Decides whether a parent's value turns its group on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivePredicate {
    /// Boolean parents, or numeric ones where zero means off.
    Truthy,
    /// Enumerated parents: active when the encoded value is one of these.
    OneOf(Vec<String>),
}

impl ActivePredicate {
    pub fn is_active(&self, value: &OptionValue) -> bool {
        match self {
            ActivePredicate::Truthy => value.is_truthy(),
            ActivePredicate::OneOf(active) => {
                let encoded = value.encode();
                active.iter().any(|candidate| *candidate == encoded)
            }
        }
    }
}

/// A named set of options shown only while their parent is active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyGroup {
    pub name: String,
    pub parent: String,
    pub members: IndexSet<String>,
    pub predicate: ActivePredicate,
}

impl DependencyGroup {
    /// A group gated by a truthy parent. The group takes the parent's name.
    pub fn new<I, K>(parent: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let parent = parent.into();
        Self {
            name: parent.clone(),
            parent,
            members: members.into_iter().map(Into::into).collect(),
            predicate: ActivePredicate::Truthy,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Gate the group on the parent holding one of `values`.
    pub fn active_when<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.predicate = ActivePredicate::OneOf(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Validated set of dependency groups. Nesting is allowed, cycles are not.
#[derive(Clone, Debug, Default)]
pub struct DependencyGroups {
    groups: IndexMap<String, DependencyGroup>,
    /// For each member key, the indices of the groups gating it.
    gated_by: HashMap<String, Vec<usize>>,
}

impl DependencyGroups {
    /// Validates `groups` against the set of registered keys.
    pub fn new(
        groups: Vec<DependencyGroup>,
        is_known: impl Fn(&str) -> bool,
    ) -> Result<Self, CatalogError> {
        let mut by_name = IndexMap::with_capacity(groups.len());
        for group in groups {
            if !is_known(&group.parent) {
                return Err(CatalogError::UnknownKey {
                    group: group.name.clone(),
                    key: group.parent.clone(),
                });
            }
            if let Some(member) = group.members.iter().find(|m| !is_known(m)) {
                return Err(CatalogError::UnknownKey {
                    group: group.name.clone(),
                    key: member.clone(),
                });
            }
            if group.members.contains(&group.parent) {
                return Err(CatalogError::SelfMembership {
                    group: group.name.clone(),
                    key: group.parent.clone(),
                });
            }
            if by_name.contains_key(&group.name) {
                return Err(CatalogError::DuplicateGroup(group.name));
            }
            by_name.insert(group.name.clone(), group);
        }

        let mut gated_by: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, group) in by_name.values().enumerate() {
            for member in &group.members {
                gated_by.entry(member.clone()).or_default().push(index);
            }
        }

        let groups = Self {
            groups: by_name,
            gated_by,
        };
        groups.check_acyclic()?;
        Ok(groups)
    }

    pub fn get(&self, name: &str) -> Option<&DependencyGroup> {
        self.groups.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups whose parent is `key`.
    pub fn with_parent<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a DependencyGroup> {
        self.groups.values().filter(move |group| group.parent == key)
    }

    /// The group's own keys plus the members of every group nested below it.
    pub fn closure(&self, name: &str) -> Option<IndexSet<String>> {
        let root = self.groups.get(name)?;
        let mut keys = IndexSet::new();
        keys.insert(root.parent.clone());
        let mut pending: Vec<&DependencyGroup> = vec![root];
        while let Some(group) = pending.pop() {
            for member in &group.members {
                if keys.insert(member.clone()) {
                    pending.extend(self.with_parent(member));
                }
            }
        }
        Some(keys)
    }

    /// Visibility of every member of group `name`.
    pub fn resolve(&self, name: &str, values: &ValueMap) -> Option<VisibilityMap> {
        let group = self.groups.get(name)?;
        let mut memo = HashMap::new();
        Some(
            group
                .members
                .iter()
                .map(|member| (member.clone(), self.is_visible(member, values, &mut memo)))
                .collect(),
        )
    }

    /// Visibility of every gated key across all groups.
    pub fn resolve_all(&self, values: &ValueMap) -> VisibilityMap {
        let mut memo = HashMap::new();
        let mut visibility = VisibilityMap::new();
        for group in self.groups.values() {
            for member in &group.members {
                if !visibility.contains_key(member) {
                    let visible = self.is_visible(member, values, &mut memo);
                    visibility.insert(member.clone(), visible);
                }
            }
        }
        trace!("Resolved visibility for {} keys.", visibility.len());
        visibility
    }

    /// A key is shown when every group gating it has an active, visible parent.
    /// Keys outside all groups are always shown.
    fn is_visible(&self, key: &str, values: &ValueMap, memo: &mut HashMap<String, bool>) -> bool {
        if let Some(&visible) = memo.get(key) {
            return visible;
        }
        let visible = match self.gated_by.get(key) {
            None => true,
            Some(indices) => indices.iter().all(|&index| {
                let group = &self.groups[index];
                let active = values
                    .get(&group.parent)
                    .is_some_and(|value| group.predicate.is_active(value));
                active && self.is_visible(&group.parent, values, memo)
            }),
        };
        memo.insert(key.to_string(), visible);
        visible
    }

    fn check_acyclic(&self) -> Result<(), CatalogError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        fn visit<'a>(
            groups: &'a DependencyGroups,
            key: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<(), CatalogError> {
            match marks.get(key) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => {
                    let start = path.iter().position(|k| *k == key).unwrap_or(0);
                    let mut cycle: Vec<&str> = path[start..].to_vec();
                    cycle.push(key);
                    return Err(CatalogError::Cycle(cycle.join(" -> ")));
                }
                None => {}
            }
            marks.insert(key, Mark::InProgress);
            path.push(key);
            for group in groups.with_parent(key) {
                for member in &group.members {
                    visit(groups, member, marks, path)?;
                }
            }
            path.pop();
            marks.insert(key, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for group in self.groups.values() {
            let mut path = Vec::new();
            visit(self, &group.parent, &mut marks, &mut path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(entries: &[(&str, OptionValue)]) -> ValueMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn known(keys: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |key| keys.iter().any(|known| *known == key)
    }

    const KEYS: &[&str] = &["P", "A1", "A2", "M", "B1", "B2", "Mode", "E1"];

    #[test]
    fn test_truthy_parent_gates_members() {
        let groups = DependencyGroups::new(
            vec![DependencyGroup::new("P", ["A1", "A2"])],
            known(KEYS),
        )
        .unwrap();

        let off = groups
            .resolve("P", &values(&[("P", OptionValue::Bool(false))]))
            .unwrap();
        assert_eq!(off.values().copied().collect::<Vec<_>>(), vec![false, false]);

        let on = groups
            .resolve("P", &values(&[("P", OptionValue::Bool(true))]))
            .unwrap();
        assert_eq!(on.values().copied().collect::<Vec<_>>(), vec![true, true]);
    }

    #[test]
    fn test_enumerated_parent() {
        let groups = DependencyGroups::new(
            vec![DependencyGroup::new("Mode", ["E1"]).active_when(["2", "3"])],
            known(KEYS),
        )
        .unwrap();

        for (mode, expected) in [("0", false), ("1", false), ("2", true), ("3", true)] {
            let visibility = groups.resolve_all(&values(&[("Mode", OptionValue::from(mode))]));
            assert_eq!(visibility["E1"], expected, "mode {mode}");
        }
    }

    #[test]
    fn test_hidden_parent_hides_nested_group() {
        let groups = DependencyGroups::new(
            vec![
                DependencyGroup::new("P", ["A1", "M"]),
                DependencyGroup::new("M", ["B1", "B2"]),
            ],
            known(KEYS),
        )
        .unwrap();

        // M itself is on, but P hides it, so its dependents are hidden too.
        let visibility = groups.resolve_all(&values(&[
            ("P", OptionValue::Bool(false)),
            ("M", OptionValue::Bool(true)),
        ]));
        assert!(!visibility["M"]);
        assert!(!visibility["B1"]);
        assert!(!visibility["B2"]);

        let visibility = groups.resolve_all(&values(&[
            ("P", OptionValue::Bool(true)),
            ("M", OptionValue::Bool(true)),
        ]));
        assert!(visibility["M"]);
        assert!(visibility["B1"]);

        let nested = groups
            .resolve(
                "M",
                &values(&[("P", OptionValue::Bool(true)), ("M", OptionValue::Bool(false))]),
            )
            .unwrap();
        assert_eq!(nested.values().copied().collect::<Vec<_>>(), vec![false, false]);
    }

    #[test]
    fn test_missing_parent_value_is_inactive() {
        let groups =
            DependencyGroups::new(vec![DependencyGroup::new("P", ["A1"])], known(KEYS)).unwrap();
        assert!(!groups.resolve_all(&ValueMap::new())["A1"]);
    }

    #[test]
    fn test_rejects_self_membership() {
        let err = DependencyGroups::new(vec![DependencyGroup::new("P", ["A1", "P"])], known(KEYS))
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::SelfMembership {
                group: "P".to_string(),
                key: "P".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = DependencyGroups::new(vec![DependencyGroup::new("P", ["Nope"])], known(KEYS))
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownKey { key, .. } if key == "Nope"));

        let err = DependencyGroups::new(vec![DependencyGroup::new("Ghost", ["A1"])], known(KEYS))
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownKey { key, .. } if key == "Ghost"));
    }

    #[test]
    fn test_rejects_cycles() {
        let err = DependencyGroups::new(
            vec![
                DependencyGroup::new("P", ["M"]),
                DependencyGroup::new("M", ["B1"]),
                DependencyGroup::new("B1", ["P"]),
            ],
            known(KEYS),
        )
        .unwrap_err();
        match err {
            CatalogError::Cycle(path) => assert_eq!(path, "P -> M -> B1 -> P"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_group_names() {
        let err = DependencyGroups::new(
            vec![
                DependencyGroup::new("P", ["A1"]),
                DependencyGroup::new("P", ["A2"]),
            ],
            known(KEYS),
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateGroup("P".to_string()));
    }

    #[test]
    fn test_closure_includes_nested_members() {
        let groups = DependencyGroups::new(
            vec![
                DependencyGroup::new("P", ["A1", "M"]),
                DependencyGroup::new("M", ["B1"]),
                DependencyGroup::new("Mode", ["E1"]).named("Unrelated"),
            ],
            known(KEYS),
        )
        .unwrap();
        let keys: Vec<String> = groups.closure("P").unwrap().into_iter().collect();
        assert_eq!(keys, vec!["P", "A1", "M", "B1"]);
        assert!(groups.closure("Missing").is_none());
    }

    #[test]
    fn test_member_gated_by_two_groups_needs_both() {
        let groups = DependencyGroups::new(
            vec![
                DependencyGroup::new("P", ["A1"]),
                DependencyGroup::new("M", ["A1"]),
            ],
            known(KEYS),
        )
        .unwrap();
        let visibility = groups.resolve_all(&values(&[
            ("P", OptionValue::Bool(true)),
            ("M", OptionValue::Bool(false)),
        ]));
        assert!(!visibility["A1"]);
    }
}
