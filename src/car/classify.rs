use crate::scene::{NodeId, SceneGraph};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartRole {
    WheelFrontLeft,
    WheelFrontRight,
    WheelRearLeft,
    WheelRearRight,
    FrontLightHousing,
    RearLightHousing,
    Sunroof,
    WheelRing,
    Body,
    Glass,
    Generic,
}

/// Matches recorded alongside a node's primary role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuxiliaryPart {
    Tire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Name equals the fragment.
    Exact,
    /// Name equals the fragment or its lowercase form contains it.
    ExactOrContains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    Role(PartRole),
    Auxiliary(AuxiliaryPart),
}

#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub fragment: &'static str,
    pub mode: MatchMode,
    pub exclusions: &'static [&'static str],
    pub target: RuleTarget,
}

impl ClassificationRule {
    pub fn matches(&self, name: &str) -> bool {
        if self.exclusions.contains(&name) {
            return false;
        }
        if name == self.fragment {
            return true;
        }
        match self.mode {
            MatchMode::Exact => false,
            MatchMode::ExactOrContains => name.to_lowercase().contains(&self.fragment.to_lowercase()),
        }
    }
}

const fn exact(fragment: &'static str, role: PartRole) -> ClassificationRule {
    ClassificationRule {
        fragment,
        mode: MatchMode::Exact,
        exclusions: &[],
        target: RuleTarget::Role(role),
    }
}

const fn contains(fragment: &'static str, role: PartRole) -> ClassificationRule {
    ClassificationRule {
        fragment,
        mode: MatchMode::ExactOrContains,
        exclusions: &[],
        target: RuleTarget::Role(role),
    }
}

/// Evaluated in order; the first role rule a node matches is its primary role.
pub const CLASSIFICATION_RULES: [ClassificationRule; 11] = [
    exact("WheelBR", PartRole::WheelRearRight),
    exact("WheelBL", PartRole::WheelRearLeft),
    exact("WheelFR", PartRole::WheelFrontRight),
    exact("WheelFL", PartRole::WheelFrontLeft),
    contains("Cheagh_jelo", PartRole::FrontLightHousing),
    ClassificationRule {
        fragment: "lastik",
        mode: MatchMode::ExactOrContains,
        exclusions: &["lastik_saghf"],
        target: RuleTarget::Auxiliary(AuxiliaryPart::Tire),
    },
    contains("shishe_ghrmez", PartRole::RearLightHousing),
    contains("saghf", PartRole::Sunroof),
    exact("ring", PartRole::WheelRing),
    contains("shishe", PartRole::Glass),
    contains("badane", PartRole::Body),
];

/// Result of classifying one loaded asset. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct CarParts {
    roles: BTreeMap<PartRole, Vec<NodeId>>,
    auxiliary: BTreeMap<AuxiliaryPart, Vec<NodeId>>,
    primary: BTreeMap<NodeId, PartRole>,
}

impl CarParts {
    pub fn classify(graph: &SceneGraph) -> Self {
        Self::classify_with(graph, &CLASSIFICATION_RULES)
    }

    pub fn classify_with(graph: &SceneGraph, rules: &[ClassificationRule]) -> Self {
        let order = graph.traverse(graph.root());
        let mut parts = CarParts::default();

        for rule in rules {
            let matched: Vec<NodeId> = order
                .iter()
                .copied()
                .filter(|id| rule.matches(&graph.node(*id).name))
                .collect();
            if matched.is_empty() {
                log::warn!("No scene nodes match part rule '{}'", rule.fragment);
            }
            match rule.target {
                RuleTarget::Role(role) => {
                    for id in &matched {
                        parts.primary.entry(*id).or_insert(role);
                    }
                    parts.roles.entry(role).or_default().extend(matched);
                }
                RuleTarget::Auxiliary(aux) => {
                    parts.auxiliary.entry(aux).or_default().extend(matched);
                }
            }
        }

        let generic: Vec<NodeId> = order
            .iter()
            .copied()
            .filter(|id| graph.node(*id).is_mesh && !parts.primary.contains_key(id))
            .collect();
        for id in &generic {
            parts.primary.insert(*id, PartRole::Generic);
        }
        parts.roles.insert(PartRole::Generic, generic);

        log::info!(
            "Classified {} of {} nodes into {} roles",
            parts.primary.len(),
            graph.node_count(),
            parts.roles.values().filter(|nodes| !nodes.is_empty()).count()
        );
        parts
    }

    pub fn nodes(&self, role: PartRole) -> &[NodeId] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn auxiliary(&self, part: AuxiliaryPart) -> &[NodeId] {
        self.auxiliary.get(&part).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn primary_role(&self, id: NodeId) -> Option<PartRole> {
        self.primary.get(&id).copied()
    }

    pub fn wheels(&self) -> Option<WheelSet> {
        Some(WheelSet {
            front_left: *self.nodes(PartRole::WheelFrontLeft).first()?,
            front_right: *self.nodes(PartRole::WheelFrontRight).first()?,
            rear_left: *self.nodes(PartRole::WheelRearLeft).first()?,
            rear_right: *self.nodes(PartRole::WheelRearRight).first()?,
        })
    }
}

/// The four exact-named wheel nodes used by steering and drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelSet {
    pub front_left: NodeId,
    pub front_right: NodeId,
    pub rear_left: NodeId,
    pub rear_right: NodeId,
}

impl WheelSet {
    pub fn front(&self) -> [NodeId; 2] {
        [self.front_left, self.front_right]
    }

    pub fn rear(&self) -> [NodeId; 2] {
        [self.rear_left, self.rear_right]
    }

    pub fn all(&self) -> [NodeId; 4] {
        [self.front_left, self.front_right, self.rear_left, self.rear_right]
    }
}
