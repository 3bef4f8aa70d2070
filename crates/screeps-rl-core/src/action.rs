//! Action types and the discrete action catalog

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScreepsRlError};

/// Number of body parts in every spawnable composition
pub const BODY_LEN: usize = 3;

/// Creep body part token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum BodyPart {
    Work,
    Carry,
    Move,
}

impl BodyPart {
    /// Alphabet in catalog order
    pub const ALL: [BodyPart; 3] = [BodyPart::Work, BodyPart::Carry, BodyPart::Move];

    /// Game constant name, as written in console code
    pub fn as_str(self) -> &'static str {
        match self {
            BodyPart::Work => "WORK",
            BodyPart::Carry => "CARRY",
            BodyPart::Move => "MOVE",
        }
    }

    /// Part that lets a creep leave the spawn
    pub fn is_mobility(self) -> bool {
        self == BodyPart::Move
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creep role assigned through spawn memory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Primary role: mines energy for the spawn
    Harvester,
    /// Secondary role: feeds the room controller
    Upgrader,
}

impl Role {
    /// Roles in catalog order
    pub const ALL: [Role; 2] = [Role::Harvester, Role::Upgrader];

    /// Name stored in `creep.memory.role`
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Harvester => "harvester",
            Role::Upgrader => "upgrader",
        }
    }

    /// Creep name prefix (`H_<tick>`, `U_<tick>`)
    pub fn name_prefix(self) -> char {
        match self {
            Role::Harvester => 'H',
            Role::Upgrader => 'U',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action the agent may choose
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Spawn a creep with the given role and body
    Spawn { role: Role, body: [BodyPart; BODY_LEN] },
    /// No-op
    Wait,
}

impl Action {
    /// Whether this is a spawn whose body cannot move
    pub fn is_immobile_spawn(&self) -> bool {
        match self {
            Action::Spawn { body, .. } => !body.iter().any(|p| p.is_mobility()),
            Action::Wait => false,
        }
    }

    /// Stable snake_case name, e.g. `spawn_harvester_work_carry_move`
    pub fn name(&self) -> String {
        match self {
            Action::Spawn { role, body } => {
                let parts: Vec<String> = body.iter().map(|p| p.as_str().to_lowercase()).collect();
                format!("spawn_{}_{}", role, parts.join("_"))
            }
            Action::Wait => "wait".to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Spawn { role, body } => {
                let parts: Vec<&str> = body.iter().map(|p| p.as_str()).collect();
                write!(f, "SPAWN {} [{}]", role, parts.join(","))
            }
            Action::Wait => f.write_str("WAIT"),
        }
    }
}

/// Description of an action space
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum ActionSpace {
    /// Discrete action space
    Discrete {
        /// Number of discrete actions
        n: usize,
        /// Optional action names
        #[serde(skip_serializing_if = "Option::is_none")]
        names: Option<Vec<String>>,
    },
}

/// Immutable, ordered table of every action.
///
/// Bodies are enumerated lexicographically over [`BodyPart::ALL`] (first
/// token outermost) and, for each body, every role in [`Role::ALL`] order.
/// [`Action::Wait`] is always the last entry, so indices are stable across
/// processes and trained policies stay replayable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalog {
    actions: Vec<Action>,
}

impl ActionCatalog {
    /// Build the catalog
    pub fn new() -> Self {
        let mut actions = Vec::with_capacity(
            BodyPart::ALL.len().pow(BODY_LEN as u32) * Role::ALL.len() + 1,
        );
        for a in BodyPart::ALL {
            for b in BodyPart::ALL {
                for c in BodyPart::ALL {
                    for role in Role::ALL {
                        actions.push(Action::Spawn {
                            role,
                            body: [a, b, c],
                        });
                    }
                }
            }
        }
        actions.push(Action::Wait);
        Self { actions }
    }

    /// Number of actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Always false; the catalog contains at least `Wait`
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Resolve an index into its action
    pub fn resolve(&self, index: usize) -> Result<Action> {
        self.actions
            .get(index)
            .copied()
            .ok_or(ScreepsRlError::InvalidAction {
                index,
                len: self.actions.len(),
            })
    }

    /// Index of an action, if present
    pub fn index_of(&self, action: &Action) -> Option<usize> {
        self.actions.iter().position(|a| a == action)
    }

    /// Index of the no-op action
    pub fn wait_index(&self) -> usize {
        self.actions.len() - 1
    }

    /// Iterate actions in index order
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Discrete space descriptor with action names
    pub fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete {
            n: self.len(),
            names: Some(self.actions.iter().map(Action::name).collect()),
        }
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_size() {
        let catalog = ActionCatalog::new();
        assert_eq!(catalog.len(), 3usize.pow(3) * 2 + 1);
        assert_eq!(catalog.len(), 55);
        assert_eq!(catalog.resolve(54).unwrap(), Action::Wait);
        assert_eq!(catalog.wait_index(), 54);
    }

    #[test]
    fn test_catalog_order() {
        let catalog = ActionCatalog::new();
        assert_eq!(
            catalog.resolve(0).unwrap(),
            Action::Spawn {
                role: Role::Harvester,
                body: [BodyPart::Work, BodyPart::Work, BodyPart::Work],
            }
        );
        assert_eq!(
            catalog.resolve(1).unwrap(),
            Action::Spawn {
                role: Role::Upgrader,
                body: [BodyPart::Work, BodyPart::Work, BodyPart::Work],
            }
        );
        // Innermost token varies first
        assert_eq!(
            catalog.resolve(2).unwrap(),
            Action::Spawn {
                role: Role::Harvester,
                body: [BodyPart::Work, BodyPart::Work, BodyPart::Carry],
            }
        );
        assert_eq!(
            catalog.resolve(53).unwrap(),
            Action::Spawn {
                role: Role::Upgrader,
                body: [BodyPart::Move, BodyPart::Move, BodyPart::Move],
            }
        );
    }

    #[test]
    fn test_resolve_is_bijective() {
        let catalog = ActionCatalog::new();
        let distinct: HashSet<Action> = (0..catalog.len())
            .map(|i| catalog.resolve(i).unwrap())
            .collect();
        assert_eq!(distinct.len(), catalog.len());
        for (i, action) in catalog.iter().enumerate() {
            assert_eq!(catalog.index_of(action), Some(i));
        }
    }

    #[test]
    fn test_resolve_out_of_range() {
        let catalog = ActionCatalog::new();
        match catalog.resolve(55) {
            Err(ScreepsRlError::InvalidAction { index, len }) => {
                assert_eq!(index, 55);
                assert_eq!(len, 55);
            }
            other => panic!("Expected InvalidAction, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_is_deterministic() {
        assert_eq!(ActionCatalog::new(), ActionCatalog::new());
    }

    #[test]
    fn test_immobile_spawn() {
        let immobile = Action::Spawn {
            role: Role::Harvester,
            body: [BodyPart::Work, BodyPart::Carry, BodyPart::Work],
        };
        let mobile = Action::Spawn {
            role: Role::Harvester,
            body: [BodyPart::Work, BodyPart::Carry, BodyPart::Move],
        };
        assert!(immobile.is_immobile_spawn());
        assert!(!mobile.is_immobile_spawn());
        assert!(!Action::Wait.is_immobile_spawn());
    }

    #[test]
    fn test_action_names() {
        let catalog = ActionCatalog::new();
        assert_eq!(catalog.resolve(0).unwrap().name(), "spawn_harvester_work_work_work");
        assert_eq!(catalog.resolve(54).unwrap().name(), "wait");

        match catalog.action_space() {
            ActionSpace::Discrete { n, names } => {
                assert_eq!(n, 55);
                assert_eq!(names.unwrap().len(), 55);
            }
        }
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::Spawn {
            role: Role::Upgrader,
            body: [BodyPart::Work, BodyPart::Carry, BodyPart::Move],
        };
        let json = serde_json::to_value(action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "SPAWN", "role": "upgrader", "body": ["WORK", "CARRY", "MOVE"]})
        );
        let wait = serde_json::to_value(Action::Wait).unwrap();
        assert_eq!(wait, serde_json::json!({"type": "WAIT"}));
    }
}
