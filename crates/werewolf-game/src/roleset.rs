//! Rolesets: the named role configuration a game is played with.

use serde::{Deserialize, Serialize};

/// A named set of role slots.
///
/// The rules engine picks one for a game; the registry only reads its name
/// and size for the listing. One slot per player, so the number of roles
/// is also the number of players the game needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roleset {
    /// Display name, e.g. `"Basic"`.
    pub name: String,

    /// Role names, one per slot. Duplicates are allowed.
    pub roles: Vec<String>,
}

impl Roleset {
    /// Creates a roleset from a name and its role slots.
    pub fn new(
        name: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// How many players a game with this roleset needs.
    pub fn players_needed(&self) -> usize {
        self.roles.len()
    }
}
