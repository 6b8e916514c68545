//! The player registry: every connected participant, by id and by name.
//!
//! Like the rest of this crate, `Registry` is plain data with no locking
//! of its own. The engine owns it inside its session lock.

use std::collections::HashMap;

use mafia_protocol::{PlayerId, Role};

use crate::{Player, PlayerError};

/// Connected players.
///
/// ```text
/// insert() ──→ [registered] ──→ remove()  (channels closed, name freed)
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    players: HashMap<PlayerId, Player>,

    /// Name → id, kept in sync with `players`. Names are case-sensitive.
    names: HashMap<String, PlayerId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a player.
    ///
    /// # Errors
    /// Returns [`PlayerError::NameTaken`] if a connected player already
    /// uses the same name.
    pub fn insert(&mut self, player: Player) -> Result<(), PlayerError> {
        if self.contains_name(&player.name) {
            return Err(PlayerError::NameTaken(player.name));
        }
        tracing::debug!(player_id = %player.id, name = %player.name, "player registered");
        self.names.insert(player.name.clone(), player.id);
        self.players.insert(player.id, player);
        Ok(())
    }

    /// Unregisters a player and closes all of their channels.
    ///
    /// # Errors
    /// Returns [`PlayerError::NotFound`] if the id is unknown.
    pub fn remove(&mut self, id: PlayerId) -> Result<Player, PlayerError> {
        let player = self.players.remove(&id).ok_or(PlayerError::NotFound(id))?;
        self.names.remove(&player.name);
        player.channels().close();
        Ok(player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn id_by_name(&self, name: &str) -> Option<PlayerId> {
        self.names.get(name).copied()
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Player> {
        let id = self.id_by_name(name)?;
        self.players.get_mut(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Player names, ordered by join order.
    pub fn names(&self) -> Vec<String> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.id);
        players.into_iter().map(|p| p.name.clone()).collect()
    }

    /// Ids ordered by join order.
    pub fn ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Players currently holding `role`.
    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &Player> {
        self.players.values().filter(move |p| p.role == Some(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u64, name: &str) -> Player {
        Player::new(PlayerId(id), name, 8)
    }

    #[test]
    fn test_insert_new_name_succeeds() {
        let mut reg = Registry::new();
        reg.insert(player(1, "ann")).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.id_by_name("ann"), Some(PlayerId(1)));
    }

    #[test]
    fn test_insert_duplicate_name_returns_name_taken() {
        let mut reg = Registry::new();
        reg.insert(player(1, "ann")).unwrap();
        let err = reg.insert(player(2, "ann")).unwrap_err();
        assert!(matches!(err, PlayerError::NameTaken(name) if name == "ann"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut reg = Registry::new();
        reg.insert(player(1, "ann")).unwrap();
        assert!(reg.insert(player(2, "Ann")).is_ok());
    }

    #[test]
    fn test_remove_frees_name_and_closes_channels() {
        let mut reg = Registry::new();
        reg.insert(player(1, "ann")).unwrap();
        let removed = reg.remove(PlayerId(1)).unwrap();
        assert!(removed.channels().votes.is_closed());
        assert!(!reg.contains_name("ann"));
        assert!(reg.insert(player(2, "ann")).is_ok());
    }

    #[test]
    fn test_remove_unknown_returns_not_found() {
        let mut reg = Registry::new();
        assert!(matches!(
            reg.remove(PlayerId(9)),
            Err(PlayerError::NotFound(PlayerId(9)))
        ));
    }

    #[test]
    fn test_names_follow_join_order() {
        let mut reg = Registry::new();
        reg.insert(player(3, "cid")).unwrap();
        reg.insert(player(1, "ann")).unwrap();
        reg.insert(player(2, "bob")).unwrap();
        assert_eq!(reg.names(), vec!["ann", "bob", "cid"]);
        assert_eq!(reg.ids(), vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_with_role_filters_by_current_role() {
        let mut reg = Registry::new();
        reg.insert(player(1, "ann")).unwrap();
        reg.insert(player(2, "bob")).unwrap();
        reg.get_mut(PlayerId(1)).unwrap().role = Some(Role::Mafia);
        reg.by_name_mut("bob").unwrap().role = Some(Role::Civilian);
        let mafia: Vec<_> = reg.with_role(Role::Mafia).map(|p| p.name.as_str()).collect();
        assert_eq!(mafia, vec!["ann"]);
    }
}
