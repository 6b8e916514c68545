//! Role quotas and dealing.

use mafia_protocol::{PlayerId, Role};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::GameConfig;

/// How many players of `count` receive `role`.
///
/// Returns `None` below `min_players` and for [`Role::Ghost`], which is
/// never dealt.
///
/// | players                    | mafia       | detective   |
/// |----------------------------|-------------|-------------|
/// | `min..mid`                 | 1           | 1           |
/// | `mid..max_players_tier`    | 2           | 1           |
/// | `max_players_tier..`       | `count / 4` | `count / 8` |
///
/// Civilians take the rest.
pub fn quota(count: usize, role: Role, config: &GameConfig) -> Option<usize> {
    if count < config.min_players {
        return None;
    }
    let large = count >= config.max_players_tier;
    match role {
        Role::Mafia if large => Some(count / 4),
        Role::Mafia if count >= config.mid_players => Some(2),
        Role::Mafia => Some(1),
        Role::Detective if large => Some(count / 8),
        Role::Detective => Some(1),
        Role::Civilian => {
            let mafia = quota(count, Role::Mafia, config)?;
            let detectives = quota(count, Role::Detective, config)?;
            count.checked_sub(mafia + detectives)
        }
        Role::Ghost => None,
    }
}

/// Deals roles to `players` uniformly at random.
///
/// Shuffles the ids, then cuts the permutation into a mafia block, a
/// detective block, and the civilian remainder. Returns `None` if there
/// are too few players.
pub fn assign_roles<R: Rng + ?Sized>(
    players: &[PlayerId],
    config: &GameConfig,
    rng: &mut R,
) -> Option<Vec<(PlayerId, Role)>> {
    let count = players.len();
    let mafia = quota(count, Role::Mafia, config)?;
    let detectives = quota(count, Role::Detective, config)?;

    let mut order = players.to_vec();
    order.shuffle(rng);

    Some(
        order
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let role = if i < mafia {
                    Role::Mafia
                } else if i < mafia + detectives {
                    Role::Detective
                } else {
                    Role::Civilian
                };
                (id, role)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn ids(n: u64) -> Vec<PlayerId> {
        (1..=n).map(PlayerId).collect()
    }

    #[test]
    fn test_quota_below_minimum_is_none() {
        let config = GameConfig::default();
        assert_eq!(quota(3, Role::Mafia, &config), None);
        assert_eq!(quota(3, Role::Detective, &config), None);
        assert_eq!(quota(0, Role::Civilian, &config), None);
    }

    #[test]
    fn test_quota_ghost_is_never_dealt() {
        assert_eq!(quota(10, Role::Ghost, &GameConfig::default()), None);
    }

    #[test]
    fn test_quota_table_boundaries() {
        let config = GameConfig::default();
        assert_eq!(quota(4, Role::Mafia, &config), Some(1));
        assert_eq!(quota(6, Role::Mafia, &config), Some(1));
        assert_eq!(quota(7, Role::Mafia, &config), Some(2));
        assert_eq!(quota(11, Role::Mafia, &config), Some(2));
        assert_eq!(quota(12, Role::Mafia, &config), Some(3));
        assert_eq!(quota(11, Role::Detective, &config), Some(1));
        assert_eq!(quota(16, Role::Detective, &config), Some(2));
        assert_eq!(quota(5, Role::Civilian, &config), Some(3));
    }

    #[test]
    fn test_quota_sums_to_player_count() {
        let config = GameConfig::default();
        for n in 4..=64 {
            let total: usize = Role::ASSIGNABLE
                .iter()
                .map(|&r| quota(n, r, &config).unwrap())
                .sum();
            assert_eq!(total, n, "quotas for {n} players");
        }
    }

    #[test]
    fn test_assign_roles_matches_quotas() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let dealt = assign_roles(&ids(12), &config, &mut rng).unwrap();
        assert_eq!(dealt.len(), 12);

        let mut counts: HashMap<Role, usize> = HashMap::new();
        for (_, role) in &dealt {
            *counts.entry(*role).or_default() += 1;
        }
        assert_eq!(counts[&Role::Mafia], 3);
        assert_eq!(counts[&Role::Detective], 1);
        assert_eq!(counts[&Role::Civilian], 8);
    }

    #[test]
    fn test_assign_roles_too_few_players_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(assign_roles(&ids(3), &GameConfig::default(), &mut rng).is_none());
    }

    #[test]
    fn test_assign_roles_is_uniform_over_players() {
        let config = GameConfig::default();
        let players = ids(5);
        let mut rng = StdRng::seed_from_u64(0x6d61_6669);
        let trials = 5_000;
        let mut hits: HashMap<(PlayerId, Role), usize> = HashMap::new();

        for _ in 0..trials {
            let dealt = assign_roles(&players, &config, &mut rng).unwrap();
            for (id, role) in dealt {
                *hits.entry((id, role)).or_default() += 1;
            }
        }

        // One mafia and one detective among five: each player expects
        // 1000 hits of either, and 3000 as a civilian.
        for id in &players {
            let count = |role: Role| hits.get(&(*id, role)).copied().unwrap_or(0);
            let mafia = count(Role::Mafia);
            let detective = count(Role::Detective);
            let civilian = count(Role::Civilian);
            assert!((850..=1150).contains(&mafia), "{id} was mafia {mafia} times");
            assert!(
                (850..=1150).contains(&detective),
                "{id} was detective {detective} times"
            );
            assert!(
                (2800..=3200).contains(&civilian),
                "{id} was civilian {civilian} times"
            );
        }
    }
}
