//! Breadth-first search for a shortest actor/movie connection.
use std::collections::{HashMap, HashSet, VecDeque};

use costar_game::{ContentResolver, EntityKey, ItemId, ItemKind, MetadataProvider};

/// Path of alternating entities from the first actor to the second, inclusive.
pub type Connection = Vec<EntityKey>;

/// Shortest connection between two actors through the eligible graph, or
/// `None` if none is found within `max_expansions` resolved nodes.
///
/// A `blocked` actor is never stepped through.
pub async fn shortest_connection<M: MetadataProvider>(
    resolver: &ContentResolver<M>,
    from: ItemId,
    to: ItemId,
    blocked: Option<ItemId>,
    max_expansions: usize,
) -> Option<Connection> {
    let start = EntityKey::actor(from);
    let goal = EntityKey::actor(to);
    if start == goal {
        return Some(vec![start]);
    }

    let mut parents: HashMap<EntityKey, EntityKey> = HashMap::new();
    let mut seen: HashSet<EntityKey> = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut expansions = 0;

    while let Some(node) = queue.pop_front() {
        if expansions >= max_expansions {
            break;
        }
        expansions += 1;

        let Some(item) = resolver.resolve(node.kind, node.id).await else {
            continue;
        };
        for next in item.option_keys() {
            let is_blocked = next.kind == ItemKind::Actor && Some(next.id) == blocked;
            if is_blocked || !seen.insert(next) {
                continue;
            }
            parents.insert(next, node);
            if next == goal {
                return Some(walk_back(&parents, start, goal));
            }
            queue.push_back(next);
        }
    }
    None
}

fn walk_back(
    parents: &HashMap<EntityKey, EntityKey>,
    start: EntityKey,
    goal: EntityKey,
) -> Connection {
    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        match parents.get(&cursor) {
            Some(parent) => {
                path.push(*parent);
                cursor = *parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Number of links a connection represents, counted the way a session does.
#[must_use]
pub fn link_count(connection: &[EntityKey]) -> usize {
    connection.len().saturating_sub(1) / 2
}

/// Movies along the path, in order.
#[must_use]
pub fn movies(connection: &[EntityKey]) -> Vec<ItemId> {
    connection
        .iter()
        .filter(|key| key.kind == ItemKind::Movie)
        .map(|key| key.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use costar_game::{EligibilityConfig, MemoryCatalog};

    fn resolver() -> ContentResolver<MemoryCatalog> {
        let catalog = MemoryCatalog::new()
            .with_actor(1, "A")
            .with_actor(2, "B")
            .with_actor(3, "C")
            .with_actor(4, "D")
            .with_movie(100, "AB", "2000-01-01", &[(1, "x"), (2, "y")])
            .with_movie(101, "BC", "2001-01-01", &[(2, "x"), (3, "y")])
            .with_movie(102, "AC", "2002-01-01", &[(1, "x"), (3, "y")]);
        ContentResolver::new(catalog, EligibilityConfig::default())
    }

    #[tokio::test]
    async fn finds_direct_costar() {
        let path = shortest_connection(&resolver(), 1, 3, None, 100).await.unwrap();
        assert_eq!(
            path,
            vec![EntityKey::actor(1), EntityKey::movie(102), EntityKey::actor(3)]
        );
        assert_eq!(link_count(&path), 1);
        assert_eq!(movies(&path), vec![102]);
    }

    #[tokio::test]
    async fn unreachable_actor_yields_none() {
        assert!(shortest_connection(&resolver(), 1, 4, None, 100).await.is_none());
    }

    #[tokio::test]
    async fn blocked_actor_forces_a_detour() {
        let path = shortest_connection(&resolver(), 1, 3, Some(3), 100).await;
        assert!(path.is_none());

        let around = shortest_connection(&resolver(), 2, 3, Some(1), 100).await.unwrap();
        assert_eq!(movies(&around), vec![101]);
    }

    #[tokio::test]
    async fn same_actor_is_trivially_connected() {
        let path = shortest_connection(&resolver(), 2, 2, None, 100).await.unwrap();
        assert_eq!(link_count(&path), 0);
    }
}
