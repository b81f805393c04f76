use crate::model::user::{Country, User};

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub country: Country,
    pub total_points: u32,
}

/// Rank players by total points, highest first.
///
/// Ranks are positional (1, 2, 3, ...); players with equal totals keep their
/// input order.
#[must_use]
pub fn rank_users(users: &[User]) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&User> = users.iter().collect();
    sorted.sort_by(|a, b| b.total_points().cmp(&a.total_points()));

    sorted
        .into_iter()
        .zip(1_u32..)
        .map(|(user, rank)| LeaderboardEntry {
            rank,
            username: user.username().to_string(),
            country: user.country().clone(),
            total_points: user.total_points(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, UserId};
    use crate::time::fixed_now;

    fn user(id: u64, name: &str, points: u32) -> User {
        User::from_persisted(
            UserId::new(id),
            name,
            Country::new("DE").unwrap(),
            points,
            Level::first(),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn ranks_by_points_descending() {
        let users = vec![user(1, "a", 100), user(2, "b", 900), user(3, "c", 400)];
        let board = rank_users(&users);
        let names: Vec<_> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn ties_keep_registration_order() {
        let users = vec![user(1, "first", 50), user(2, "second", 50)];
        let board = rank_users(&users);
        assert_eq!(board[0].username, "first");
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn empty_board() {
        assert!(rank_users(&[]).is_empty());
    }
}
