use quiz_core::model::{LevelInfo, LevelTable, MilestoneProgress, User};

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    /// One-based position of the question on screen.
    pub position: usize,
    pub is_complete: bool,
}

/// Main-menu summary of a player's standing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgress {
    pub total_points: u32,
    pub current_level: LevelInfo,
    pub milestone: MilestoneProgress,
    /// Levels the player may pick, in order.
    pub unlocked: Vec<LevelInfo>,
}

impl PlayerProgress {
    #[must_use]
    pub fn for_user(user: &User, table: &LevelTable) -> Self {
        let points = user.total_points();
        let unlocked = table
            .unlocked_levels(points)
            .into_iter()
            .map(|level| table.info(level).clone())
            .collect();
        Self {
            total_points: points,
            current_level: table.info(user.current_level()).clone(),
            milestone: table.milestone_progress(points),
            unlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Country, Level, UserId};
    use quiz_core::time::fixed_now;

    fn user(points: u32) -> User {
        let mut u = User::new(UserId::new(1), "ana", Country::new("ES").unwrap(), fixed_now())
            .unwrap();
        u.add_points(points);
        u
    }

    #[test]
    fn unlocked_levels_follow_points() {
        let table = LevelTable::standard();
        let progress = PlayerProgress::for_user(&user(1499), &table);
        assert_eq!(progress.unlocked.len(), 2);
        let progress = PlayerProgress::for_user(&user(1500), &table);
        assert_eq!(progress.unlocked.len(), 3);
        assert_eq!(progress.milestone.points_to_next, 1500);
    }

    #[test]
    fn reached_level_does_not_unlock_by_itself() {
        let table = LevelTable::standard();
        let mut u = user(1499);
        u.reach_level(Level::new(3).unwrap());
        let progress = PlayerProgress::for_user(&u, &table);
        assert_eq!(progress.current_level.level.value(), 3);
        let unlocked: Vec<u8> = progress.unlocked.iter().map(|i| i.level.value()).collect();
        assert_eq!(unlocked, vec![1, 2]);

        u.add_points(1);
        let progress = PlayerProgress::for_user(&u, &table);
        assert_eq!(progress.unlocked.len(), 3);
    }
}
