use serde::Serialize;

/// One rung of the donor level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserLevel {
    pub level: u8,
    pub name: &'static str,
    pub min_points: u64,
    pub color: &'static str,
}

/// Static ladder ordered by strictly increasing `min_points`, starting at zero.
pub const USER_LEVELS: [UserLevel; 7] = [
    UserLevel {
        level: 0,
        name: "Newcomer",
        min_points: 0,
        color: "#9CA3AF",
    },
    UserLevel {
        level: 1,
        name: "Helper",
        min_points: 100,
        color: "#60A5FA",
    },
    UserLevel {
        level: 2,
        name: "Supporter",
        min_points: 250,
        color: "#34D399",
    },
    UserLevel {
        level: 3,
        name: "Advocate",
        min_points: 500,
        color: "#FBBF24",
    },
    UserLevel {
        level: 4,
        name: "Champion",
        min_points: 1_000,
        color: "#F97316",
    },
    UserLevel {
        level: 5,
        name: "Hero",
        min_points: 2_500,
        color: "#EF4444",
    },
    UserLevel {
        level: 6,
        name: "Legend",
        min_points: 5_000,
        color: "#8B5CF6",
    },
];

/// Level derived from a point total plus the distance to the next rung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub current: UserLevel,
    /// `None` once the top level is reached.
    pub next_level_points: Option<u64>,
    pub progress_percent: u8,
}

/// Highest level whose threshold the total has reached.
pub fn level_for(total_points: u64) -> UserLevel {
    USER_LEVELS
        .iter()
        .rev()
        .find(|level| total_points >= level.min_points)
        .copied()
        .unwrap_or(USER_LEVELS[0])
}

pub fn progress_for(total_points: u64) -> LevelProgress {
    let current = level_for(total_points);
    let next = USER_LEVELS.get(usize::from(current.level) + 1);

    match next {
        Some(next) => {
            let band = next.min_points - current.min_points;
            let into_band = total_points - current.min_points;
            let percent = (into_band.saturating_mul(100) / band).min(100) as u8;
            LevelProgress {
                current,
                next_level_points: Some(next.min_points),
                progress_percent: percent,
            }
        }
        None => LevelProgress {
            current,
            next_level_points: None,
            progress_percent: 100,
        },
    }
}
