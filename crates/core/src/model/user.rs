use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::level::Level;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("country cannot be empty")]
    EmptyCountry,
}

//
// ─── COUNTRY ───────────────────────────────────────────────────────────────────
//

static KNOWN_COUNTRIES: [(&str, &str, &str); 10] = [
    ("DE", "Deutschland", "🇩🇪"),
    ("AT", "Österreich", "🇦🇹"),
    ("CH", "Schweiz", "🇨🇭"),
    ("ES", "España", "🇪🇸"),
    ("FR", "France", "🇫🇷"),
    ("IT", "Italia", "🇮🇹"),
    ("PT", "Portugal", "🇵🇹"),
    ("NL", "Nederland", "🇳🇱"),
    ("BE", "België", "🇧🇪"),
    ("UK", "United Kingdom", "🇬🇧"),
];

const UNKNOWN_FLAG: &str = "🌍";

/// Country code a player registered with (e.g. `DE`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Country(String);

impl Country {
    /// Normalizes the code to upper case.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyCountry` for a blank code.
    pub fn new(code: impl AsRef<str>) -> Result<Self, UserError> {
        let code = code.as_ref().trim().to_uppercase();
        if code.is_empty() {
            return Err(UserError::EmptyCountry);
        }
        Ok(Self(code))
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Flag emoji for known codes, a globe otherwise.
    #[must_use]
    pub fn flag(&self) -> &'static str {
        KNOWN_COUNTRIES
            .iter()
            .find(|(code, _, _)| *code == self.0)
            .map_or(UNKNOWN_FLAG, |(_, _, flag)| *flag)
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&'static str> {
        KNOWN_COUNTRIES
            .iter()
            .find(|(code, _, _)| *code == self.0)
            .map(|(_, name, _)| *name)
    }

    /// Countries offered at registration, in display order.
    pub fn selectable() -> impl Iterator<Item = Country> {
        KNOWN_COUNTRIES
            .iter()
            .map(|(code, _, _)| Country((*code).to_string()))
    }
}

impl fmt::Debug for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Country({})", self.0)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A registered player. Credentials live in storage, never on this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    country: Country,
    total_points: u32,
    current_level: Level,
    created_at: DateTime<Utc>,
}

impl User {
    /// Creates a fresh player with no points at the first level.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyUsername` for a blank username.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        country: Country,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(id, username, country, 0, Level::first(), created_at)
    }

    /// Rehydrate a user from storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyUsername` for a blank username.
    pub fn from_persisted(
        id: UserId,
        username: impl Into<String>,
        country: Country,
        total_points: u32,
        current_level: Level,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let username = username.into().trim().to_string();
        if username.is_empty() {
            return Err(UserError::EmptyUsername);
        }
        Ok(Self {
            id,
            username,
            country,
            total_points,
            current_level,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn country(&self) -> &Country {
        &self.country
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub fn current_level(&self) -> Level {
        self.current_level
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Adds earned points. The total never decreases.
    pub fn add_points(&mut self, points: u32) {
        self.total_points = self.total_points.saturating_add(points);
    }

    /// Moves the player's current level up; lower levels are ignored.
    pub fn reach_level(&mut self, level: Level) {
        if level > self.current_level {
            self.current_level = level;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn user() -> User {
        User::new(
            UserId::new(1),
            "ana",
            Country::new("es").unwrap(),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn new_user_starts_at_level_one_with_no_points() {
        let u = user();
        assert_eq!(u.total_points(), 0);
        assert_eq!(u.current_level(), Level::first());
        assert_eq!(u.country().code(), "ES");
    }

    #[test]
    fn blank_username_is_rejected() {
        let err = User::new(
            UserId::new(1),
            "  ",
            Country::new("DE").unwrap(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, UserError::EmptyUsername);
    }

    #[test]
    fn points_only_accumulate() {
        let mut u = user();
        u.add_points(90);
        u.add_points(0);
        u.add_points(100);
        assert_eq!(u.total_points(), 190);
    }

    #[test]
    fn reach_level_never_moves_down() {
        let mut u = user();
        u.reach_level(Level::new(3).unwrap());
        u.reach_level(Level::new(2).unwrap());
        assert_eq!(u.current_level().value(), 3);
    }

    #[test]
    fn unknown_country_gets_globe_flag() {
        assert_eq!(Country::new("DE").unwrap().flag(), "🇩🇪");
        assert_eq!(Country::new("US").unwrap().flag(), "🌍");
        assert_eq!(Country::new("US").unwrap().display_name(), None);
        assert!(Country::new("").is_err());
        assert_eq!(Country::selectable().count(), 10);
    }
}
