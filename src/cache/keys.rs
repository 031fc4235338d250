//! Listing cache keys.

use std::fmt;

use crate::application::repos::FlatFilter;
use crate::domain::types::Role;

/// Role-partitioned view of a house's flats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingScope {
    /// Approved flats only.
    Client,
    /// All flats.
    Moderator,
}

impl ListingScope {
    pub const ALL: [ListingScope; 2] = [ListingScope::Client, ListingScope::Moderator];

    pub fn as_str(self) -> &'static str {
        match self {
            ListingScope::Client => "client",
            ListingScope::Moderator => "moderator",
        }
    }

    pub fn filter(self) -> FlatFilter {
        match self {
            ListingScope::Client => FlatFilter::ApprovedOnly,
            ListingScope::Moderator => FlatFilter::All,
        }
    }
}

impl From<Role> for ListingScope {
    fn from(role: Role) -> Self {
        match role {
            Role::Client => ListingScope::Client,
            Role::Moderator => ListingScope::Moderator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub scope: ListingScope,
    pub house_id: i32,
}

impl ListingKey {
    pub fn new(scope: ListingScope, house_id: i32) -> Self {
        Self { scope, house_id }
    }

    /// Every key a mutation of `house_id` must invalidate.
    pub fn for_house(house_id: i32) -> [ListingKey; 2] {
        ListingScope::ALL.map(|scope| ListingKey::new(scope, house_id))
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:all:{}", self.scope.as_str(), self.house_id)
    }
}
