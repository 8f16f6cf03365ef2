//! Auto-authorization from team, clan and friends membership.
//!
//! Each source is an optional provider. A missing or unloaded provider
//! contributes nothing; it never fails the deploy.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::config::Config;
use crate::lang::Msg;
use crate::models::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupSource {
    Team,
    Clan,
    Friends,
}

impl GroupSource {
    pub const ALL: [GroupSource; 3] = [GroupSource::Team, GroupSource::Clan, GroupSource::Friends];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Clan => "clan",
            Self::Friends => "friends",
        }
    }

    pub fn is_enabled(&self, config: &Config) -> bool {
        match self {
            Self::Team => config.auto_authorize_team,
            Self::Clan => config.auto_authorize_clan,
            Self::Friends => config.auto_authorize_friends,
        }
    }

    /// Message sent to the deployer when this source added anyone.
    pub fn message(&self) -> Msg {
        match self {
            Self::Team => Msg::TeamAuthorized,
            Self::Clan => Msg::ClanAuthorized,
            Self::Friends => Msg::FriendsAuthorized,
        }
    }
}

impl std::str::FromStr for GroupSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown group source '{}'", s))
    }
}

/// An external membership plugin.
pub trait GroupProvider: Send + Sync {
    /// `false` while the backing plugin is unloaded.
    fn is_loaded(&self) -> bool {
        true
    }

    /// Everyone sharing a group with `player`. May include `player`.
    fn members_of(&self, player: PlayerId) -> Vec<PlayerId>;
}

/// Members contributed by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupGrant {
    pub source: GroupSource,
    pub members: BTreeSet<PlayerId>,
}

/// Queries the enabled providers for whitelist candidates.
#[derive(Clone, Default)]
pub struct GroupResolver {
    providers: HashMap<GroupSource, Arc<dyn GroupProvider>>,
}

impl GroupResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, source: GroupSource, provider: Arc<dyn GroupProvider>) -> Self {
        self.providers.insert(source, provider);
        self
    }

    /// Members of `player`'s group in `source`, excluding `player`.
    pub fn members_of(&self, source: GroupSource, player: PlayerId) -> BTreeSet<PlayerId> {
        let Some(provider) = self.providers.get(&source) else {
            return BTreeSet::new();
        };
        if !provider.is_loaded() {
            tracing::debug!("{} provider not loaded, skipping", source.as_str());
            return BTreeSet::new();
        }

        provider
            .members_of(player)
            .into_iter()
            .filter(|member| *member != player)
            .collect()
    }

    /// Non-empty contributions of every source enabled in `config`.
    pub fn resolve(&self, player: PlayerId, config: &Config) -> Vec<GroupGrant> {
        GroupSource::ALL
            .into_iter()
            .filter(|source| source.is_enabled(config))
            .filter_map(|source| {
                let members = self.members_of(source, player);
                (!members.is_empty()).then_some(GroupGrant { source, members })
            })
            .collect()
    }
}

/// Groups held in memory: teams and friend lists keyed by player, clans
/// resolved in two steps (player to tag, tag to roster) the way clan plugins
/// expose them.
#[derive(Debug)]
pub struct MemoryGroups {
    loaded: RwLock<bool>,
    lists: RwLock<HashMap<PlayerId, Vec<PlayerId>>>,
    tags: RwLock<HashMap<PlayerId, String>>,
    rosters: RwLock<HashMap<String, Vec<PlayerId>>>,
}

impl MemoryGroups {
    pub fn new() -> Self {
        Self {
            loaded: RwLock::new(true),
            lists: RwLock::default(),
            tags: RwLock::default(),
            rosters: RwLock::default(),
        }
    }

    pub fn set_loaded(&self, loaded: bool) {
        *self.loaded.write().expect("group lock poisoned") = loaded;
    }

    /// Puts every player of `members` into one group (team or friends).
    pub fn add_group(&self, members: &[PlayerId]) {
        let mut lists = self.lists.write().expect("group lock poisoned");
        for member in members {
            lists.insert(*member, members.to_vec());
        }
    }

    pub fn add_clan(&self, tag: &str, members: &[PlayerId]) {
        let mut tags = self.tags.write().expect("group lock poisoned");
        for member in members {
            tags.insert(*member, tag.to_string());
        }
        self.rosters
            .write()
            .expect("group lock poisoned")
            .insert(tag.to_string(), members.to_vec());
    }

    fn clan_of(&self, player: PlayerId) -> Option<String> {
        self.tags
            .read()
            .expect("group lock poisoned")
            .get(&player)
            .filter(|tag| !tag.is_empty())
            .cloned()
    }
}

impl Default for MemoryGroups {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupProvider for MemoryGroups {
    fn is_loaded(&self) -> bool {
        *self.loaded.read().expect("group lock poisoned")
    }

    fn members_of(&self, player: PlayerId) -> Vec<PlayerId> {
        if let Some(tag) = self.clan_of(player) {
            return self
                .rosters
                .read()
                .expect("group lock poisoned")
                .get(&tag)
                .cloned()
                .unwrap_or_default();
        }

        self.lists
            .read()
            .expect("group lock poisoned")
            .get(&player)
            .cloned()
            .unwrap_or_default()
    }
}

/// One [`MemoryGroups`] per source, fed by the host bridge.
#[derive(Debug, Clone, Default)]
pub struct GroupDirectory {
    team: Arc<MemoryGroups>,
    clan: Arc<MemoryGroups>,
    friends: Arc<MemoryGroups>,
}

impl GroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: GroupSource) -> &Arc<MemoryGroups> {
        match source {
            GroupSource::Team => &self.team,
            GroupSource::Clan => &self.clan,
            GroupSource::Friends => &self.friends,
        }
    }

    /// A resolver reading from this directory. Later updates are visible to it.
    pub fn resolver(&self) -> GroupResolver {
        GroupSource::ALL
            .into_iter()
            .fold(GroupResolver::new(), |resolver, source| {
                let provider: Arc<dyn GroupProvider> = self.get(source).clone();
                resolver.with_provider(source, provider)
            })
    }
}
