use std::fmt;

use serde::{Deserialize, Serialize};

/// Item id of the code lock the player deploys.
pub const CODE_LOCK_ITEM_ID: i32 = 1159991980;

/// 64-bit platform identity of a player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The item stack in a player's active slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeldItem {
    pub item_id: i32,
    pub amount: u32,
}

impl HeldItem {
    pub fn code_lock(amount: u32) -> Self {
        Self {
            item_id: CODE_LOCK_ITEM_ID,
            amount,
        }
    }
}

/// A player performing an action, as seen by the hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: PlayerId,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub active_item: Option<HeldItem>,
    /// Code typed through the lock's keypad, if any.
    #[serde(default)]
    pub entered_code: Option<String>,
}

fn default_locale() -> String {
    "en".to_string()
}

impl Actor {
    pub fn new(id: u64) -> Self {
        Self {
            id: PlayerId(id),
            locale: default_locale(),
            active_item: None,
            entered_code: None,
        }
    }

    pub fn holding(mut self, item: HeldItem) -> Self {
        self.active_item = Some(item);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.entered_code = Some(code.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn is_holding_code_lock(&self) -> bool {
        self.active_item
            .is_some_and(|item| item.item_id == CODE_LOCK_ITEM_ID && item.amount > 0)
    }
}
