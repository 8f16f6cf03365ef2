//! Localized chat messages.

use std::collections::HashMap;

pub const DEFAULT_LOCALE: &str = "en";

/// Message keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Msg {
    Locked,
    CodeLockDeployed,
    AutoLocked,
    TeamAuthorized,
    ClanAuthorized,
    FriendsAuthorized,
    StaticLockingBlocked,
    OwnerOnly,
}

impl Msg {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Locked => "Locked",
            Self::CodeLockDeployed => "CodeLockDeployed",
            Self::AutoLocked => "AutoLocked",
            Self::TeamAuthorized => "TeamAuthorized",
            Self::ClanAuthorized => "ClanAuthorized",
            Self::FriendsAuthorized => "FriendsAuthorized",
            Self::StaticLockingBlocked => "StaticLockingBlocked",
            Self::OwnerOnly => "OwnerOnly",
        }
    }
}

fn default_messages() -> HashMap<String, String> {
    [
        (Msg::Locked, "It's locked..."),
        (Msg::CodeLockDeployed, "Code lock deployed successfully."),
        (Msg::AutoLocked, "Auto locked with code: <color=#FABE28>{0}</color>."),
        (
            Msg::TeamAuthorized,
            "Your team members have been automatically whitelisted on this code lock.",
        ),
        (
            Msg::ClanAuthorized,
            "Your clan members have been automatically whitelisted on this code lock.",
        ),
        (
            Msg::FriendsAuthorized,
            "Your friends have been automatically whitelisted on this code lock.",
        ),
        (
            Msg::StaticLockingBlocked,
            "Locking static extractors is blocked on this server.",
        ),
        (Msg::OwnerOnly, "Only the owner of this extractor can place locks on it."),
    ]
    .into_iter()
    .map(|(msg, text)| (msg.key().to_string(), text.to_string()))
    .collect()
}

/// Per-locale message templates with `{0}`-style positional arguments.
#[derive(Debug, Clone)]
pub struct Lang {
    locales: HashMap<String, HashMap<String, String>>,
}

impl Default for Lang {
    fn default() -> Self {
        let mut locales = HashMap::new();
        locales.insert(DEFAULT_LOCALE.to_string(), default_messages());
        Self { locales }
    }
}

impl Lang {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or overrides messages for a locale.
    pub fn register(&mut self, locale: &str, messages: HashMap<String, String>) {
        self.locales
            .entry(locale.to_string())
            .or_default()
            .extend(messages);
    }

    fn template(&self, key: &str, locale: &str) -> Option<&str> {
        self.locales
            .get(locale)
            .and_then(|m| m.get(key))
            .or_else(|| self.locales.get(DEFAULT_LOCALE).and_then(|m| m.get(key)))
            .map(String::as_str)
    }

    /// Formats a message. Unknown keys render as the key itself.
    pub fn format(&self, msg: Msg, locale: &str, args: &[&str]) -> String {
        let Some(template) = self.template(msg.key(), locale) else {
            return msg.key().to_string();
        };

        args.iter()
            .enumerate()
            .fold(template.to_string(), |text, (i, arg)| {
                text.replace(&format!("{{{}}}", i), arg)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positional_args() {
        let lang = Lang::new();
        let text = lang.format(Msg::AutoLocked, "en", &["4821"]);
        assert_eq!(text, "Auto locked with code: <color=#FABE28>4821</color>.");
    }

    #[test]
    fn falls_back_to_english() {
        let lang = Lang::new();
        assert_eq!(lang.format(Msg::Locked, "de", &[]), "It's locked...");
    }

    #[test]
    fn registered_locale_wins() {
        let mut lang = Lang::new();
        lang.register(
            "de",
            HashMap::from([("Locked".to_string(), "Verschlossen...".to_string())]),
        );
        assert_eq!(lang.format(Msg::Locked, "de", &[]), "Verschlossen...");
        assert_eq!(
            lang.format(Msg::CodeLockDeployed, "de", &[]),
            "Code lock deployed successfully."
        );
    }
}
