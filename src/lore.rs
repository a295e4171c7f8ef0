use crate::chain::Address;
use serde::Deserialize;
use std::{
    collections::HashMap,
    sync::OnceLock,
};

const LORE_JSON: &str = include_str!("../assets/lore.json");

const FALLBACK: &str = "Little is written about this dragon.";

#[derive(Deserialize)]
struct LoreDoc {
    dragons: HashMap<String, String>,
}

static LORE: OnceLock<LoreDoc> = OnceLock::new();

fn doc() -> &'static LoreDoc {
    LORE.get_or_init(|| {
        serde_json::from_str(LORE_JSON).expect("bundled lore.json is valid")
    })
}

/// Flavor paragraph for a dragon, keyed by address with a default
/// entry for dragons the chroniclers have not met yet.
pub fn dragon_lore(address: &Address) -> &'static str {
    let doc = doc();
    doc.dragons
        .get(&address.to_string())
        .or_else(|| doc.dragons.get("default"))
        .map(String::as_str)
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dragon_lore__unknown_address__falls_back_to_default() {
        // given
        let unknown = Address::new([0xFFu8; 32]);

        // when
        let text = dragon_lore(&unknown);

        // then
        assert_eq!(text, doc().dragons["default"]);
    }

    #[test]
    fn dragon_lore__known_address__returns_its_entry() {
        // given: a demo roster address listed in the bundled document
        let known: Address =
            "0xca5745de122f283012aa9213390e9b9c01ab4e351afe665fbf5629a5df374a8b"
                .parse()
                .unwrap();

        // when
        let text = dragon_lore(&known);

        // then
        assert_ne!(text, doc().dragons["default"]);
    }
}
