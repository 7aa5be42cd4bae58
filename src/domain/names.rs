//! Placeholder display names for freshly connected participants.

use rand::Rng;

const PLAYER_NAMES: [&str; 40] = [
    "Amelia", "Arthur", "Beatrix", "Casper", "Clara", "Dexter", "Edith", "Felix", "Greta",
    "Hugo", "Ines", "Jasper", "Klara", "Leon", "Mabel", "Nils", "Olive", "Pablo", "Quinn",
    "Rosa", "Sven", "Thea", "Ulrik", "Vera", "Wilbur", "Xenia", "Yara", "Zeno", "Astrid",
    "Bruno", "Cleo", "Dario", "Elsa", "Frida", "Gustav", "Hilda", "Ivo", "Jonas", "Kira",
    "Lotte",
];

/// Pick a placeholder name, preferring one not currently in use.
///
/// Tries up to 20 random draws before giving up and returning the last
/// candidate; duplicate placeholder names are tolerable, just undesirable.
pub fn placeholder(taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::rng();
    let mut candidate = PLAYER_NAMES[rng.random_range(0..PLAYER_NAMES.len())];
    for _ in 0..20 {
        if !taken(candidate) {
            break;
        }
        candidate = PLAYER_NAMES[rng.random_range(0..PLAYER_NAMES.len())];
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_from_the_name_list() {
        let name = placeholder(|_| false);
        assert!(PLAYER_NAMES.contains(&name.as_str()));
        assert!(!name.is_empty());
    }

    #[test]
    fn test_placeholder_avoids_a_taken_name() {
        // One name is taken; returning it would require drawing it on all
        // 21 attempts, which is practically impossible.
        let taken = PLAYER_NAMES[0];
        for _ in 0..50 {
            let name = placeholder(|candidate| candidate == taken);
            assert_ne!(name, taken);
        }
    }

    #[test]
    fn test_placeholder_still_returns_a_name_when_all_taken() {
        let name = placeholder(|_| true);
        assert!(PLAYER_NAMES.contains(&name.as_str()));
    }
}
