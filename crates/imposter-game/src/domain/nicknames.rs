//! In-game nicknames.
//!
//! Every seat gets its nickname in the same commit that starts the game, so
//! join order cannot be used to tell the AI seats apart.

use imposter_core::error::GameError;
use imposter_core::rng::{DeterministicRng, pick_index};

const ADJECTIVES: &[&str] = &[
    "Witty", "Clever", "Silent", "Sneaky", "Wise", "Brave", "Calm", "Eager", "Gentle", "Happy",
    "Jolly", "Kind", "Lively", "Nice", "Proud", "Silly",
];

const ANIMALS: &[&str] = &[
    "Walrus", "Cat", "Wolf", "Dog", "Lion", "Tiger", "Bear", "Fox", "Shark", "Eagle", "Owl",
    "Hawk", "Snake", "Rabbit", "Deer", "Goat",
];

/// Number of distinct nicknames available.
#[must_use]
pub fn nickname_capacity() -> usize {
    ADJECTIVES.len() * ANIMALS.len()
}

/// Draws `count` distinct "Adjective Animal" nicknames.
///
/// # Errors
///
/// Returns `GameError::InvalidState` if more nicknames are requested than
/// combinations exist.
pub fn generate_unique_nicknames(
    count: usize,
    rng: &mut dyn DeterministicRng,
) -> Result<Vec<String>, GameError> {
    if count > nickname_capacity() {
        return Err(GameError::InvalidState(format!(
            "cannot draw {count} distinct nicknames"
        )));
    }

    let mut remaining: Vec<usize> = (0..nickname_capacity()).collect();
    let mut nicknames = Vec::with_capacity(count);
    for _ in 0..count {
        let combo = remaining.swap_remove(pick_index(rng, remaining.len()));
        let adjective = ADJECTIVES[combo / ANIMALS.len()];
        let animal = ANIMALS[combo % ANIMALS.len()];
        nicknames.push(format!("{adjective} {animal}"));
    }
    Ok(nicknames)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use imposter_core::rng::SystemRng;
    use imposter_test_support::MockRng;

    #[test]
    fn test_nicknames_are_distinct_even_with_a_constant_rng() {
        let names = generate_unique_nicknames(5, &mut MockRng).unwrap();

        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(names[0], "Witty Walrus");
    }

    #[test]
    fn test_can_exhaust_every_combination() {
        let names = generate_unique_nicknames(nickname_capacity(), &mut SystemRng::new()).unwrap();

        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), nickname_capacity());
    }

    #[test]
    fn test_asking_for_too_many_nicknames_fails() {
        let result = generate_unique_nicknames(nickname_capacity() + 1, &mut MockRng);
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }
}
