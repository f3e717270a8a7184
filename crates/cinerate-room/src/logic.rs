//! Pure game rules: round scoring and dealer selection.
//!
//! Everything here is a plain function over borrowed data — no channels,
//! no registry, no clocks — so the rules are unit-testable in isolation
//! and the room actor stays a thin shell around them.

use cinerate_protocol::{ConnId, Guess, Participant};
use rand::Rng;

/// Computes the winners of a round: the guesses closest to `target`
/// without exceeding it.
///
/// A guess is eligible iff `target - value >= 0`. All eligible guesses
/// sharing the minimal difference win (ties are all winners). Returns an
/// empty vec when every guess overshoots. Membership does not depend on
/// submission order.
pub fn round_winners(guesses: &[Guess], target: f64) -> Vec<Guess> {
    let mut best: Option<f64> = None;
    let mut winners = Vec::new();

    for guess in guesses {
        let diff = target - guess.value;
        if diff < 0.0 {
            continue; // overshot, ineligible
        }
        match best {
            Some(b) if diff > b => {}
            Some(b) if diff == b => winners.push(guess.clone()),
            _ => {
                best = Some(diff);
                winners.clear();
                winners.push(guess.clone());
            }
        }
    }

    winners
}

/// Selects the next dealer: the first seat with the strictly smallest
/// turn count. Ties break by seat order, so the pick is deterministic
/// for a given seating.
///
/// The caller is responsible for incrementing the selected player's
/// turn count by exactly one.
pub fn next_dealer(seats: &[Participant]) -> Option<usize> {
    let mut low: Option<usize> = None;
    for (i, seat) in seats.iter().enumerate() {
        match low {
            None => low = Some(i),
            Some(l) if seats[l].turns > seat.turns => low = Some(i),
            Some(_) => {}
        }
    }
    low
}

/// Picks the opening dealer uniformly at random. Unlike [`next_dealer`],
/// this does not look at turn counts and costs the pick no turn.
pub fn random_first_dealer(players: &[ConnId]) -> Option<ConnId> {
    if players.is_empty() {
        return None;
    }
    let i = rand::rng().random_range(0..players.len());
    Some(players[i])
}

// =========================================================================
// Tests
// =========================================================================
