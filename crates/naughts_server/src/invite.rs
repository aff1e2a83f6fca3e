//! Invite codes for private matchmaking.

use derive_more::Display;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Characters a code is drawn from.
///
/// Digits appear twice so codes are rarely letters only.
pub const ALPHABET: &[u8] = b"A0B1C2D3E4F5G6H7I8J9K0L1M2N3O4P5Q6R7S8T9U0VWXYZ";

/// Length of every generated code.
pub const CODE_LENGTH: usize = 6;

/// Short code shared out of band to join a private session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteCode(String);

impl InviteCode {
    /// Wraps a code received from a client, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Random code source with collision checking.
#[derive(Debug)]
pub struct InviteCodeGenerator {
    rng: ChaCha8Rng,
}

impl InviteCodeGenerator {
    /// Seeds from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws one code without checking for collisions.
    pub fn draw(&mut self) -> InviteCode {
        let code = (0..CODE_LENGTH)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        InviteCode(code)
    }

    /// Draws codes until one is not taken.
    #[instrument(skip(self, is_taken))]
    pub fn generate(&mut self, is_taken: impl Fn(&InviteCode) -> bool) -> InviteCode {
        loop {
            let code = self.draw();
            if !is_taken(&code) {
                return code;
            }
            debug!(code = %code, "Invite code collision, drawing again");
        }
    }
}

impl Default for InviteCodeGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
