//! Character-level text corruption.
//!
//! Corruption is lossy. Callers that need the original back keep it in a
//! [`crate::store::CorruptionStore`]; nothing here can undo a substitution.

use rand::Rng;

/// Glyphs that read as static or rendering glitches.
pub const GLITCH_GLYPHS: [char; 14] = [
    '█', '▓', '▒', '░', '?', '#', '@', '&', '%', '!', '※', '∞', '◊', '∴',
];

/// Result of one corruption pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corrupted {
    pub text: String,
    /// Substitutions actually applied. Attempts that land on whitespace are
    /// skipped, so this can be lower than the attempt count.
    pub substitutions: usize,
}

/// Number of substitution attempts for a string of `len` characters.
pub fn attempt_count(len: usize, ratio: f32) -> usize {
    (len as f32 * ratio.max(0.0)).round() as usize
}

/// Replace roughly `ratio` of the characters of `original` with glitch glyphs.
pub fn corrupt_string<R: Rng + ?Sized>(original: &str, ratio: f32, rng: &mut R) -> String {
    corrupt(original, ratio, rng).text
}

/// Like [`corrupt_string`] but reports how many substitutions landed.
///
/// Positions are drawn independently, so the same position can be hit more
/// than once. Whitespace and control characters are never replaced.
pub fn corrupt<R: Rng + ?Sized>(original: &str, ratio: f32, rng: &mut R) -> Corrupted {
    let mut chars: Vec<char> = original.chars().collect();
    if chars.is_empty() {
        return Corrupted { text: String::new(), substitutions: 0 };
    }

    let attempts = attempt_count(chars.len(), ratio);
    let mut substitutions = 0;
    for _ in 0..attempts {
        let index = rng.gen_range(0..chars.len());
        if chars[index].is_whitespace() || chars[index].is_control() {
            continue;
        }
        chars[index] = GLITCH_GLYPHS[rng.gen_range(0..GLITCH_GLYPHS.len())];
        substitutions += 1;
    }

    Corrupted { text: chars.into_iter().collect(), substitutions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn zero_ratio_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = corrupt("Shovel: dig with it", 0.0, &mut rng);
        assert_eq!(out.text, "Shovel: dig with it");
        assert_eq!(out.substitutions, 0);
    }

    #[test]
    fn whitespace_survives_any_ratio() {
        let mut rng = StdRng::seed_from_u64(7);
        let original = "a b\tc\nd  e";
        for _ in 0..50 {
            let out = corrupt_string(original, 1.0, &mut rng);
            let ws_in: Vec<(usize, char)> =
                original.chars().enumerate().filter(|(_, c)| c.is_whitespace()).collect();
            let ws_out: Vec<(usize, char)> =
                out.chars().enumerate().filter(|(_, c)| c.is_whitespace()).collect();
            assert_eq!(ws_in, ws_out);
            assert_eq!(out.chars().count(), original.chars().count());
        }
    }

    #[test]
    fn full_ratio_without_whitespace_lands_every_attempt() {
        let mut rng = StdRng::seed_from_u64(3);
        let original = "FLASHLIGHT";
        let out = corrupt(original, 1.0, &mut rng);
        assert_eq!(out.substitutions, original.len());
        assert!(out.text.chars().all(|c| GLITCH_GLYPHS.contains(&c) || original.contains(c)));
    }

    #[test]
    fn attempts_round_to_nearest() {
        assert_eq!(attempt_count(10, 0.25), 3);
        assert_eq!(attempt_count(10, 0.24), 2);
        assert_eq!(attempt_count(0, 1.0), 0);
        assert_eq!(attempt_count(4, -1.0), 0);
    }

    #[test]
    fn empty_string_stays_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(corrupt_string("", 0.9, &mut rng), "");
    }

    #[test]
    fn multibyte_text_keeps_char_count() {
        let mut rng = StdRng::seed_from_u64(11);
        let original = "Größe ∞ café";
        let out = corrupt_string(original, 0.6, &mut rng);
        assert_eq!(out.chars().count(), original.chars().count());
    }
}
