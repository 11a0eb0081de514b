use rand::Rng;

pub const CODE_LEN: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces a short, human-enterable attendance code. Codes are scoped by
/// classroom plus the active-session lookup, so cross-classroom collisions
/// are fine; the issuer re-checks against the classroom's own active code.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn code_is_six_uppercase_alphanumerics() {
        for _ in 0..100 {
            let code = generate();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn codes_are_not_a_trivial_sequence() {
        let codes: HashSet<String> = (0..100).map(|_| generate()).collect();
        // 36^6 possibilities; a hundred draws colliding heavily would mean a
        // broken generator, not bad luck.
        assert!(codes.len() > 95);
    }
}
