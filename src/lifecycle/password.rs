//! Root password generation for newly imaged machines.

use rand::seq::SliceRandom;

const PASSWORD_LENGTH: usize = 20;
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789@%&-_=+:~";

/// Generates the root password embedded in the reimage payload. The remote
/// side never reads it back, so the generated value is the only copy.
pub(crate) fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..PASSWORD_LENGTH)
        .filter_map(|_| PASSWORD_ALPHABET.choose(&mut rng))
        .map(|byte| char::from(*byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{PASSWORD_ALPHABET, PASSWORD_LENGTH, generate};

    #[test]
    fn passwords_have_the_documented_length() {
        assert_eq!(generate().chars().count(), PASSWORD_LENGTH);
    }

    #[test]
    fn passwords_draw_from_the_alphabet() {
        let password = generate();
        for ch in password.chars() {
            let mut buf = [0u8; 4];
            let encoded = ch.encode_utf8(&mut buf).as_bytes();
            assert!(
                encoded.len() == 1
                    && encoded
                        .first()
                        .is_some_and(|byte| PASSWORD_ALPHABET.contains(byte)),
                "unexpected password character: {ch}"
            );
        }
    }

    #[test]
    fn consecutive_passwords_differ() {
        assert_ne!(generate(), generate());
    }
}
