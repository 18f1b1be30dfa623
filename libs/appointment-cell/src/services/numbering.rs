use chrono::{DateTime, Utc};
use rand::Rng;

const PREFIX: &str = "APT";
const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 3;

/// Human-facing reference such as `APT482913K7Q`. Not guaranteed unique.
pub fn generate_appointment_number(now: DateTime<Utc>) -> String {
    generate_with_rng(now, &mut rand::thread_rng())
}

pub fn generate_with_rng<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{}{:06}{}", PREFIX, millis, suffix)
}
