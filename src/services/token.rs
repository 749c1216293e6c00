use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generates a fresh access token.
///
/// The primary path draws 128 random bits from the OS RNG and formats them
/// as a v4 UUID. If the OS RNG is unavailable, falls back to
/// [`pseudo_random_token`], which only offers best-effort uniqueness.
pub fn generate() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(e) => {
            tracing::warn!("⚠️  OS RNG unavailable ({}), using pseudo-random token", e);
            pseudo_random_token()
        }
    }
}

/// Mints a UUID-shaped token from a seeded PRNG.
///
/// Degraded path: the seed is derived from the wall clock and a process-wide
/// counter, so collision resistance is weaker than the OS RNG path.
fn pseudo_random_token() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let seed = nanos ^ counter.wrapping_mul(0x9E37_79B9_7F4A_7C15);

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}
