use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lowercase base-36 string of the given length
pub fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

pub fn generate_session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("room_{}", random_base36(rng, 9))
}

pub fn generate_synthetic_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("AI_{}", random_base36(rng, 5))
}
