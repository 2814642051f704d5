use rand::Rng;
use serde::Serialize;

/// Password shared by every generated user.
///
/// Synthetic accounts are disposable, so a constant password is a deliberate simplification.
pub const PASSWORD: &str = "string";

const SUFFIX_LEN: usize = 8;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Registration payload for one simulated user. Serializes to the register request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentials {
    pub confirm_password: String,
    pub email: String,
    pub password: String,
    pub username: String,
}

/// Credentials for user `index`, unique across indices with overwhelming probability.
pub fn generate_user(index: u64) -> UserCredentials {
    generate_user_with(index, &mut rand::thread_rng())
}

pub fn generate_user_with<R: Rng + ?Sized>(index: u64, rng: &mut R) -> UserCredentials {
    let username = format!("user_{index}_{}", random_suffix(rng));
    let email = format!("user_{index}_{}@example.com", random_suffix(rng));

    UserCredentials {
        confirm_password: PASSWORD.to_string(),
        email,
        password: PASSWORD.to_string(),
        username,
    }
}

fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}
