use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

const ID_SUFFIX_LEN: usize = 10;

/// Opaque completion id: fixed prefix plus a random alphanumeric suffix.
pub fn completion_id() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("chatcmpl-{}", suffix)
}
