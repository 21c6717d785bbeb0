//! Small stateless helpers with no better home.
use rand::{distributions::Alphanumeric, Rng};

/// Length of the per-party magic-link secrets.
const MAGIC_TOKEN_LEN: usize = 32;

/// Generate a fresh magic-link token: 32 alphanumeric characters from the thread-local CSPRNG.
///
/// These tokens are bearer secrets. Treat them like passwords: embed them in outbound mail links, compare them,
/// but never write them to logs.
pub fn new_magic_token() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(MAGIC_TOKEN_LEN).map(char::from).collect()
}

/// Generate a trade id: 16 lowercase hex characters. Ids are public (they appear in URLs), so they are generated
/// separately from the secret tokens.
pub fn new_trade_id() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_shape() {
        let t = new_magic_token();
        assert_eq!(t.len(), 32);
        assert!(t.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn trade_id_shape() {
        let id = new_trade_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn mini_fuzz() {
        for _ in 0..1000 {
            assert_ne!(new_magic_token(), new_magic_token());
        }
    }
}
