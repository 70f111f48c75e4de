//! Session tickets sealed under a fixed symmetric key.
//!
//! The server issues tickets encrypted with a key supplied at startup and
//! never rotated, so a ticket stays valid across reconnects (and across
//! server restarts with the same key) without any server-side session
//! storage.
//!
//! Ticket layout: `key_name (16) || nonce (12) || AES-256-GCM(state) || tag (16)`.
//! The key name is a digest of the key, bound in as associated data, so a
//! ticket from a different key is rejected before decryption.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::digest::{digest, SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use rustls::server::ProducesTickets;

use crate::error::{ProtoError, Result};

/// Length of the static ticket key in bytes.
pub const TICKET_KEY_LEN: usize = 32;

/// Ticket lifetime hint sent to clients (6 hours).
pub const TICKET_LIFETIME_SECS: u32 = 6 * 60 * 60;

const KEY_NAME_LEN: usize = 16;
const HEADER_LEN: usize = KEY_NAME_LEN + NONCE_LEN;

/// Produces and opens session tickets with one static AES-256-GCM key.
pub struct StaticTicketer {
    key: LessSafeKey,
    key_name: [u8; KEY_NAME_LEN],
    rng: SystemRandom,
}

impl StaticTicketer {
    pub fn new(key: &[u8; TICKET_KEY_LEN]) -> Result<Self> {
        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| ProtoError::TlsConfiguration("invalid ticket key".into()))?;

        let mut key_name = [0u8; KEY_NAME_LEN];
        key_name.copy_from_slice(&digest(&SHA256, key).as_ref()[..KEY_NAME_LEN]);

        Ok(Self {
            key: LessSafeKey::new(unbound),
            key_name,
            rng: SystemRandom::new(),
        })
    }

    fn tag_len(&self) -> usize {
        self.key.algorithm().tag_len()
    }
}

impl std::fmt::Debug for StaticTicketer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTicketer")
            .field("lifetime", &TICKET_LIFETIME_SECS)
            .finish_non_exhaustive()
    }
}

impl ProducesTickets for StaticTicketer {
    fn enabled(&self) -> bool {
        true
    }

    fn lifetime(&self) -> u32 {
        TICKET_LIFETIME_SECS
    }

    fn encrypt(&self, plain: &[u8]) -> Option<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce_bytes).ok()?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut out = Vec::with_capacity(HEADER_LEN + plain.len() + self.tag_len());
        out.extend_from_slice(&self.key_name);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(plain);

        let tag = self
            .key
            .seal_in_place_separate_tag(nonce, Aad::from(&self.key_name), &mut out[HEADER_LEN..])
            .ok()?;
        out.extend_from_slice(tag.as_ref());
        Some(out)
    }

    fn decrypt(&self, cipher: &[u8]) -> Option<Vec<u8>> {
        if cipher.len() < HEADER_LEN + self.tag_len() {
            return None;
        }

        let (key_name, rest) = cipher.split_at(KEY_NAME_LEN);
        if key_name != self.key_name {
            return None;
        }

        let (nonce_bytes, sealed) = rest.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).ok()?;

        let mut buf = sealed.to_vec();
        let plain = self
            .key
            .open_in_place(nonce, Aad::from(&self.key_name), &mut buf)
            .ok()?;
        Some(plain.to_vec())
    }
}

/// Interpret a configured ticket key. It must be exactly 32 bytes.
pub fn parse_ticket_key(raw: &str) -> Result<[u8; TICKET_KEY_LEN]> {
    raw.as_bytes().try_into().map_err(|_| {
        ProtoError::TlsConfiguration(format!(
            "ticket key must be exactly {TICKET_KEY_LEN} bytes, got {}",
            raw.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz012345";

    #[test]
    fn opens_its_own_tickets() {
        let ticketer = StaticTicketer::new(KEY).unwrap();
        let ticket = ticketer.encrypt(b"session state").expect("encrypt");
        assert_eq!(ticketer.decrypt(&ticket).as_deref(), Some(&b"session state"[..]));
    }

    #[test]
    fn another_instance_with_same_key_opens_tickets() {
        let issuer = StaticTicketer::new(KEY).unwrap();
        let restarted = StaticTicketer::new(KEY).unwrap();
        let ticket = issuer.encrypt(b"state").unwrap();
        assert!(restarted.decrypt(&ticket).is_some());
    }

    #[test]
    fn rejects_ticket_from_other_key() {
        let issuer = StaticTicketer::new(KEY).unwrap();
        let other = StaticTicketer::new(&[7u8; 32]).unwrap();
        let ticket = issuer.encrypt(b"state").unwrap();
        assert!(other.decrypt(&ticket).is_none());
    }

    #[test]
    fn rejects_tampered_ticket() {
        let ticketer = StaticTicketer::new(KEY).unwrap();
        let mut ticket = ticketer.encrypt(b"state").unwrap();
        let last = ticket.len() - 1;
        ticket[last] ^= 0x01;
        assert!(ticketer.decrypt(&ticket).is_none());
    }

    #[test]
    fn rejects_truncated_ticket() {
        let ticketer = StaticTicketer::new(KEY).unwrap();
        assert!(ticketer.decrypt(&[0u8; 10]).is_none());
        assert!(ticketer.decrypt(&[]).is_none());
    }

    #[test]
    fn nonces_differ_between_tickets() {
        let ticketer = StaticTicketer::new(KEY).unwrap();
        let a = ticketer.encrypt(b"state").unwrap();
        let b = ticketer.encrypt(b"state").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn ticket_key_must_be_32_bytes() {
        assert!(parse_ticket_key("abcdefghijklmnopqrstuvwxyz012345").is_ok());
        assert!(parse_ticket_key("short").is_err());
        assert!(parse_ticket_key(&"x".repeat(33)).is_err());
    }
}
