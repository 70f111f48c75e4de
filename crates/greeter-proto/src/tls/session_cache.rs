//! Client-side session cache with least-recently-used eviction.
//!
//! rustls asks a [`ClientSessionStore`] for resumption state keyed by server
//! name. This store keeps at most `capacity` servers; touching a server (for
//! a lookup or an insert) makes it the most recently used, and inserting a
//! new server into a full cache evicts the least recently used one.
//!
//! Per server it remembers the key-exchange group hint, one TLS 1.2 session,
//! and a short queue of single-use TLS 1.3 tickets.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use rustls::client::{ClientSessionStore, Tls12ClientSessionValue, Tls13ClientSessionValue};
use rustls::NamedGroup;
use rustls_pki_types::ServerName;

/// TLS 1.3 tickets kept per server. Servers typically issue two per handshake.
const MAX_TLS13_TICKETS_PER_SERVER: usize = 8;

#[derive(Default)]
struct ServerData {
    kx_hint: Option<NamedGroup>,
    tls12: Option<Tls12ClientSessionValue>,
    tls13: VecDeque<Tls13ClientSessionValue>,
}

/// Bounded LRU [`ClientSessionStore`], shared by every connection made with
/// one client policy.
pub struct LruSessionStore {
    servers: Mutex<LruCache<ServerName<'static>, ServerData>>,
}

impl LruSessionStore {
    /// Create a store remembering at most `capacity` servers.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            servers: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of servers currently cached.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of servers cached.
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Returns true if `server_name` has an entry, without touching its
    /// recency.
    pub fn contains(&self, server_name: &ServerName<'_>) -> bool {
        self.lock().contains(&server_name.to_owned())
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<ServerName<'static>, ServerData>> {
        // Entries are plain data; a panic mid-update cannot leave them torn.
        self.servers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_entry<R>(&self, server_name: ServerName<'static>, f: impl FnOnce(&mut ServerData) -> R) -> R {
        let mut servers = self.lock();
        f(servers.get_or_insert_mut(server_name, ServerData::default))
    }

    fn with_existing<R>(
        &self,
        server_name: &ServerName<'_>,
        f: impl FnOnce(&mut ServerData) -> Option<R>,
    ) -> Option<R> {
        let mut servers = self.lock();
        servers.get_mut(&server_name.to_owned()).and_then(f)
    }
}

impl std::fmt::Debug for LruSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let servers = self.lock();
        f.debug_struct("LruSessionStore")
            .field("len", &servers.len())
            .field("capacity", &servers.cap())
            .finish()
    }
}

impl ClientSessionStore for LruSessionStore {
    fn set_kx_hint(&self, server_name: ServerName<'static>, group: NamedGroup) {
        self.with_entry(server_name, |data| data.kx_hint = Some(group));
    }

    fn kx_hint(&self, server_name: &ServerName<'_>) -> Option<NamedGroup> {
        self.with_existing(server_name, |data| data.kx_hint)
    }

    fn set_tls12_session(&self, server_name: ServerName<'static>, value: Tls12ClientSessionValue) {
        self.with_entry(server_name, |data| data.tls12 = Some(value));
    }

    fn tls12_session(&self, server_name: &ServerName<'_>) -> Option<Tls12ClientSessionValue> {
        self.with_existing(server_name, |data| data.tls12.clone())
    }

    fn remove_tls12_session(&self, server_name: &ServerName<'static>) {
        self.with_existing(server_name, |data| data.tls12.take());
    }

    fn insert_tls13_ticket(&self, server_name: ServerName<'static>, value: Tls13ClientSessionValue) {
        self.with_entry(server_name, |data| {
            if data.tls13.len() == MAX_TLS13_TICKETS_PER_SERVER {
                data.tls13.pop_front();
            }
            data.tls13.push_back(value);
        });
    }

    fn take_tls13_ticket(&self, server_name: &ServerName<'static>) -> Option<Tls13ClientSessionValue> {
        // Newest first: the most recent ticket has the longest remaining life.
        self.with_existing(server_name, |data| data.tls13.pop_back())
    }
}
