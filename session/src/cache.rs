//! Time-boxed cache of the decoded session claims

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use derivative::Derivative;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::claims::{SessionClaims, fingerprint};
use crate::clock::{Clock, SystemClock};
use crate::store::{Error as StoreError, TOKEN_KEY, TokenStore};

/// How long decoded claims are served without looking at the token again
pub const DEFAULT_CACHE_WINDOW: Duration = Duration::from_secs(30);

/// Claims decoded from a particular token
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Token the claims were decoded from
    raw_token: String,
    /// Decoded claims
    claims: SessionClaims,
    /// When the entry was created
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Checks if the entry can be served for the currently persisted token
    fn is_valid(&self, token: &str, now: DateTime<Utc>, window: TimeDelta) -> bool {
        self.raw_token == token && now - self.cached_at < window && !self.claims.is_expired_at(now)
    }
}

/// Read access to the identity of the logged in user
///
/// The persisted token is the source of truth, the cache only remembers what was decoded from it
/// for at most the configured window. Accessors never fail: missing, malformed and expired tokens
/// all mean "nobody is logged in". An expired token is removed from the store as soon as it is
/// noticed.
///
/// All accessors take `&self`; the single cache entry is guarded by a mutex held for the whole
/// resolution, so concurrent callers never observe a half updated entry.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SessionCache {
    /// Persisted token storage
    #[derivative(Debug = "ignore")]
    store: Arc<dyn TokenStore>,
    /// Time source
    #[derivative(Debug = "ignore")]
    clock: Arc<dyn Clock>,
    /// Maximal age of the served entry
    window: TimeDelta,
    /// The only cache entry
    entry: Mutex<Option<CacheEntry>>,
    /// Number of token decodes performed
    decodes: AtomicU64,
}

impl SessionCache {
    /// Creates cache over the given store, using the wall clock and the default window
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            window: TimeDelta::from_std(DEFAULT_CACHE_WINDOW).unwrap_or(TimeDelta::MAX),
            entry: Mutex::new(None),
            decodes: AtomicU64::new(0),
        }
    }

    /// Replaces the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the cache window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        self
    }

    /// Underlying token store
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// The persisted token as is, without any validation
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    /// Id of the logged in user
    pub fn user_id(&self) -> Option<String> {
        self.resolve_claims()
            .map(|claims| claims.subject)
            .filter(|id| !id.is_empty())
    }

    /// Display name of the logged in user
    pub fn username(&self) -> Option<String> {
        self.resolve_claims()
            .map(|claims| claims.username)
            .filter(|name| !name.is_empty())
    }

    /// Email of the logged in user
    pub fn user_email(&self) -> Option<String> {
        self.resolve_claims()
            .map(|claims| claims.email)
            .filter(|email| !email.is_empty())
    }

    /// All claims of the current session
    pub fn claims(&self) -> Option<SessionClaims> {
        self.resolve_claims()
    }

    /// Checks if there is a valid, unexpired session
    pub fn is_authenticated(&self) -> bool {
        self.resolve_claims().is_some()
    }

    /// Drops the cache entry, next access decodes the persisted token again
    pub fn clear_cache(&self) {
        if self.entry.lock().take().is_some() {
            debug!("Session cache cleared");
        }
    }

    /// Persists a freshly issued token
    pub fn sign_in(&self, token: &str) -> Result<(), StoreError> {
        let mut entry = self.entry.lock();
        *entry = None;
        self.store.set(TOKEN_KEY, token)?;

        info!(token = %fingerprint(token), "Session token stored");
        Ok(())
    }

    /// Forgets the session, removing the persisted token
    pub fn sign_out(&self) -> Result<(), StoreError> {
        let mut entry = self.entry.lock();
        *entry = None;
        self.store.remove(TOKEN_KEY)?;

        info!("Session token removed");
        Ok(())
    }

    /// Number of times a token was decoded by this cache
    pub fn decode_count(&self) -> u64 {
        self.decodes.load(Ordering::Relaxed)
    }

    fn resolve_claims(&self) -> Option<SessionClaims> {
        let mut entry = self.entry.lock();

        let Some(token) = self.store.get(TOKEN_KEY) else {
            *entry = None;
            return None;
        };

        let now = self.clock.now();
        if let Some(cached) = entry
            .as_ref()
            .filter(|cached| cached.is_valid(&token, now, self.window))
        {
            return Some(cached.claims.clone());
        }

        self.decodes.fetch_add(1, Ordering::Relaxed);
        let claims = match SessionClaims::decode(&token) {
            Ok(claims) => claims,
            Err(err) => {
                warn!(token = %fingerprint(&token), error = %err, "Malformed session token");
                *entry = None;
                return None;
            }
        };

        if claims.is_expired_at(now) {
            info!(
                token = %fingerprint(&token),
                expires_at = claims.expires_at,
                "Session token expired"
            );

            if let Err(err) = self.store.remove(TOKEN_KEY) {
                warn!(error = %err, "Cannot remove expired session token");
            }
            *entry = None;
            return None;
        }

        debug!(token = %fingerprint(&token), "Session claims decoded");
        *entry = Some(CacheEntry {
            raw_token: token,
            claims: claims.clone(),
            cached_at: now,
        });

        Some(claims)
    }
}

#[cfg(test)]
mod tests {
    use base64::prelude::*;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn token(sub: &str, username: &str, email: &str, exp: i64) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"{sub}","username":"{username}","email":"{email}","exp":{exp}}}"#
        ));
        format!("{header}.{payload}.signature")
    }

    struct Setup {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        cache: SessionCache,
    }

    fn setup() -> Setup {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let cache = SessionCache::new(store.clone()).with_clock(clock.clone());

        Setup {
            store,
            clock,
            cache,
        }
    }

    impl Setup {
        fn now(&self) -> i64 {
            self.clock.now().timestamp()
        }
    }

    #[test]
    fn no_token_means_no_identity() {
        let s = setup();

        assert_eq!(s.cache.user_id(), None);
        assert_eq!(s.cache.username(), None);
        assert_eq!(s.cache.user_email(), None);
        assert!(!s.cache.is_authenticated());
        assert_eq!(s.cache.decode_count(), 0);
    }

    #[test]
    fn removed_token_drops_cache_entry() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 3600))
            .unwrap();

        assert_eq!(s.cache.user_id().as_deref(), Some("u1"));
        assert!(s.cache.entry.lock().is_some());

        s.store.remove(TOKEN_KEY).unwrap();
        assert_eq!(s.cache.user_id(), None);
        assert!(s.cache.entry.lock().is_none());
    }

    #[test]
    fn claims_are_cached_within_window() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 3600))
            .unwrap();

        assert_eq!(s.cache.user_id().as_deref(), Some("u1"));
        assert_eq!(s.cache.username().as_deref(), Some("alice"));
        s.clock.advance(TimeDelta::seconds(29));
        assert_eq!(s.cache.user_email().as_deref(), Some("a@x.com"));

        assert_eq!(s.cache.decode_count(), 1);
    }

    #[test]
    fn window_expiry_causes_single_redecode() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 3600))
            .unwrap();

        for _ in 0..3 {
            assert_eq!(s.cache.username().as_deref(), Some("alice"));
            s.clock.advance(TimeDelta::seconds(1));
        }
        assert_eq!(s.cache.decode_count(), 1);

        s.clock.advance(TimeDelta::seconds(31));
        assert_eq!(s.cache.username().as_deref(), Some("alice"));
        assert_eq!(s.cache.username().as_deref(), Some("alice"));
        assert_eq!(s.cache.decode_count(), 2);
    }

    #[test]
    fn expired_token_is_removed() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() - 1))
            .unwrap();

        assert_eq!(s.cache.user_id(), None);
        assert_eq!(s.store.get(TOKEN_KEY), None);

        // Idempotent
        assert_eq!(s.cache.username(), None);
        assert_eq!(s.cache.user_email(), None);
        assert_eq!(s.cache.decode_count(), 1);
    }

    #[test]
    fn token_expiring_exactly_now_is_expired() {
        let s = setup();
        let expires_at = s.now() + 600;
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", expires_at))
            .unwrap();
        assert!(s.cache.is_authenticated());

        s.clock
            .set(DateTime::from_timestamp(expires_at, 0).unwrap());
        assert!(!s.cache.is_authenticated());
        assert_eq!(s.store.get(TOKEN_KEY), None);
    }

    #[test]
    fn token_expiring_within_window_is_not_served() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 10))
            .unwrap();

        assert_eq!(s.cache.user_id().as_deref(), Some("u1"));

        s.clock.advance(TimeDelta::seconds(10));
        assert_eq!(s.cache.user_id(), None);
        assert_eq!(s.store.get(TOKEN_KEY), None);
    }

    #[test]
    fn changed_token_is_redecoded() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 3600))
            .unwrap();
        assert_eq!(s.cache.username().as_deref(), Some("alice"));

        s.store
            .set(TOKEN_KEY, &token("u2", "bob", "b@x.com", s.now() + 3600))
            .unwrap();
        assert_eq!(s.cache.username().as_deref(), Some("bob"));
        assert_eq!(s.cache.user_id().as_deref(), Some("u2"));
        assert_eq!(s.cache.decode_count(), 2);
    }

    #[test]
    fn malformed_token_is_safe() {
        let s = setup();
        s.store.set(TOKEN_KEY, "definitely.not.a-jwt").unwrap();

        assert_eq!(s.cache.user_id(), None);
        assert_eq!(s.cache.username(), None);
        assert_eq!(s.cache.user_email(), None);
        assert!(s.cache.entry.lock().is_none());

        // Malformed token is not an expired one, it stays in the store
        assert_eq!(s.store.get(TOKEN_KEY).as_deref(), Some("definitely.not.a-jwt"));
    }

    #[test]
    fn malformed_token_replacing_valid_one_drops_entry() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 3600))
            .unwrap();
        assert!(s.cache.is_authenticated());

        s.store.set(TOKEN_KEY, "garbage").unwrap();
        assert!(!s.cache.is_authenticated());
        assert!(s.cache.entry.lock().is_none());
    }

    #[test]
    fn clear_cache_forces_single_decode() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 3600))
            .unwrap();

        assert_eq!(s.cache.user_id().as_deref(), Some("u1"));
        assert_eq!(s.cache.decode_count(), 1);

        s.cache.clear_cache();
        assert!(s.cache.entry.lock().is_none());

        assert_eq!(s.cache.user_id().as_deref(), Some("u1"));
        assert_eq!(s.cache.user_id().as_deref(), Some("u1"));
        assert_eq!(s.cache.decode_count(), 2);
    }

    #[test]
    fn empty_claims_are_absent() {
        let s = setup();
        s.store
            .set(TOKEN_KEY, &token("u1", "", "", s.now() + 3600))
            .unwrap();

        assert_eq!(s.cache.user_id().as_deref(), Some("u1"));
        assert_eq!(s.cache.username(), None);
        assert_eq!(s.cache.user_email(), None);
    }

    #[test]
    fn sign_in_and_out() {
        let s = setup();
        let t1 = token("u1", "alice", "a@x.com", s.now() + 3600);
        let t2 = token("u2", "bob", "b@x.com", s.now() + 3600);

        s.cache.sign_in(&t1).unwrap();
        assert_eq!(s.cache.token().as_deref(), Some(t1.as_str()));
        assert_eq!(s.cache.username().as_deref(), Some("alice"));

        s.cache.sign_in(&t2).unwrap();
        assert_eq!(s.cache.username().as_deref(), Some("bob"));

        s.cache.sign_out().unwrap();
        assert_eq!(s.store.get(TOKEN_KEY), None);
        assert_eq!(s.cache.username(), None);
    }

    #[test]
    fn configurable_window() {
        let s = setup();
        let cache = SessionCache::new(s.store.clone())
            .with_clock(s.clock.clone())
            .with_window(Duration::from_secs(5));
        s.store
            .set(TOKEN_KEY, &token("u1", "alice", "a@x.com", s.now() + 3600))
            .unwrap();

        assert!(cache.is_authenticated());
        s.clock.advance(TimeDelta::seconds(4));
        assert!(cache.is_authenticated());
        assert_eq!(cache.decode_count(), 1);

        s.clock.advance(TimeDelta::seconds(1));
        assert!(cache.is_authenticated());
        assert_eq!(cache.decode_count(), 2);
    }

    #[test]
    fn example_scenario() {
        let s = setup();
        let t1 = token("u1", "alice", "a@x.com", s.now() + 3600);
        s.store.set(TOKEN_KEY, &t1).unwrap();

        for _ in 0..3 {
            assert_eq!(s.cache.username().as_deref(), Some("alice"));
            s.clock.advance(TimeDelta::seconds(2));
        }
        assert_eq!(s.cache.decode_count(), 1);

        s.clock.advance(TimeDelta::seconds(31));
        assert_eq!(s.cache.username().as_deref(), Some("alice"));
        assert_eq!(s.cache.decode_count(), 2);

        let t2 = token("u1", "alice", "a@x.com", s.now() - 60);
        s.store.set(TOKEN_KEY, &t2).unwrap();
        assert_eq!(s.cache.user_email(), None);
        assert_eq!(s.store.get(TOKEN_KEY), None);
    }
}
