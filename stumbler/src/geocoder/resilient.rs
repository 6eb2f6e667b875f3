//! Cached, rate-bounded, breaker-guarded address lookups.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Semaphore;

use super::circuit_breaker::{CircuitBreaker, DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD};
use super::{AddressLookup, GeocodeError};
use crate::observation::Coordinate;

/// Default number of lookups allowed in flight across all keys.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default number of cached addresses.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Settings for [`ResilientGeocoder`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderConfig {
    pub max_concurrent: usize,
    pub failure_threshold: u32,
    pub cooldown: Duration,
    /// Lifetime of cached addresses. `None` keeps them for the life of the process.
    pub cache_ttl: Option<Duration>,
    pub cache_capacity: u64,
    /// When false, every call returns `None` without touching the lookup.
    pub enabled: bool,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
            cache_ttl: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    coordinate: Coordinate,
    locale: String,
}

/// Why a cache initialiser produced no value.
#[derive(Debug)]
enum Uncached {
    /// The breaker opened while the call was queued.
    ShortCircuited,
    Failed(GeocodeError),
}

/// Address lookups with caching, bounded concurrency and a circuit breaker.
///
/// Concurrent callers asking for the same `(coordinate, locale)` share one
/// underlying lookup. Successful results (including "no address") are
/// cached; failures are not.
pub struct ResilientGeocoder<L> {
    lookup: Arc<L>,
    cache: Cache<CacheKey, Option<String>>,
    permits: Semaphore,
    breaker: CircuitBreaker,
    enabled: bool,
}

impl<L: AddressLookup> ResilientGeocoder<L> {
    pub fn new(lookup: Arc<L>, config: GeocoderConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.cache_capacity);
        if let Some(ttl) = config.cache_ttl {
            builder = builder.time_to_live(ttl);
        }
        let max_concurrent = config.max_concurrent.max(1);

        tracing::info!(
            max_concurrent,
            failure_threshold = config.failure_threshold,
            cooldown_secs = config.cooldown.as_secs(),
            enabled = config.enabled,
            "Geocoder initialized"
        );

        Self {
            lookup,
            cache: builder.build(),
            permits: Semaphore::new(max_concurrent),
            breaker: CircuitBreaker::new(config.failure_threshold, config.cooldown),
            enabled: config.enabled,
        }
    }

    /// Address for `coordinate` in `locale`.
    ///
    /// Returns `Ok(None)` when no address is known, when the geocoder is
    /// disabled, or while the circuit breaker is open. Non-transport errors
    /// from the lookup are returned unchanged.
    pub async fn get_address(
        &self,
        locale: &str,
        coordinate: Coordinate,
    ) -> Result<Option<String>, GeocodeError> {
        if !self.enabled {
            return Ok(None);
        }

        let key = CacheKey {
            coordinate,
            locale: locale.to_string(),
        };
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }

        if !self.breaker.allow_request() {
            return Ok(None);
        }

        match self
            .cache
            .try_get_with(key, self.lookup_uncached(locale, coordinate))
            .await
        {
            Ok(address) => Ok(address),
            Err(err) => match err.as_ref() {
                Uncached::ShortCircuited => Ok(None),
                Uncached::Failed(e) => Err(e.clone()),
            },
        }
    }

    /// [`get_address`](Self::get_address) bounded by `deadline`.
    ///
    /// An expired deadline yields [`GeocodeError::DeadlineExceeded`]; the
    /// abandoned lookup leaves neither a cache entry nor a recorded failure.
    pub async fn get_address_within(
        &self,
        locale: &str,
        coordinate: Coordinate,
        deadline: Duration,
    ) -> Result<Option<String>, GeocodeError> {
        tokio::time::timeout(deadline, self.get_address(locale, coordinate))
            .await
            .map_err(|_| GeocodeError::DeadlineExceeded)?
    }

    async fn lookup_uncached(
        &self,
        locale: &str,
        coordinate: Coordinate,
    ) -> Result<Option<String>, Uncached> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Uncached::ShortCircuited)?;

        // Failures may have accumulated while this call waited for a permit.
        if !self.breaker.allow_request() {
            return Err(Uncached::ShortCircuited);
        }

        match self.lookup.lookup(locale, coordinate).await {
            Ok(address) => {
                self.breaker.record_success();
                Ok(address)
            }
            Err(e) => {
                if e.is_transport() {
                    self.breaker.record_failure();
                }
                tracing::debug!(
                    latitude = coordinate.latitude(),
                    longitude = coordinate.longitude(),
                    error = %e,
                    "Address lookup failed"
                );
                Err(Uncached::Failed(e))
            }
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoder::CircuitState;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Lookup returning scripted outcomes, then `Ok(Some("Main St"))`.
    struct ScriptedLookup {
        delay: Duration,
        outcomes: Mutex<VecDeque<Result<Option<String>, GeocodeError>>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedLookup {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                outcomes: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn then(self, outcome: Result<Option<String>, GeocodeError>) -> Self {
            self.outcomes.lock().unwrap().push_back(outcome);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AddressLookup for ScriptedLookup {
        async fn lookup(
            &self,
            _locale: &str,
            _coordinate: Coordinate,
        ) -> Result<Option<String>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Some("Main St".to_string())))
        }
    }

    fn coord(lat: f64) -> Coordinate {
        Coordinate::new(lat, 13.4).unwrap()
    }

    fn transport() -> Result<Option<String>, GeocodeError> {
        Err(GeocodeError::Transport("connection reset".into()))
    }

    fn geocoder(lookup: ScriptedLookup) -> (Arc<ScriptedLookup>, ResilientGeocoder<ScriptedLookup>) {
        let lookup = Arc::new(lookup);
        let geocoder = ResilientGeocoder::new(Arc::clone(&lookup), GeocoderConfig::default());
        (lookup, geocoder)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_lookup() {
        let (lookup, geocoder) = geocoder(ScriptedLookup::new(Duration::from_millis(100)));

        let (a, b) = tokio::join!(
            geocoder.get_address("en", coord(52.5)),
            geocoder.get_address("en", coord(52.5)),
        );

        assert_eq!(a.unwrap().as_deref(), Some("Main St"));
        assert_eq!(b.unwrap().as_deref(), Some("Main St"));
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_result_is_cached_per_locale() {
        let (lookup, geocoder) = geocoder(ScriptedLookup::new(Duration::ZERO));

        geocoder.get_address("en", coord(52.5)).await.unwrap();
        geocoder.get_address("en", coord(52.5)).await.unwrap();
        assert_eq!(lookup.calls(), 1);

        geocoder.get_address("de", coord(52.5)).await.unwrap();
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_address_is_cached() {
        let (lookup, geocoder) = geocoder(ScriptedLookup::new(Duration::ZERO).then(Ok(None)));

        assert_eq!(geocoder.get_address("en", coord(0.0)).await.unwrap(), None);
        assert_eq!(geocoder.get_address("en", coord(0.0)).await.unwrap(), None);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let (lookup, geocoder) = geocoder(ScriptedLookup::new(Duration::ZERO).then(transport()));

        assert!(geocoder.get_address("en", coord(52.5)).await.is_err());
        assert_eq!(
            geocoder.get_address("en", coord(52.5)).await.unwrap().as_deref(),
            Some("Main St")
        );
        assert_eq!(lookup.calls(), 2);
        assert_eq!(geocoder.breaker().consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_short_circuits_until_cooldown() {
        let (lookup, geocoder) = geocoder(
            ScriptedLookup::new(Duration::ZERO)
                .then(transport())
                .then(transport())
                .then(transport()),
        );

        for i in 0..3 {
            assert!(geocoder.get_address("en", coord(i as f64)).await.is_err());
        }
        assert_eq!(geocoder.breaker().state(), CircuitState::Open);

        assert_eq!(geocoder.get_address("en", coord(10.0)).await.unwrap(), None);
        assert_eq!(lookup.calls(), 3, "open breaker must not invoke the lookup");

        tokio::time::advance(DEFAULT_COOLDOWN).await;

        assert_eq!(
            geocoder.get_address("en", coord(10.0)).await.unwrap().as_deref(),
            Some("Main St")
        );
        assert_eq!(lookup.calls(), 4);
        assert_eq!(geocoder.breaker().state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transport_errors_propagate_without_tripping() {
        let lookup = (0..5).fold(ScriptedLookup::new(Duration::ZERO), |l, _| {
            l.then(Err(GeocodeError::InvalidInput("bad locale".into())))
        });
        let (lookup, geocoder) = geocoder(lookup);

        for _ in 0..5 {
            let err = geocoder.get_address("xx", coord(1.0)).await.unwrap_err();
            assert_eq!(err, GeocodeError::InvalidInput("bad locale".into()));
        }
        assert_eq!(lookup.calls(), 5);
        assert_eq!(geocoder.breaker().consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let (lookup, geocoder) = geocoder(ScriptedLookup::new(Duration::from_millis(50)));

        let calls = (0..12).map(|i| geocoder.get_address("en", coord(i as f64)));
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(lookup.calls(), 12);
        assert!(lookup.max_in_flight.load(Ordering::SeqCst) <= DEFAULT_MAX_CONCURRENT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_does_not_poison_cache_or_breaker() {
        let (lookup, geocoder) = geocoder(ScriptedLookup::new(Duration::from_secs(5)));

        let err = geocoder
            .get_address_within("en", coord(52.5), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, GeocodeError::DeadlineExceeded);
        assert_eq!(geocoder.breaker().consecutive_failures(), 0);

        let address = geocoder
            .get_address_within("en", coord(52.5), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(address.as_deref(), Some("Main St"));
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_geocoder_never_calls_lookup() {
        let lookup = Arc::new(ScriptedLookup::new(Duration::ZERO));
        let config = GeocoderConfig {
            enabled: false,
            ..GeocoderConfig::default()
        };
        let geocoder = ResilientGeocoder::new(Arc::clone(&lookup), config);

        assert_eq!(geocoder.get_address("en", coord(1.0)).await.unwrap(), None);
        assert_eq!(lookup.calls(), 0);
        assert!(!geocoder.is_enabled());
    }
}
