use super::*;
use crate::lookup::fake::FakeProvider;
use std::time::Duration;

fn gateway(provider: FakeProvider) -> (Arc<FakeProvider>, LookupGateway) {
    let provider = Arc::new(provider);
    let gateway = LookupGateway::new(provider.clone(), GatewayOptions::default());
    (provider, gateway)
}

fn catalogue() -> FakeProvider {
    FakeProvider::new()
        .with_film(949, "Heat", "1995-12-15", 170, 45.0, 7200)
        .with_film(1022, "Heat", "2022-06-01", 95, 3.0, 12)
        .with_film(329865, "Arrival", "2016-11-10", 116, 60.0, 18000)
        .with_film(77, "Paperman", "2012-11-02", 7, 8.0, 900)
}

#[tokio::test(start_paused = true)]
async fn test_heat_year_selects_1995() {
    let (_, gateway) = gateway(catalogue());
    let record = gateway
        .resolve(&Candidate::new("Heat", Some("1995")), 0)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.resolved_id, 949);
    assert_eq!(record.year, "1995");
    assert_eq!(record.key, "heat:1995");
    assert_eq!(record.runtime, 170);
    assert_eq!(record.vote_count, 7200);
}

#[tokio::test(start_paused = true)]
async fn test_year_without_release_is_null() {
    let provider = FakeProvider::new().with_film(1022, "Heat", "2022-06-01", 95, 3.0, 12);
    let (provider, gateway) = gateway(provider);

    let record = gateway.resolve(&Candidate::new("Heat", Some("1995")), 0).await.unwrap();
    assert!(record.is_none());
    // No details call for a rejected match
    assert_eq!(provider.detail_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_filter_discards_shorts() {
    let (_, gateway) = gateway(catalogue());
    let short = gateway.resolve(&Candidate::new("Paperman", Some("2012")), 45).await.unwrap();
    assert!(short.is_none());

    let unfiltered = gateway.resolve(&Candidate::new("Paperman", Some("2012")), 0).await.unwrap();
    assert_eq!(unfiltered.unwrap().runtime, 7);
}

#[tokio::test(start_paused = true)]
async fn test_batch_preserves_order_and_dedups() {
    let (provider, gateway) = gateway(catalogue());
    let candidates = vec![
        Candidate::new("Arrival", Some("2016")),
        Candidate::new("  ", None),
        Candidate::new("HEAT", Some("1995-12-15")),
        Candidate::new("arrival!", Some("2016")),
        Candidate::new("Unknown Film", None),
    ];

    let results = gateway.resolve_batch(&candidates, 45).await.unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results[0].as_ref().unwrap().resolved_id, 329865);
    assert!(results[1].is_none());
    assert_eq!(results[2].as_ref().unwrap().resolved_id, 949);
    assert_eq!(results[3], results[0]);
    assert!(results[4].is_none());

    // Arrival, Heat, Unknown searched once each; two detail calls
    assert_eq!(provider.search_calls(), 3);
    assert_eq!(provider.detail_calls(), 2);
    assert_eq!(gateway.dispatch_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_second_batch_hits_cache() {
    let (provider, gateway) = gateway(catalogue());
    let first = vec![Candidate::new("Arrival", Some("2016")), Candidate::new("Heat", Some("1995"))];
    gateway.resolve_batch(&first, 45).await.unwrap();
    let after_first = gateway.dispatch_count();
    assert_eq!(after_first, 4);

    let second = vec![Candidate::new("Heat", Some("1995")), Candidate::new("Arrival", Some("2016"))];
    let results = gateway.resolve_batch(&second, 45).await.unwrap();
    assert!(results.iter().all(Option::is_some));
    assert_eq!(gateway.dispatch_count(), after_first);
    assert_eq!(provider.search_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_expires_after_ttl() {
    let provider = Arc::new(catalogue());
    let gateway = LookupGateway::new(
        provider.clone(),
        GatewayOptions {
            max_calls_per_second: 40,
            cache_ttl: Duration::from_secs(60),
        },
    );
    let heat = Candidate::new("Heat", Some("1995"));

    gateway.resolve(&heat, 0).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    gateway.resolve(&heat, 0).await.unwrap();

    assert_eq!(provider.search_calls(), 2);
    assert_eq!(provider.detail_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_details_cache_shared_across_thresholds() {
    let (provider, gateway) = gateway(catalogue());
    let heat = Candidate::new("Heat", Some("1995"));

    gateway.resolve(&heat, 0).await.unwrap();
    gateway.resolve(&heat, 45).await.unwrap();

    // Different search-cache keys, same resolved id
    assert_eq!(provider.search_calls(), 2);
    assert_eq!(provider.detail_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_spacing_across_batch() {
    let provider = (0..8).fold(FakeProvider::new(), |p, i| {
        p.with_film(100 + i, &format!("Film {}", i), "2000-01-01", 100, 1.0, 1)
    });
    let (provider, gateway) = gateway(provider);
    let candidates: Vec<Candidate> = (0..8).map(|i| Candidate::new(format!("Film {}", i), None)).collect();

    gateway.resolve_batch(&candidates, 0).await.unwrap();

    let mut times = provider.call_times();
    times.sort();
    assert_eq!(times.len(), 16);
    let span = *times.last().unwrap() - times[0];
    assert!(span >= Duration::from_millis(25) * 15, "span was {:?}", span);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(25));
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_failure_is_isolated() {
    let (_, gateway) = gateway(catalogue().failing_on("Arrival"));
    let candidates = vec![Candidate::new("Arrival", Some("2016")), Candidate::new("Heat", Some("1995"))];

    let results = gateway.resolve_batch(&candidates, 0).await.unwrap();
    assert!(results[0].is_none());
    assert_eq!(results[1].as_ref().unwrap().resolved_id, 949);
}

#[tokio::test(start_paused = true)]
async fn test_total_failure_is_single_error() {
    let (_, gateway) = gateway(catalogue().failing_everything());
    let candidates = vec![
        Candidate::new("Arrival", Some("2016")),
        Candidate::new("Heat", Some("1995")),
        Candidate::new("Heat", Some("1995")),
    ];

    match gateway.resolve_batch(&candidates, 0).await {
        Err(GatewayError::Unavailable { attempted, last_error }) => {
            assert_eq!(attempted, 2);
            assert!(last_error.starts_with("HTTP 503"), "{}", last_error);
        }
        other => panic!("expected Unavailable, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_all_no_match_is_not_an_error() {
    let (_, gateway) = gateway(FakeProvider::new());
    let results = gateway
        .resolve_batch(&[Candidate::new("Nothing", None)], 0)
        .await
        .unwrap();
    assert_eq!(results, vec![None]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_batch() {
    let (provider, gateway) = gateway(catalogue());
    assert!(gateway.resolve_batch(&[], 0).await.unwrap().is_empty());
    assert_eq!(provider.search_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_match_outcome_is_cached() {
    let (provider, gateway) = gateway(catalogue());
    // Only 1995 and 2022 releases exist, so 1980 never matches
    let candidates = vec![Candidate::new("Heat", Some("1980"))];

    assert_eq!(gateway.resolve_batch(&candidates, 45).await.unwrap(), vec![None]);
    let after_first = gateway.dispatch_count();
    assert_eq!(after_first, 1);

    assert_eq!(gateway.resolve_batch(&candidates, 45).await.unwrap(), vec![None]);
    assert_eq!(gateway.dispatch_count(), after_first);
    assert_eq!(provider.search_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_short_match_outcome_is_cached_per_threshold() {
    let (provider, gateway) = gateway(catalogue());
    let paperman = Candidate::new("Paperman", Some("2012"));

    assert!(gateway.resolve(&paperman, 45).await.unwrap().is_none());
    assert!(gateway.resolve(&paperman, 45).await.unwrap().is_none());
    assert_eq!(provider.search_calls(), 1);
    assert_eq!(provider.detail_calls(), 1);

    // A looser threshold is its own query
    assert_eq!(gateway.resolve(&paperman, 0).await.unwrap().unwrap().runtime, 7);
    assert_eq!(provider.search_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_not_cached() {
    let (provider, gateway) = gateway(catalogue().failing_on("Arrival"));
    let arrival = Candidate::new("Arrival", Some("2016"));

    assert!(gateway.resolve(&arrival, 0).await.is_err());
    assert!(gateway.resolve(&arrival, 0).await.is_err());
    assert_eq!(provider.search_calls(), 2);
}

#[test]
fn test_options_from_config_saturate_ttl() {
    let config = TmdbConfig {
        cache_ttl_hours: u64::MAX,
        ..TmdbConfig::default()
    };
    let options = GatewayOptions::from(&config);
    assert_eq!(options.cache_ttl, Duration::from_secs(u64::MAX));

    let options = GatewayOptions::from(&TmdbConfig::default());
    assert_eq!(options.cache_ttl, Duration::from_secs(6 * 60 * 60));
}
