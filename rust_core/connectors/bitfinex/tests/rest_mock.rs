use connector_bitfinex::poll::fetch_state;
use connector_bitfinex::{BitfinexConfig, BitfinexRest, FundingBookSource};
use connectors_common::types::DisplayState;
use connectors_common::ConnectorError;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BitfinexRest {
    BitfinexRest::new(BitfinexConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_and_splits_funding_book() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/fUSD/P0"))
        .and(query_param("len", "25"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[[0.0001,2,3,-500],[0.00012,30,1,-250],[0.0002,2,10,1000],[0.00025,7,2,400]]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let snap = client_for(&server).fetch_funding_book().await.unwrap();
    assert_eq!(snap.bids.len(), 2);
    assert_eq!(snap.asks.len(), 2);
    assert!(snap.bids.iter().all(|o| o.amount > 0.0));
}

#[tokio::test]
async fn ready_state_has_running_sums() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/fUSD/P0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[[0.0001,2,3,-500],[0.00012,30,1,-250],[0.00025,7,2,400],[0.0002,2,10,1000]]"#,
        ))
        .mount(&server)
        .await;

    match fetch_state(&client_for(&server)).await {
        DisplayState::Ready(view) => {
            let bid_cum: Vec<f64> = view.bids.iter().map(|l| l.cumulative).collect();
            let ask_cum: Vec<f64> = view.asks.iter().map(|l| l.cumulative).collect();
            assert_eq!(bid_cum, vec![250.0, 750.0]);
            assert_eq!(ask_cum, vec![1000.0, 1400.0]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn error_envelope_on_500_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"["error",10020,"symbol: invalid"]"#))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_funding_book().await.unwrap_err();
    assert!(matches!(err, ConnectorError::Upstream { code: 10020, .. }));
}

#[tokio::test]
async fn non_success_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("ratelimit"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_funding_book().await.unwrap_err();
    match err {
        ConnectorError::Http { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "ratelimit");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn empty_and_failed_responses_become_display_states() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;
    assert!(matches!(fetch_state(&client_for(&server)).await, DisplayState::Empty { .. }));

    let unreachable = BitfinexRest::new(BitfinexConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_millis(500),
        ..Default::default()
    })
    .unwrap();
    assert!(fetch_state(&unreachable).await.is_error());
}
