//! Route fetching against a mock OSRM `route` service.

use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use collection_planner::model::Coordinate;
use collection_planner::osrm::{GeometryFormat, OsrmClient, OsrmConfig, RoutingError};
use collection_planner::polyline;
use collection_planner::route::RouteFetcher;
use collection_planner::traits::RoutingEngine;

fn client(base_url: String, geometries: GeometryFormat) -> OsrmClient {
    OsrmClient::new(OsrmConfig {
        base_url,
        geometries,
        timeout_secs: 5,
        ..OsrmConfig::default()
    })
    .expect("build OSRM client")
}

fn two_stops() -> Vec<Coordinate> {
    vec![Coordinate::new(41.0, 29.0), Coordinate::new(41.01, 29.01)]
}

#[tokio::test]
async fn requests_route_in_lng_lat_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/route/v1/driving/29.0,41.0;29.01,41.01"))
        .and(query_param("overview", "full"))
        .and(query_param("geometries", "geojson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Ok",
            "routes": [{
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[29.0, 41.0], [29.004, 41.006], [29.01, 41.01]]
                },
                "distance": 1843.2,
                "duration": 251.7
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = RouteFetcher::new(client(server.uri(), GeometryFormat::GeoJson));
    let route = fetcher.fetch(&two_stops(), "#FF3B30").await;

    assert!(!route.is_fallback());
    assert_eq!(
        route.path.points(),
        &[
            Coordinate::new(41.0, 29.0),
            Coordinate::new(41.006, 29.004),
            Coordinate::new(41.01, 29.01),
        ]
    );
    assert_eq!(route.summary.distance_label(), "1.8 km");
    assert_eq!(route.summary.duration_label(), "4 min");
}

#[tokio::test]
async fn decodes_polyline_geometry() {
    let expected = vec![
        Coordinate::new(41.0, 29.0),
        Coordinate::new(41.005, 29.002),
        Coordinate::new(41.01, 29.01),
    ];
    let encoded = polyline::encode(&expected, 6).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/"))
        .and(query_param("geometries", "polyline6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Ok",
            "routes": [{ "geometry": encoded, "distance": 1500.0, "duration": 200.0 }]
        })))
        .mount(&server)
        .await;

    let engine = client(server.uri(), GeometryFormat::Polyline6);
    let route = engine.route(&two_stops()).await.unwrap();
    for (actual, wanted) in route.path.points().iter().zip(&expected) {
        assert!((actual.lat - wanted.lat).abs() < 1e-6);
        assert!((actual.lng - wanted.lng).abs() < 1e-6);
    }
}

#[tokio::test]
async fn non_ok_code_falls_back_to_straight_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "NoRoute",
            "message": "Impossible route between points",
            "routes": []
        })))
        .mount(&server)
        .await;

    let engine = client(server.uri(), GeometryFormat::GeoJson);
    assert!(matches!(
        engine.route(&two_stops()).await,
        Err(RoutingError::Engine { ref code, .. }) if code == "NoRoute"
    ));

    let route = RouteFetcher::new(engine).fetch(&two_stops(), "#34C759").await;
    assert!(route.is_fallback());
    assert_eq!(route.path.points(), &two_stops()[..]);
    assert_eq!(route.color, "#34C759");
}

#[tokio::test]
async fn error_status_falls_back_to_straight_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "InvalidQuery",
            "message": "Query string malformed"
        })))
        .mount(&server)
        .await;

    let fetcher = RouteFetcher::new(client(server.uri(), GeometryFormat::GeoJson));
    let route = fetcher.fetch(&two_stops(), "#007AFF").await;
    assert!(route.is_fallback());
    assert_eq!(route.path.points(), &two_stops()[..]);
}

#[tokio::test]
async fn missing_routes_fall_back_to_straight_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "Ok" })))
        .mount(&server)
        .await;

    let engine = client(server.uri(), GeometryFormat::GeoJson);
    assert!(matches!(
        engine.route(&two_stops()).await,
        Err(RoutingError::NoRoute)
    ));
    let route = RouteFetcher::new(engine).fetch(&two_stops(), "#007AFF").await;
    assert_eq!(route.path.points(), &two_stops()[..]);
}

#[tokio::test]
async fn malformed_polyline_falls_back_to_straight_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Ok",
            "routes": [{ "geometry": "_p~iF~ps|U_", "distance": 1.0, "duration": 1.0 }]
        })))
        .mount(&server)
        .await;

    let engine = client(server.uri(), GeometryFormat::Polyline);
    assert!(matches!(
        engine.route(&two_stops()).await,
        Err(RoutingError::Geometry(_))
    ));
    let route = RouteFetcher::new(engine).fetch(&two_stops(), "#007AFF").await;
    assert!(route.is_fallback());
    assert_eq!(route.path.points(), &two_stops()[..]);
}

#[tokio::test]
async fn overflowing_polyline_falls_back_to_straight_line() {
    // Every value decodes on its own; their running sum does not fit.
    let geometry = format!("}}{}F", "~".repeat(11)).repeat(6);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Ok",
            "routes": [{ "geometry": geometry, "distance": 1.0, "duration": 1.0 }]
        })))
        .mount(&server)
        .await;

    let engine = client(server.uri(), GeometryFormat::Polyline);
    assert!(matches!(
        engine.route(&two_stops()).await,
        Err(RoutingError::Geometry(polyline::PolylineError::Overflow { .. }))
    ));
    let route = RouteFetcher::new(engine).fetch(&two_stops(), "#007AFF").await;
    assert!(route.is_fallback());
    assert_eq!(route.path.points(), &two_stops()[..]);
}

#[tokio::test]
async fn unreachable_engine_falls_back_to_straight_line() {
    // Nothing listens on the discard port.
    let fetcher = RouteFetcher::new(client(
        "http://127.0.0.1:9".to_string(),
        GeometryFormat::GeoJson,
    ));
    let stops = vec![
        Coordinate::new(41.0, 29.0),
        Coordinate::new(41.01, 29.01),
        Coordinate::new(41.02, 29.0),
    ];
    let route = fetcher.fetch(&stops, "#FF9500").await;
    assert!(route.is_fallback());
    assert_eq!(route.path.points(), &stops[..]);
    assert!(route.summary.estimated);
}

#[tokio::test]
async fn single_stop_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = client(server.uri(), GeometryFormat::GeoJson);
    let stop = [Coordinate::new(41.0, 29.0)];
    assert!(matches!(
        engine.route(&stop).await,
        Err(RoutingError::TooFewWaypoints(1))
    ));
}
