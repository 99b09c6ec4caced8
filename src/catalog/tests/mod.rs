use super::*;
use crate::config::CatalogConfig;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: UserId = UserId(124493);

fn create_resolver(base_url: &str) -> CatalogResolver {
    let config = Config {
        base_url: base_url.to_string(),
        catalog: CatalogConfig {
            page_delay: Duration::ZERO,
            ..Default::default()
        },
        ..Default::default()
    };
    let client = HttpClient::new(&config.http).expect("Failed to create client");
    CatalogResolver::new(client, Arc::new(config))
}

/// Most-played record with the fields the resolver reads
fn entry(set_id: u64, title: &str) -> serde_json::Value {
    json!({
        "beatmap_id": set_id * 10,
        "count": 3,
        "beatmap": { "id": set_id * 10, "beatmapset_id": set_id, "version": "Insane" },
        "beatmapset": { "id": set_id, "title": title, "artist": "xi" }
    })
}

async fn mount_page(server: &MockServer, offset: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/beatmapsets/most_played", USER)))
        .and(query_param("limit", "100"))
        .and(query_param("offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Offsets of all listing requests the server saw, in order
async fn requested_offsets(server: &MockServer) -> Vec<u64> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().ends_with("/most_played"))
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "offset")
                .and_then(|(_, v)| v.parse().ok())
        })
        .collect()
}

// Identity resolution

#[tokio::test]
async fn numeric_identity_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = create_resolver(&server.uri());
    let id = resolver
        .resolve_identity(&UserIdentity::Id(USER))
        .await
        .unwrap();
    assert_eq!(id, USER);
}

#[tokio::test]
async fn username_resolves_through_redirect_notice() {
    let server = MockServer::start().await;
    let notice = format!("Redirecting to {}/users/{}.", server.uri(), USER);
    Mock::given(method("GET"))
        .and(path("/users/Cookiezi"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/users/{}", server.uri(), USER).as_str())
                .set_body_string(notice),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resolver = create_resolver(&server.uri());
    let id = resolver
        .resolve_identity(&UserIdentity::Username("Cookiezi".into()))
        .await
        .unwrap();
    assert_eq!(id, USER);
}

#[tokio::test]
async fn username_with_space_is_path_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/Some%20Player"))
        .respond_with(
            ResponseTemplate::new(302)
                .set_body_string(format!("Redirecting to {}/users/42", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resolver = create_resolver(&server.uri());
    let id = resolver
        .resolve_identity(&UserIdentity::Username("Some Player".into()))
        .await
        .unwrap();
    assert_eq!(id, UserId(42));
}

#[tokio::test]
async fn missing_redirect_notice_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/nobody"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>User not found</html>"))
        .mount(&server)
        .await;

    let resolver = create_resolver(&server.uri());
    let result = resolver
        .resolve_identity(&UserIdentity::Username("nobody".into()))
        .await;

    match result {
        Err(Error::IdentityResolution { input, .. }) => assert_eq!(input, "nobody"),
        other => panic!("expected IdentityResolution error, got {other:?}"),
    }
}

#[test]
fn redirect_notice_must_point_at_the_same_host() {
    let base = "https://osu.ppy.sh";
    assert_eq!(
        parse_redirect_notice("Redirecting to https://osu.ppy.sh/users/2", base),
        Some(2)
    );
    assert_eq!(
        parse_redirect_notice("Redirecting to https://osuXppyXsh/users/2", base),
        None
    );
    assert_eq!(parse_redirect_notice("Redirecting to nowhere", base), None);
}

// Play count

#[tokio::test]
async fn total_count_reads_nested_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/extra-pages/historical", USER)))
        .and(query_param("mode", "osu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "beatmap_playcounts": { "count": 250, "items": [] },
            "monthly_playcounts": []
        })))
        .mount(&server)
        .await;

    let resolver = create_resolver(&server.uri());
    assert_eq!(resolver.get_total_count(USER).await, 250);
}

#[tokio::test]
async fn total_count_degrades_to_zero() {
    let bodies = [
        ResponseTemplate::new(500),
        ResponseTemplate::new(200).set_body_string("not json"),
        ResponseTemplate::new(200).set_body_json(json!({ "monthly_playcounts": [] })),
        ResponseTemplate::new(200).set_body_json(json!({ "beatmap_playcounts": {} })),
    ];

    for template in bodies {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;

        let resolver = create_resolver(&server.uri());
        assert_eq!(resolver.get_total_count(USER).await, 0);
    }
}

#[tokio::test]
async fn total_count_is_zero_when_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let resolver = create_resolver(&format!("http://{}", addr));
    assert_eq!(resolver.get_total_count(USER).await, 0);
}

// Pagination

#[tokio::test]
async fn pagination_requests_final_partial_page() {
    let server = MockServer::start().await;
    mount_page(&server, 0, json!([entry(1, "a")])).await;
    mount_page(&server, 100, json!([entry(2, "b")])).await;
    mount_page(&server, 200, json!([entry(3, "c")])).await;

    let resolver = create_resolver(&server.uri());
    let items = resolver.list_items(USER, 250).await;

    assert_eq!(items.len(), 3);
    assert_eq!(requested_offsets(&server).await, vec![0, 100, 200]);
}

#[tokio::test]
async fn zero_count_makes_no_listing_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = create_resolver(&server.uri());
    assert!(resolver.list_items(USER, 0).await.is_empty());
}

#[tokio::test]
async fn duplicate_sets_across_pages_are_kept_once() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        0,
        json!([entry(1, "one"), entry(2, "two"), entry(2, "two"), entry(3, "three")]),
    )
    .await;
    mount_page(&server, 100, json!([entry(3, "three"), entry(4, "four"), entry(1, "one")])).await;

    let resolver = create_resolver(&server.uri());
    let items = resolver.list_items(USER, 150).await;

    let ids: Vec<u64> = items.iter().map(|item| item.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(items[3].title, "four");
}

#[tokio::test]
async fn records_without_set_id_are_ignored() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        0,
        json!([
            { "beatmap": { "beatmapset_id": null }, "beatmapset": { "title": "gone" } },
            { "beatmap": { "beatmapset_id": 0 }, "beatmapset": { "title": "zero" } },
            entry(7, "kept")
        ]),
    )
    .await;

    let resolver = create_resolver(&server.uri());
    let items = resolver.list_items(USER, 3).await;
    assert_eq!(
        items,
        vec![CatalogItem {
            id: BeatmapsetId(7),
            title: "kept".into()
        }]
    );
}

#[tokio::test]
async fn bad_record_does_not_discard_its_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        0,
        json!([
            entry(1, "first"),
            { "beatmap": { "beatmapset_id": 2 }, "beatmapset": { "title": null } },
            { "beatmap": "not an object", "beatmapset": { "title": "broken" } },
            entry(3, "third")
        ]),
    )
    .await;
    mount_page(&server, 100, json!([entry(4, "fourth")])).await;

    let resolver = create_resolver(&server.uri());
    let items = resolver.list_items(USER, 150).await;

    let found: Vec<(u64, &str)> = items
        .iter()
        .map(|item| (item.id.get(), item.title.as_str()))
        .collect();
    assert_eq!(found, vec![(1, "first"), (2, ""), (3, "third"), (4, "fourth")]);
    assert_eq!(requested_offsets(&server).await, vec![0, 100]);
}

#[tokio::test]
async fn failing_page_stops_pagination_and_keeps_earlier_items() {
    let server = MockServer::start().await;
    mount_page(&server, 0, json!([entry(1, "a"), entry(2, "b")])).await;
    Mock::given(method("GET"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry(3, "c")])))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = create_resolver(&server.uri());
    let items = resolver.list_items(USER, 250).await;

    let ids: Vec<u64> = items.iter().map(|item| item.id.get()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(requested_offsets(&server).await, vec![0, 100]);
}

#[tokio::test]
async fn malformed_page_stops_pagination() {
    let server = MockServer::start().await;
    mount_page(&server, 0, json!({ "error": "unexpected object" })).await;

    let resolver = create_resolver(&server.uri());
    assert!(resolver.list_items(USER, 250).await.is_empty());
    assert_eq!(requested_offsets(&server).await, vec![0]);
}

#[tokio::test]
async fn fetch_catalog_chains_all_steps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/Cookiezi"))
        .respond_with(
            ResponseTemplate::new(302)
                .set_body_string(format!("Redirecting to {}/users/{}", server.uri(), USER)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/extra-pages/historical", USER)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "beatmap_playcounts": { "count": 2 } })),
        )
        .mount(&server)
        .await;
    mount_page(&server, 0, json!([entry(5, "x"), entry(6, "y")])).await;

    let resolver = create_resolver(&server.uri());
    let items = resolver
        .fetch_catalog(&UserIdentity::Username("Cookiezi".into()))
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}
