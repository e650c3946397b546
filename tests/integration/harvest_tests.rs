//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for hh.ru and run full harvests
//! end-to-end against both source variants.

use hh_harvester::config::{
    load_or_create_config, Config, LogConfig, OutputConfig, ProviderConfig, RetryConfig,
    SearchConfig,
};
use hh_harvester::storage::{RunStatus, SqliteStorage, VacancyStore};
use hh_harvester::{each_vacancy, HarvestError, HarvestOutcome, SearchQuery, SourceKind};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(base_url: &str, limit: usize, db_path: &str) -> Config {
    Config {
        search: SearchConfig {
            query: "python developer".to_string(),
            limit,
            prefetch: 20,
        },
        provider: ProviderConfig {
            search_endpoint: format!("{}/search/vacancy", base_url),
            api_endpoint: format!("{}/vacancies", base_url),
            vacancy_details_endpoint: format!("{}/vacancy/", base_url),
            request_timeout_in_seconds: 1,
            detail_concurrency: 4,
        },
        retry: RetryConfig {
            max_attempts: 2,
            backoff_ms: 10,
            max_backoff_ms: 20,
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        log: LogConfig::default(),
    }
}

async fn harvest(config: &Config, kind: SourceKind) -> HarvestOutcome {
    let query = SearchQuery::from_config(&config.search, kind);
    each_vacancy(config, query)
        .expect("Failed to start harvest")
        .collect_all()
        .await
}

fn sorted_ids(outcome: &HarvestOutcome) -> Vec<String> {
    let mut ids: Vec<String> = outcome
        .vacancies
        .iter()
        .map(|v| v.internal_id.clone())
        .collect();
    ids.sort();
    ids
}

/// Renders a search results page carrying the given search state
fn search_page(state: serde_json::Value) -> String {
    format!(
        r#"<html><head><title>Vacancies</title></head><body>
        <div id="app"></div>
        <script id="HH-Lux-InitialState" type="application/json">{}</script>
        </body></html>"#,
        state
    )
}

fn island_vacancy(id: u64, name: &str, lifecycle: &str, trusted: bool) -> serde_json::Value {
    json!({
        "vacancyId": id,
        "name": name,
        "type": lifecycle,
        "company": {"name": "Acme", "@trusted": trusted}
    })
}

fn vacancy_page(skills: &[&str], paragraphs: &[&str]) -> String {
    let tags: String = skills
        .iter()
        .map(|s| format!(r#"<span data-qa="bloko-tag__text">{}</span>"#, s))
        .collect();
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
    format!(
        r#"<html><body>
        <div data-qa="vacancy-description">{}</div>
        <div class="skills">{}</div>
        </body></html>"#,
        body, tags
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_html_harvest_filters_and_dedups() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Second page first: the more specific matcher must win
    Mock::given(method("GET"))
        .and(path("/search/vacancy"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(json!({
            "vacancySearchResult": {
                "totalResults": 4,
                "paging": {"lastPage": {"page": 2}},
                "vacancies": [
                    island_vacancy(101, "Python Developer", "open", true),
                    island_vacancy(104, "Backend Engineer", "open", true)
                ]
            }
        }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/vacancy"))
        .and(query_param("text", "python developer"))
        .and(query_param("items_on_page", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(json!({
            "vacancySearchResult": {
                "totalResults": 4,
                "paging": {"lastPage": {"page": 2}},
                "vacancies": [
                    island_vacancy(101, "Python Developer", "open", true),
                    island_vacancy(102, "Data Engineer", "archived", true),
                    island_vacancy(103, "QA Engineer", "open", false)
                ]
            }
        }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vacancy/101"))
        .respond_with(ResponseTemplate::new(200).set_body_string(vacancy_page(
            &[" Python ", "SQL", "python"],
            &["Build services.", "Ship them."],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_html(
        &mock_server,
        "/vacancy/104",
        vacancy_page(&["Go"], &["Write Go."]),
    )
    .await;

    for skipped in ["/vacancy/102", "/vacancy/103"] {
        Mock::given(method("GET"))
            .and(path(skipped))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&base_url, 10, ":memory:");
    let outcome = harvest(&config, SourceKind::Html).await;

    assert!(outcome.error.is_none(), "unexpected error: {:?}", outcome.error);
    assert_eq!(sorted_ids(&outcome), vec!["101", "104"]);

    let first = outcome
        .vacancies
        .iter()
        .find(|v| v.internal_id == "101")
        .unwrap();
    assert_eq!(first.company, "Acme");
    assert_eq!(first.carrier_position, "Python Developer");
    assert_eq!(first.description, "Build services.\nShip them.");
    let skills: Vec<&str> = first.skills.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(skills, vec!["python", "sql"]);
}

#[tokio::test]
async fn test_html_missing_data_island_fails_run() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/search/vacancy",
        "<html><body><div>Redesigned page</div></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), 10, ":memory:");
    let outcome = harvest(&config, SourceKind::Html).await;

    assert!(outcome.vacancies.is_empty());
    assert!(matches!(
        outcome.error,
        Some(HarvestError::UpstreamFormatChanged(_))
    ));
}

#[tokio::test]
async fn test_html_search_not_found_means_format_changed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/vacancy"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 10, ":memory:");
    let outcome = harvest(&config, SourceKind::Html).await;

    assert!(outcome.vacancies.is_empty());
    assert!(matches!(
        outcome.error,
        Some(HarvestError::UpstreamFormatChanged(_))
    ));
}

#[tokio::test]
async fn test_html_limit_stops_detail_fetches() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/search/vacancy",
        search_page(json!({
            "vacancySearchResult": {
                "totalResults": 3,
                "paging": {"lastPage": {"page": 5}},
                "vacancies": [
                    island_vacancy(1, "First", "open", true),
                    island_vacancy(2, "Second", "open", true),
                    island_vacancy(3, "Third", "open", true)
                ]
            }
        })),
    )
    .await;

    for id in [1, 2] {
        mount_html(
            &mock_server,
            &format!("/vacancy/{}", id),
            vacancy_page(&["Rust"], &["Body"]),
        )
        .await;
    }

    Mock::given(method("GET"))
        .and(path("/vacancy/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2, ":memory:");
    let outcome = harvest(&config, SourceKind::Html).await;

    assert!(outcome.error.is_none());
    assert_eq!(sorted_ids(&outcome), vec!["1", "2"]);
}

#[tokio::test]
async fn test_api_harvest_skips_untrusted_employers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .and(query_param("text", "python developer"))
        .and(query_param("per_page", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "found": 2,
            "pages": 1,
            "items": [
                {"id": "1", "name": "Python Developer", "url": format!("{}/vacancies/1", base_url),
                 "employer": {"name": "Acme", "trusted": true}},
                {"id": "2", "name": "Scam Developer", "url": format!("{}/vacancies/2", base_url),
                 "employer": {"name": "Shady", "trusted": false}}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vacancies/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "description": "<p>Django services</p>\n\n",
            "key_skills": [{"name": "Django"}, {"name": "PostgreSQL"}, {"name": ""}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vacancies/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, 10, ":memory:");
    let outcome = harvest(&config, SourceKind::Api).await;

    assert!(outcome.error.is_none(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.vacancies.len(), 1);

    let vacancy = &outcome.vacancies[0];
    assert_eq!(vacancy.internal_id, "1");
    assert_eq!(vacancy.description, "<p>Django services</p>");
    let skills: Vec<&str> = vacancy.skills.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(skills, vec!["django", "postgresql"]);
}

#[tokio::test]
async fn test_api_no_results_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "found": 0,
            "pages": 0,
            "items": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 10, ":memory:");
    let outcome = harvest(&config, SourceKind::Api).await;

    assert!(outcome.vacancies.is_empty());
    assert!(matches!(outcome.error, Some(HarvestError::NoSearchResults(_))));
}

#[tokio::test]
async fn test_api_listing_recovers_from_transient_status() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // First listing request fails, the retry gets the real page
    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "found": 1,
            "pages": 1,
            "items": [
                {"id": 5, "name": "Rust Developer", "url": format!("{}/vacancies/5", base_url),
                 "employer": {"name": "Acme", "trusted": true}}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vacancies/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "description": "Systems work",
            "key_skills": [{"name": "Rust"}]
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, 10, ":memory:");
    let outcome = harvest(&config, SourceKind::Api).await;

    assert!(outcome.error.is_none(), "unexpected error: {:?}", outcome.error);
    assert_eq!(sorted_ids(&outcome), vec!["5"]);
}

#[tokio::test]
async fn test_html_empty_search_page_is_retried_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/vacancy"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(json!({
            "vacancySearchResult": {
                "totalResults": 0,
                "paging": {"lastPage": {"page": 1}},
                "vacancies": []
            }
        }))))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), 10, ":memory:");
    config.retry.max_attempts = 4;
    let outcome = harvest(&config, SourceKind::Html).await;

    assert!(outcome.vacancies.is_empty());
    assert!(matches!(outcome.error, Some(HarvestError::NoSearchResults(_))));
}

#[tokio::test]
async fn test_api_detail_timeout_drops_only_that_vacancy() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "found": 2,
            "pages": 1,
            "items": [
                {"id": 1, "name": "Slow", "url": format!("{}/vacancies/1", base_url),
                 "employer": {"name": "Acme", "trusted": true}},
                {"id": 2, "name": "Fast", "url": format!("{}/vacancies/2", base_url),
                 "employer": {"name": "Acme", "trusted": true}}
            ]
        })))
        .mount(&mock_server)
        .await;

    // Slower than the one-second client timeout, on every attempt
    Mock::given(method("GET"))
        .and(path("/vacancies/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"description": "late", "key_skills": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vacancies/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "description": "on time",
            "key_skills": [{"name": "Rust"}]
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, 10, ":memory:");
    let outcome = harvest(&config, SourceKind::Api).await;

    assert!(outcome.error.is_none(), "unexpected error: {:?}", outcome.error);
    assert_eq!(sorted_ids(&outcome), vec!["2"]);
}

#[tokio::test]
async fn test_harvest_persists_into_sqlite() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vacancies.db");

    mount_html(
        &mock_server,
        "/search/vacancy",
        search_page(json!({
            "vacancySearchResult": {
                "totalResults": 1,
                "paging": {"lastPage": {"page": 1}},
                "vacancies": [island_vacancy(7, "Rust Developer", "open", true)]
            }
        })),
    )
    .await;
    mount_html(
        &mock_server,
        "/vacancy/7",
        vacancy_page(&["Rust", "Tokio"], &["Async all the way."]),
    )
    .await;

    let config = create_test_config(
        &mock_server.uri(),
        10,
        db_path.to_str().unwrap(),
    );
    let outcome = harvest(&config, SourceKind::Html).await;
    assert!(outcome.error.is_none());

    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open storage");
    let run_id = storage.create_run(&config.search.query, "html").unwrap();
    storage.clear_vacancies().unwrap();
    let saved = storage.save_all(run_id, &outcome.vacancies).unwrap();
    storage
        .finish_run(run_id, RunStatus::Completed, saved as u64)
        .unwrap();
    drop(storage);

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    let stored = storage.load_vacancy("7").unwrap().unwrap();
    assert_eq!(stored, outcome.vacancies[0]);
    assert_eq!(storage.count_vacancies().unwrap(), 1);
    assert_eq!(
        storage.top_skills(5).unwrap(),
        vec![("rust".to_string(), 1), ("tokio".to_string(), 1)]
    );

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.vacancy_count, 1);
}

#[test]
fn test_missing_config_file_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");

    let (config, hash) = load_or_create_config(&path).expect("Failed to create config");

    assert!(path.exists());
    assert_eq!(config.search.limit, 100);
    assert_eq!(config.provider.api_endpoint, "https://api.hh.ru/vacancies");
    assert_eq!(hash.len(), 64);
}
