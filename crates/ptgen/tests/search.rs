// ABOUTME: Integration tests for the douban, IMDb and Bangumi search extractors.
// ABOUTME: Each suggestion endpoint is mocked and the mapped SearchItems are checked.

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use ptgen_core::{Client, Endpoints, SearchItem, SearchSource};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .endpoints(Endpoints::all(&server.base_url()))
        .build()
}

#[tokio::test]
async fn douban_suggestions() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/j/subject_suggest")
            .query_param("q", "shawshank");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"[{"episode":"","img":"https://img1.doubanio.com/p480747492.jpg","title":"肖申克的救赎","url":"https://movie.douban.com/subject/1292052/?suggest=shawshank","type":"movie","year":"1994","sub_title":"The Shawshank Redemption","id":"1292052"}]"#,
            );
    });

    let items = client_for(&server)
        .search(SearchSource::Douban, "shawshank")
        .await
        .unwrap();
    mock.assert();
    assert_eq!(
        items,
        vec![SearchItem {
            title: "肖申克的救赎".to_string(),
            subtitle: Some("The Shawshank Redemption".to_string()),
            year: Some("1994".to_string()),
            subtype: Some("movie".to_string()),
            link: "https://movie.douban.com/subject/1292052/".to_string(),
        }]
    );
}

#[tokio::test]
async fn imdb_suggestions_keep_titles_only() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/suggestion/m/matrix.json");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"{"d":[
                    {"id":"tt0133093","l":"The Matrix","q":"feature","y":1999,"s":"Keanu Reeves"},
                    {"id":"nm0000206","l":"Keanu Reeves","s":"Actor"},
                    {"id":"tt10838180","l":"The Matrix Resurrections","q":"feature"}
                ],"q":"matrix","v":1}"#,
            );
    });

    let items = client_for(&server)
        .search(SearchSource::Imdb, "Matrix")
        .await
        .unwrap();
    mock.assert();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "The Matrix");
    assert_eq!(items[0].year.as_deref(), Some("1999"));
    assert_eq!(items[0].link, "https://www.imdb.com/title/tt0133093");
    assert_eq!(items[1].year, None);
}

#[tokio::test]
async fn bangumi_results_carry_type_labels() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search/subject/portal")
            .query_param("responseGroup", "large");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"{"results":2,"list":[
                    {"id":8442,"url":"http://bgm.tv/subject/8442","type":4,"name":"Portal 2","name_cn":"传送门2","air_date":"2011-04-19"},
                    {"id":8441,"url":"http://bgm.tv/subject/8441","type":4,"name":"Portal","name_cn":"","air_date":""}
                ]}"#,
            );
    });

    let items = client_for(&server)
        .search(SearchSource::Bangumi, "portal")
        .await
        .unwrap();
    mock.assert();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "传送门2");
    assert_eq!(items[0].subtitle.as_deref(), Some("Portal 2"));
    assert_eq!(items[0].year.as_deref(), Some("2011"));
    assert_eq!(items[0].subtype.as_deref(), Some("游戏"));
    assert_eq!(items[1].title, "Portal");
    assert_eq!(items[1].year, None);
}

#[tokio::test]
async fn upstream_failure_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/j/subject_suggest");
        then.status(503).body("busy");
    });

    let err = client_for(&server)
        .search(SearchSource::Douban, "anything")
        .await
        .unwrap_err();
    assert!(err.is_fetch());
}
