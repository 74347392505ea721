mod support;

use std::sync::Arc;

use parking_lot::Mutex;

use feedscroll::data::{
    fetch_all, Collection, DummyJsonFeedService, FailureHook, FailureKind, FetchFailure,
};
use feedscroll::dummyjson::{Client, ClientConfig, Endpoint, FetchError, Post};
use feedscroll::feed::{self, Author, Commenter};
use feedscroll::pager::PageCursor;
use feedscroll::render::Document;

fn client(base_url: String) -> Client {
    Client::new(ClientConfig {
        user_agent: "feedscroll-tests".into(),
        base_url: Some(base_url),
        ..Default::default()
    })
    .expect("build client")
}

fn recording_hook() -> (FailureHook, Arc<Mutex<Vec<FetchFailure>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let hook: FailureHook = Arc::new(move |failure: &FetchFailure| {
        sink.lock().push(failure.clone());
    });
    (hook, seen)
}

#[test]
fn fetch_collection_reads_named_field() {
    let base = support::serve(support::healthy_routes());
    let posts: Vec<Post> = client(base)
        .fetch_collection(Endpoint::Posts)
        .expect("posts");
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].reactions, 192);
    assert_eq!(posts[2].reactions, 1448);
}

#[test]
fn server_error_is_a_status_failure() {
    let mut routes = support::healthy_routes();
    routes.insert("/users", (500, "{\"message\":\"boom\"}".to_string()));
    let base = support::serve(routes);

    let err = client(base).users().expect_err("500 must fail");
    match err {
        FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn server_error_degrades_to_empty_collection() {
    let mut routes = support::healthy_routes();
    routes.insert("/users", (500, "{\"message\":\"boom\"}".to_string()));
    let base = support::serve(routes);
    let service = DummyJsonFeedService::new(Arc::new(client(base)));
    let (hook, seen) = recording_hook();

    let outcome = feed::load_cycle(&service, PageCursor::first(), 5, &hook);
    assert_eq!(outcome.page.blocks.len(), 3);
    assert!(outcome
        .page
        .blocks
        .iter()
        .all(|block| block.author == Author::Unknown));
    assert_eq!(outcome.next, PageCursor::at(2));

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].collection, Collection::Users);
    assert_eq!(seen[0].kind, FailureKind::Network);
}

#[test]
fn malformed_body_is_reported_as_parse_failure() {
    let mut routes = support::healthy_routes();
    routes.insert("/comments", (200, "<html>maintenance</html>".to_string()));
    let base = support::serve(routes);
    let service = DummyJsonFeedService::new(Arc::new(client(base)));
    let (hook, seen) = recording_hook();

    let collections = fetch_all(&service, &hook);
    assert_eq!(collections.posts.len(), 3);
    assert_eq!(collections.users.len(), 2);
    assert!(collections.comments.is_empty());
    assert_eq!(seen.lock()[0].kind, FailureKind::Parse);
}

#[test]
fn unreachable_host_degrades_every_collection() {
    let service = DummyJsonFeedService::new(Arc::new(client("http://127.0.0.1:1".into())));
    let (hook, seen) = recording_hook();

    let collections = fetch_all(&service, &hook);
    assert_eq!(collections, Default::default());
    let seen = seen.lock();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|failure| failure.kind == FailureKind::Network));
}

#[test]
fn full_cycle_joins_canonical_users() {
    let base = support::serve(support::healthy_routes());
    let service = DummyJsonFeedService::new(Arc::new(client(base)));
    let (hook, seen) = recording_hook();

    let outcome = feed::load_cycle(&service, PageCursor::first(), 5, &hook);
    assert!(seen.lock().is_empty());

    let first = &outcome.page.blocks[0];
    match &first.author {
        Author::Known(user) => assert_eq!(user.username, "emilys"),
        other => panic!("expected known author, got {other:?}"),
    }
    let commenters: Vec<String> = first
        .comments
        .iter()
        .map(|entry| match &entry.commenter {
            Commenter::Known(user) => user.username.clone(),
            Commenter::Unknown(_) => "?".to_string(),
        })
        .collect();
    assert_eq!(commenters, vec!["michaelw", "emilys"]);

    let mut doc = Document::new(80);
    doc.append(outcome.page.blocks);
    let text = doc.text_lines();
    assert!(text.contains(&"  Unknown Commenter: What terrific math skills you're showing!".to_string()));
    assert!(text.contains(&"Unknown Poster".to_string()));
    assert!(text.contains(&"Tags: history, american, crime".to_string()));
    assert!(text.contains(&"Tags: ".to_string()));
}

#[test]
fn second_page_past_the_end_is_empty() {
    let base = support::serve(support::healthy_routes());
    let service = DummyJsonFeedService::new(Arc::new(client(base)));
    let (hook, _) = recording_hook();

    let outcome = feed::load_cycle(&service, PageCursor::at(2), 5, &hook);
    assert!(outcome.page.blocks.is_empty());
    assert_eq!(outcome.next, PageCursor::at(3));
}
