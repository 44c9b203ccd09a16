//! Concrete rule kinds built from definitions.

mod common;

use serde_json::{Value, json};

use common::{FakeClient, comment, context_with, submission};
use modsieve::cache::CacheSettings;
use modsieve::rules::build_rule;
use modsieve::{Activity, CommunityContext, ModsieveError, RuleDefinition, RuleResult};

fn ctx() -> CommunityContext {
    context_with(FakeClient::new(), CacheSettings::default())
}

fn def(value: Value) -> RuleDefinition {
    serde_json::from_value(value).unwrap()
}

async fn run(ctx: &CommunityContext, value: Value, activity: &Activity) -> RuleResult {
    build_rule(&def(value), ctx)
        .unwrap()
        .run(activity, &[])
        .await
        .unwrap()
}

fn with_body(mut activity: Activity, body: &str) -> Activity {
    match &mut activity {
        Activity::Submission(s) => s.body = Some(body.to_string()),
        Activity::Comment(c) => c.body = body.to_string(),
    }
    activity
}

// ============================================================================
// regex
// ============================================================================

#[tokio::test]
async fn regex_counts_matches_against_threshold() {
    let ctx = ctx();
    let post = with_body(submission("s1", "alice", "Buy now"), "buy now, really, buy now");

    let once = run(&ctx, json!({"kind": "regex", "pattern": "(?i)buy now"}), &post).await;
    assert_eq!(once.triggered, Some(true));
    assert_eq!(once.data["matches"], json!(3));
    assert_eq!(once.name, "regex");

    let strict = run(
        &ctx,
        json!({"kind": "regex", "name": "Strict", "pattern": "(?i)buy now", "matchThreshold": 4}),
        &post,
    )
    .await;
    assert_eq!(strict.triggered, Some(false));
    assert_eq!(strict.name, "Strict");
}

#[tokio::test]
async fn regex_field_selects_text() {
    let ctx = ctx();
    let post = with_body(submission("s1", "alice", "plain title"), "spam body");

    let title = run(&ctx, json!({"kind": "regex", "pattern": "spam", "field": "title"}), &post).await;
    assert_eq!(title.triggered, Some(false));
    let body = run(&ctx, json!({"kind": "regex", "pattern": "spam", "field": "body"}), &post).await;
    assert_eq!(body.triggered, Some(true));
}

#[tokio::test]
async fn regex_activity_restriction_is_not_applicable() {
    let ctx = ctx();
    let reply = comment("c1", "bob", "s1", "spam");

    let result = run(
        &ctx,
        json!({"kind": "regex", "pattern": "spam", "activity": "submission"}),
        &reply,
    )
    .await;
    assert_eq!(result.triggered, None);
    assert!(!result.is_applicable());
}

#[test]
fn invalid_regex_fails_at_build() {
    let ctx = ctx();
    let err = build_rule(&def(json!({"kind": "regex", "pattern": "(open"})), &ctx)
        .err()
        .unwrap();
    match err {
        ModsieveError::InvalidRegex { pattern, .. } => assert_eq!(pattern, "(open"),
        other => panic!("expected invalid regex, got {other}"),
    }
}

#[test]
fn missing_required_parameter_is_schema_error() {
    let ctx = ctx();
    let err = build_rule(&def(json!({"kind": "regex", "name": "np"})), &ctx)
        .err()
        .unwrap();
    match err {
        ModsieveError::SchemaInvalid { path, .. } => assert_eq!(path, "rule 'np'"),
        other => panic!("expected schema error, got {other}"),
    }
}

// ============================================================================
// author
// ============================================================================

#[tokio::test]
async fn author_include_and_exclude() {
    let ctx = ctx();
    let rule = json!({
        "kind": "author",
        "include": [{"name": ["alice", "bob"]}],
        "exclude": [{"isMod": true}]
    });

    let alice = submission("s1", "alice", "t");
    assert_eq!(run(&ctx, rule.clone(), &alice).await.triggered, Some(true));

    let carol = submission("s2", "carol", "t");
    assert_eq!(run(&ctx, rule.clone(), &carol).await.triggered, Some(false));

    let mut bob = submission("s3", "bob", "t");
    if let Activity::Submission(s) = &mut bob {
        s.author.is_mod = true;
    }
    assert_eq!(run(&ctx, rule, &bob).await.triggered, Some(false));
}

#[test]
fn author_rule_needs_criteria() {
    let ctx = ctx();
    let err = build_rule(&def(json!({"kind": "author"})), &ctx).err().unwrap();
    assert!(matches!(err, ModsieveError::SchemaInvalid { .. }));
}

// ============================================================================
// recentActivity
// ============================================================================

#[tokio::test]
async fn recent_activity_counts_watched_communities() {
    let client = FakeClient::new();
    let mut elsewhere = submission("h1", "alice", "x");
    if let Activity::Submission(s) = &mut elsewhere {
        s.community = "FreeKarma".into();
    }
    client.set_history(
        "alice",
        vec![elsewhere.clone(), elsewhere.clone(), submission("h3", "alice", "y")],
    );
    let ctx = context_with(client.clone(), CacheSettings::default());
    let post = submission("s1", "alice", "t");

    let rule = json!({
        "kind": "recentActivity",
        "communities": ["r/freekarma"],
        "threshold": 2,
        "window": {"kind": "submissions", "limit": 100}
    });
    let result = run(&ctx, rule.clone(), &post).await;
    assert_eq!(result.triggered, Some(true));
    assert_eq!(result.data["count"], json!(2));

    let again = run(&ctx, rule, &post).await;
    assert_eq!(again.triggered, Some(true));
    assert_eq!(client.history_fetches(), 1, "history listing is cached");
}

#[tokio::test]
async fn recent_activity_excludes_the_activity_itself() {
    let client = FakeClient::new();
    let post = submission("s1", "alice", "t");
    client.set_history("alice", vec![post.clone()]);
    let ctx = context_with(client, CacheSettings::default());

    let result = run(&ctx, json!({"kind": "recentActivity"}), &post).await;
    assert_eq!(result.triggered, Some(false));
}

// ============================================================================
// Rule filters
// ============================================================================

#[tokio::test]
async fn failing_filters_make_rule_not_applicable() {
    let ctx = ctx();
    let post = submission("s1", "alice", "spam");

    let item = run(
        &ctx,
        json!({"kind": "regex", "pattern": "spam", "itemIs": [{"removed": true}]}),
        &post,
    )
    .await;
    assert_eq!(item.triggered, None);

    let author = run(
        &ctx,
        json!({"kind": "regex", "pattern": "spam", "authorIs": [{"name": "bob"}]}),
        &post,
    )
    .await;
    assert_eq!(author.triggered, None);

    let passing = run(
        &ctx,
        json!({"kind": "regex", "pattern": "spam", "authorIs": [{"name": "ALICE"}]}),
        &post,
    )
    .await;
    assert_eq!(passing.triggered, Some(true));
}
