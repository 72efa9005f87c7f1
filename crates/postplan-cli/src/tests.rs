use postplan_core::{AccountType, CanonicalDataset, EngagementRecord, Post, Profile};
use postplan_scraper::ValidationIssue;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["postplan"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_run_with_data_key() {
    let cli = Cli::try_parse_from(["postplan", "run", "acme/instagram/acme_1.json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run { ref data_key }) if data_key == "acme/instagram/acme_1.json"
    ));
}

#[test]
fn run_requires_a_key() {
    assert!(Cli::try_parse_from(["postplan", "run"]).is_err());
}

#[test]
fn parses_user_without_limit() {
    let cli = Cli::try_parse_from(["postplan", "user", "acme"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::User {
            ref username,
            results_limit: None
        }) if username == "acme"
    ));
}

#[test]
fn parses_user_with_limit() {
    let cli = Cli::try_parse_from(["postplan", "user", "acme", "--results-limit", "25"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::User {
            results_limit: Some(25),
            ..
        })
    ));
}

#[test]
fn rejects_non_numeric_limit() {
    assert!(Cli::try_parse_from(["postplan", "user", "acme", "--results-limit", "many"]).is_err());
}

#[test]
fn parses_queue_list_and_recommend() {
    let cli = Cli::try_parse_from(["postplan", "queue"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Queue)));

    let cli = Cli::try_parse_from(["postplan", "list"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::List)));

    let cli = Cli::try_parse_from(["postplan", "recommend", "summer fashion"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Recommend { ref topic }) if topic == "summer fashion"
    ));
}

#[test]
fn parses_normalize_path() {
    let cli = Cli::try_parse_from(["postplan", "normalize", "data/raw.json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Normalize { ref file }) if file.ends_with("raw.json")
    ));
}

#[test]
fn summary_reports_counts_and_validation() {
    let dataset = CanonicalDataset {
        posts: vec![Post {
            id: "1".to_string(),
            caption: "Hello #world".to_string(),
            hashtags: vec!["#world".to_string()],
            engagement: 7,
            likes: 5,
            comments: 2,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            url: String::new(),
            post_type: "Image".to_string(),
        }],
        engagement_history: vec![EngagementRecord {
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            engagement: 7,
        }],
        profile: Profile {
            username: "acme".to_string(),
            account_type: AccountType::BusinessNoPosts,
            ..Profile::default()
        },
    };

    let ok = commands::summarize(&dataset, Ok(()));
    assert!(ok.contains("username:           acme"));
    assert!(ok.contains("account type:       business_no_posts"));
    assert!(ok.contains("posts:              1"));
    assert!(ok.contains("history range:      2024-01-01T00:00:00Z .. 2024-01-01T00:00:00Z"));
    assert!(ok.ends_with("validation:         ok\n"));

    let failed = commands::summarize(&CanonicalDataset::default(), Err(ValidationIssue::NoPosts));
    assert!(failed.contains("username:           (unknown)"));
    assert!(failed.contains("account type:       unknown"));
    assert!(failed.contains("validation:         failed (posts is empty)"));
    assert!(!failed.contains("history range"));
}
