use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use postplan_core::EngagementRecord;

use super::*;
use crate::forecast::EngagementAnalyzer;

/// Replays canned responses in order, then fails every later call.
#[derive(Default)]
struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerateError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| Ok((*r).to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerateError::NotConfigured))
    }
}

fn engine(generator: &Arc<ScriptedGenerator>) -> RecommendationEngine {
    RecommendationEngine::new(generator.clone())
}

fn post(id: &str, caption: &str, hashtags: &[&str], timestamp: &str) -> Post {
    Post {
        id: id.to_string(),
        caption: caption.to_string(),
        hashtags: hashtags.iter().map(|s| (*s).to_string()).collect(),
        engagement: 10,
        likes: 8,
        comments: 2,
        timestamp: timestamp.to_string(),
        url: String::new(),
        post_type: "Image".to_string(),
    }
}

fn rising_history() -> Vec<EngagementRecord> {
    [("2024-06-01", 10), ("2024-06-02", 20), ("2024-06-03", 30)]
        .into_iter()
        .map(|(ts, engagement)| EngagementRecord {
            timestamp: ts.to_string(),
            engagement,
        })
        .collect()
}

fn sample_posts() -> Vec<Post> {
    vec![
        post(
            "1",
            "Fresh matcha latte with @tea_house",
            &["#tea", "#matcha"],
            "2024-06-01T09:00:00Z",
        ),
        post("2", "Morning run by the river", &["#fitness"], "2024-06-02T07:00:00Z"),
        post(
            "3",
            "New tea collection launch with @tea_house",
            &["#tea", "#shop"],
            "2024-06-03T12:00:00Z",
        ),
    ]
}

#[tokio::test]
async fn recommendation_parses_json_and_uses_synthetic_context_when_index_empty() {
    let generator = ScriptedGenerator::new(&[
        r##"Here you go: {"caption": "Cold brew season is here", "hashtags": ["#coldbrew"], "call_to_action": "Order today"}"##,
    ]);
    let rec = engine(&generator)
        .generate_recommendation(&SimilarityIndex::new(), "cold brew")
        .await;

    assert_eq!(rec.caption, "Cold brew season is here");
    assert_eq!(rec.hashtags, vec!["#coldbrew"]);
    assert_eq!(rec.call_to_action, "Order today");

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("- Create engaging content about cold brew"));
}

#[tokio::test]
async fn recommendation_prompt_carries_indexed_captions() {
    let mut index = SimilarityIndex::new();
    index.add_posts(&sample_posts());
    let generator = ScriptedGenerator::new(&[
        r#"{"caption": "Tea time", "hashtags": [], "call_to_action": "Sip"}"#,
    ]);

    engine(&generator).generate_recommendation(&index, "matcha latte").await;

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("- Fresh matcha latte with @tea_house"));
}

#[tokio::test]
async fn unparseable_answer_is_reformatted_once() {
    let generator = ScriptedGenerator::new(&[
        "A caption about summer vibes and sunshine",
        r##"{"caption": "Summer vibes all day long", "hashtags": ["#summer"], "call_to_action": "Follow for more"}"##,
    ]);
    let rec = engine(&generator)
        .generate_recommendation(&SimilarityIndex::new(), "summer")
        .await;

    assert_eq!(rec.caption, "Summer vibes all day long");
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with("Convert the following text into properly formatted JSON"));
    assert!(prompts[1].contains("A caption about summer vibes and sunshine"));
}

#[tokio::test]
async fn heuristics_apply_when_reformat_also_fails() {
    let generator = ScriptedGenerator::new(&[
        "Bold new autumn looks for the season\n#Autumn #Style\nShop now at our store",
        "still not json",
    ]);
    let rec = engine(&generator)
        .generate_recommendation(&SimilarityIndex::new(), "autumn fashion")
        .await;

    assert_eq!(rec.caption, "Bold new autumn looks for the season");
    assert_eq!(rec.hashtags, vec!["#Autumn", "#Style"]);
    assert_eq!(rec.call_to_action, "Shop now at our store");
}

#[tokio::test]
async fn generator_failure_yields_topic_fallback() {
    let generator = ScriptedGenerator::new(&[]);
    let rec = engine(&generator)
        .generate_recommendation(&SimilarityIndex::new(), "product promotion")
        .await;

    assert_eq!(rec.caption, "Exciting content about product promotion");
    assert_eq!(rec.hashtags, vec!["#Product", "#Promotion", "#MustSee"]);
    assert_eq!(rec.call_to_action, parse::DEFAULT_CALL_TO_ACTION);
    // No reformat attempt after a transport failure.
    assert_eq!(generator.prompts().len(), 1);
}

#[tokio::test]
async fn batch_pads_short_topics_and_regenerates_missing_ones() {
    let generator = ScriptedGenerator::new(&[
        r##"{"tea": [{"caption": "Steep slowly tonight", "hashtags": ["#tea"], "call_to_action": "Shop now"}]}"##,
    ]);
    let topics = vec!["tea".to_string(), "  coffee ".to_string(), "   ".to_string()];
    let out = engine(&generator)
        .generate_batch_recommendations(&SimilarityIndex::new(), &topics, 3)
        .await;

    assert_eq!(out.keys().collect::<Vec<_>>(), vec!["coffee", "tea"]);
    assert_eq!(out["tea"].len(), 3);
    assert_eq!(out["tea"][0].caption, "Steep slowly tonight");
    assert_eq!(out["tea"][1].caption, "Exciting content about tea");
    assert_eq!(out["coffee"].len(), 3);
    assert!(out["coffee"]
        .iter()
        .all(|r| r.caption == "Exciting content about coffee"));

    // One batch call, two fills for tea, three for coffee.
    assert_eq!(generator.prompts().len(), 6);
}

#[tokio::test]
async fn batch_truncates_long_lists() {
    let generator = ScriptedGenerator::new(&[
        r##"{"tea": [
            {"caption": "One", "hashtags": [], "call_to_action": "a"},
            {"caption": "Two", "hashtags": [], "call_to_action": "b"},
            {"caption": "Three", "hashtags": [], "call_to_action": "c"}
        ]}"##,
    ]);
    let out = engine(&generator)
        .generate_batch_recommendations(&SimilarityIndex::new(), &["tea".to_string()], 2)
        .await;

    let captions: Vec<&str> = out["tea"].iter().map(|r| r.caption.as_str()).collect();
    assert_eq!(captions, vec!["One", "Two"]);
    assert_eq!(generator.prompts().len(), 1);
}

#[tokio::test]
async fn batch_with_no_valid_topics_makes_no_calls() {
    let generator = ScriptedGenerator::new(&[]);
    let out = engine(&generator)
        .generate_batch_recommendations(&SimilarityIndex::new(), &[" ".to_string()], 3)
        .await;
    assert!(out.is_empty());
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn next_post_supplies_missing_image_prompt() {
    let generator = ScriptedGenerator::new(&[
        r##"{"caption": "Weekend tea tasting", "hashtags": "#tea #weekend", "call_to_action": "RSVP in bio"}"##,
    ]);
    let posts = sample_posts();
    let bundle = AnalysisBundle {
        account_type: Some(analyze_account_type(&posts)),
        posting_trends: Some(analyze_posting_trends(&posts)),
        ..AnalysisBundle::default()
    };
    let prediction = engine(&generator)
        .generate_next_post_prediction(&posts, &bundle)
        .await;

    assert_eq!(prediction.caption, "Weekend tea tasting");
    assert_eq!(prediction.hashtags, vec!["#tea", "#weekend"]);
    assert_eq!(prediction.image_prompt, IMAGE_PROMPT_FALLBACK);

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Recent caption: New tea collection launch with @tea_house"));
    assert!(prompt.contains("Commonly used hashtags: #tea, #matcha, #fitness, #shop"));
    assert!(prompt.contains("Posting trends: Posts most frequently on"));
}

#[tokio::test]
async fn next_post_falls_back_on_failure() {
    let generator = ScriptedGenerator::new(&[]);
    let prediction = engine(&generator)
        .generate_next_post_prediction(&sample_posts(), &AnalysisBundle::default())
        .await;
    assert_eq!(prediction, fallback_next_post());
}

#[tokio::test]
async fn competitors_are_padded_to_ten() {
    let generator = ScriptedGenerator::new(&[
        r#"```json
[
  {"account_name": "leafandcup", "reason": "Same niche", "unique_value": "Subscription boxes"},
  {"account_name": "", "reason": "blank names are dropped"},
  {"account_name": "brewlab", "reason": "Overlapping audience", "unique_value": "Gear reviews"}
]
```"#,
    ]);
    let competitors = engine(&generator)
        .identify_competitors(&sample_posts(), &Profile::default())
        .await;

    assert_eq!(competitors.len(), COMPETITOR_COUNT);
    assert_eq!(competitors[0].account_name, "leafandcup");
    assert_eq!(competitors[1].account_name, "brewlab");
    assert_eq!(competitors[2].account_name, "suggested_account_3");
    assert_eq!(competitors[9].account_name, "suggested_account_10");
    assert_eq!(competitors[9].reason, "Similar content and target audience");

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Accounts frequently mentioned: tea_house"));
}

#[tokio::test]
async fn competitors_accept_wrapped_and_single_objects() {
    let generator = ScriptedGenerator::new(&[
        r#"{"competitors": [{"account_name": "a"}, {"account_name": "b"}]}"#,
    ]);
    let wrapped = engine(&generator)
        .identify_competitors(&[], &Profile::default())
        .await;
    assert_eq!(wrapped[1].account_name, "b");
    assert_eq!(wrapped[2].account_name, "suggested_account_3");

    let generator = ScriptedGenerator::new(&[r#"{"account_name": "solo", "reason": "r"}"#]);
    let single = engine(&generator)
        .identify_competitors(&[], &Profile::default())
        .await;
    assert_eq!(single[0].account_name, "solo");
    assert_eq!(single.len(), COMPETITOR_COUNT);
}

#[tokio::test]
async fn competitors_fall_back_and_truncate() {
    let generator = ScriptedGenerator::new(&[]);
    let fallback = engine(&generator)
        .identify_competitors(&sample_posts(), &Profile::default())
        .await;
    let names: Vec<&str> = fallback.iter().map(|c| c.account_name.as_str()).collect();
    assert_eq!(names.first(), Some(&"competitor_1"));
    assert_eq!(names.last(), Some(&"competitor_10"));

    let many: Vec<String> = (0..12)
        .map(|i| format!(r#"{{"account_name": "acct{i}"}}"#))
        .collect();
    let response = format!("[{}]", many.join(","));
    let generator = ScriptedGenerator::new(&[response.as_str()]);
    let truncated = engine(&generator)
        .identify_competitors(&sample_posts(), &Profile::default())
        .await;
    assert_eq!(truncated.len(), COMPETITOR_COUNT);
    assert_eq!(truncated[9].account_name, "acct9");
}

#[tokio::test]
async fn improvements_are_padded_to_five() {
    let generator = ScriptedGenerator::new(&[
        r#"[
            {"recommendation": "Post reels weekly", "reasoning": "Reels reach further", "implementation": "Batch film on Sundays"},
            {"recommendation": "Reply to comments", "reasoning": "Builds loyalty", "implementation": "Set aside 10 minutes"}
        ]"#,
    ]);
    let bundle = AnalysisBundle {
        engagement: Some(analyze_engagement(&sample_posts())),
        ..AnalysisBundle::default()
    };
    let recs = engine(&generator)
        .generate_improvement_recommendations(&bundle)
        .await;

    assert_eq!(recs.len(), IMPROVEMENT_COUNT);
    assert_eq!(recs[0].recommendation, "Post reels weekly");
    assert_eq!(recs[2].recommendation, "Generic recommendation 3");
    assert_eq!(recs[4].implementation, "Follow best practices for Instagram growth");
    assert!(generator.prompts()[0].contains("Engagement analysis: "));
}

#[tokio::test]
async fn improvements_use_defaults_on_failure() {
    let generator = ScriptedGenerator::new(&[]);
    let recs = engine(&generator)
        .generate_improvement_recommendations(&AnalysisBundle::default())
        .await;
    assert_eq!(recs, default_improvements());
    assert_eq!(recs[0].recommendation, "Post more consistently");
}

#[tokio::test]
async fn content_plan_requires_posts() {
    let generator = ScriptedGenerator::new(&[]);
    let err = engine(&generator)
        .build_content_plan(
            "someone",
            &CanonicalDataset::default(),
            None,
            &SimilarityIndex::new(),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::NoPosts));
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn content_plan_without_forecast_uses_fallback_topics() {
    let generator = ScriptedGenerator::new(&[]);
    let dataset = CanonicalDataset {
        posts: sample_posts(),
        ..CanonicalDataset::default()
    };
    let now = "2024-06-10T08:30:00Z".parse::<DateTime<Utc>>().unwrap();
    let plan = engine(&generator)
        .build_content_plan("teashop", &dataset, None, &SimilarityIndex::new(), now)
        .await
        .unwrap();

    assert_eq!(plan.username, "teashop");
    assert_eq!(plan.generated_date, "2024-06-10 08:30:00");
    assert_eq!(plan.next_post_prediction, fallback_next_post());
    assert_eq!(plan.competitors.len(), COMPETITOR_COUNT);
    assert_eq!(plan.improvement_recommendations.len(), IMPROVEMENT_COUNT);
    assert!(plan.trending_topics.is_none());

    let topics = plan.topic_recommendations.unwrap();
    let mut expected: Vec<&str> = FALLBACK_TOPICS.to_vec();
    expected.sort_unstable();
    assert_eq!(topics.keys().map(String::as_str).collect::<Vec<_>>(), expected);
    assert!(topics.values().all(|recs| recs.len() == RECOMMENDATIONS_PER_TOPIC));
}

#[tokio::test]
async fn content_plan_recommends_for_trending_topics() {
    let records = rising_history();
    let forecast = EngagementAnalyzer::default().analyze(&records).unwrap();
    let dataset = CanonicalDataset {
        posts: sample_posts(),
        engagement_history: records,
        ..CanonicalDataset::default()
    };
    let mut index = SimilarityIndex::new();
    index.add_posts(&dataset.posts);

    let generator = ScriptedGenerator::new(&[]);
    let plan = engine(&generator)
        .build_content_plan("teashop", &dataset, Some(&forecast), &index, Utc::now())
        .await
        .unwrap();

    let trending = plan.trending_topics.unwrap();
    let names: Vec<&str> = trending.iter().map(|t| t.topic.as_str()).collect();
    assert_eq!(names, vec!["Trending on June 05", "Trending on June 06"]);
    let topics = plan.topic_recommendations.unwrap();
    assert!(topics.contains_key("Trending on June 05"));
    assert!(topics.contains_key("Trending on June 06"));
}

#[tokio::test]
async fn later_prompts_see_trending_topics_and_competitors() {
    let records = rising_history();
    let forecast = EngagementAnalyzer::default().analyze(&records).unwrap();
    let dataset = CanonicalDataset {
        posts: sample_posts(),
        engagement_history: records,
        ..CanonicalDataset::default()
    };

    let generator = ScriptedGenerator::new(&[]);
    let index = SimilarityIndex::new();
    engine(&generator)
        .build_content_plan("teashop", &dataset, Some(&forecast), &index, Utc::now())
        .await
        .unwrap();

    let prompts = generator.prompts();
    let next_post = prompts
        .iter()
        .find(|p| p.contains("Recent caption: "))
        .expect("next-post prompt");
    assert!(next_post.contains("Trending topics: Trending on June 05, Trending on June 06"));

    let improvements = prompts
        .iter()
        .find(|p| p.contains("Account analysis: "))
        .expect("improvement prompt");
    assert!(improvements.contains("Trending topics: Trending on June 05"));
    assert!(improvements.contains("Similar accounts: competitor_1, competitor_2"));
}
