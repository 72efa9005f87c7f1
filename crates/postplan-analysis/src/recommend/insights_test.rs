use super::*;

fn post(caption: &str, hashtags: &[&str], engagement: u64, timestamp: &str, kind: &str) -> Post {
    Post {
        id: caption.len().to_string(),
        caption: caption.to_string(),
        hashtags: hashtags.iter().map(|s| (*s).to_string()).collect(),
        engagement,
        likes: engagement,
        comments: 0,
        timestamp: timestamp.to_string(),
        url: String::new(),
        post_type: kind.to_string(),
    }
}

fn captioned(caption: &str) -> Post {
    post(caption, &[], 1, "", "Image")
}

#[test]
fn tally_keeps_first_seen_order() {
    assert_eq!(
        tally(["b", "a", "b", "c", "a"]),
        vec![("b", 2), ("a", 2), ("c", 1)]
    );
}

#[test]
fn most_common_breaks_ties_by_first_appearance() {
    let tags = ["#x", "#y", "#z", "#y", "#z", "#w"];
    assert_eq!(most_common(tags, 3), vec!["#y", "#z", "#x"]);
}

#[test]
fn zero_posts_is_unknown_with_no_confidence() {
    let analysis = analyze_account_type(&[]);
    assert_eq!(analysis.account_type, AccountClass::Unknown);
    assert!(analysis.confidence.abs() < f64::EPSILON);
}

#[test]
fn seven_of_ten_sale_captions_is_business() {
    let mut posts: Vec<Post> = (0..7)
        .map(|i| captioned(if i % 2 == 0 { "Big SALE today" } else { "Visit our shop" }))
        .collect();
    posts.extend((0..3).map(|_| captioned("Sunset at the beach")));

    let analysis = analyze_account_type(&posts);
    assert_eq!(analysis.account_type, AccountClass::Business);
    assert!(analysis.confidence >= 70.0);
    assert!(analysis.analysis.contains("70.0% confidence"));
}

#[test]
fn business_hashtags_alone_can_classify_business() {
    let posts = vec![
        post("Morning run", &["#ShopLocal", "#Marketing101"], 1, "", "Image"),
        post("Evening swim", &["#fun"], 1, "", "Image"),
    ];
    let analysis = analyze_account_type(&posts);
    assert_eq!(analysis.account_type, AccountClass::Business);
    // Caption share is 0%, so confidence is the floor.
    assert!((analysis.confidence - 60.0).abs() < f64::EPSILON);
}

#[test]
fn personal_confidence_is_complement_clamped() {
    let posts = vec![
        captioned("New product drop"),
        captioned("Hiking with friends"),
        captioned("Coffee and books"),
        captioned("Rainy day"),
    ];
    let analysis = analyze_account_type(&posts);
    assert_eq!(analysis.account_type, AccountClass::Personal);
    assert!((analysis.confidence - 75.0).abs() < f64::EPSILON);
    assert!(analysis.analysis.contains("Only 1 out of 4 posts"));
}

#[test]
fn engagement_groups_by_type_and_category() {
    let posts = vec![
        post("a", &["#Fashion"], 100, "", "Image"),
        post("b", &["#food"], 300, "", "Video"),
        post("c", &["#style", "#Travel"], 200, "", "Sidecar"),
        post("d", &[], 50, "", "Image"),
    ];
    let analysis = analyze_engagement(&posts);

    let photo = &analysis.content_type_analysis["photo"];
    assert_eq!(photo.count, 2);
    assert_eq!(photo.total_engagement, 150);
    assert!((photo.average_engagement - 75.0).abs() < f64::EPSILON);
    assert_eq!(analysis.content_type_analysis["carousel"].count, 1);
    assert!(!analysis.content_type_analysis.contains_key("text_only"));

    assert_eq!(analysis.category_analysis["fashion"].count, 2);
    assert_eq!(analysis.category_analysis["fashion"].total_engagement, 300);
    assert_eq!(analysis.category_analysis["travel"].count, 1);

    assert_eq!(analysis.best_performing_content.as_deref(), Some("video"));
    assert_eq!(analysis.best_performing_category.as_deref(), Some("food"));
    assert!(analysis
        .summary
        .starts_with("The account performs best with video content about food."));
}

#[test]
fn engagement_ties_go_to_earlier_group() {
    let posts = vec![
        post("a", &["#travel"], 100, "", "Video"),
        post("b", &["#fitness"], 100, "", "Image"),
    ];
    let analysis = analyze_engagement(&posts);
    assert_eq!(analysis.best_performing_content.as_deref(), Some("photo"));
    assert_eq!(analysis.best_performing_category.as_deref(), Some("travel"));
}

#[test]
fn engagement_without_categories_reports_insufficient_data() {
    let analysis = analyze_engagement(&[post("a", &["#random"], 10, "", "Image")]);
    assert_eq!(analysis.best_performing_content.as_deref(), Some("photo"));
    assert!(analysis.best_performing_category.is_none());
    assert_eq!(
        analysis.summary,
        "Insufficient data to determine best performing content."
    );
}

#[test]
fn posting_trends_find_busiest_day_and_hour() {
    // 2024-06-03 is a Monday.
    let posts = vec![
        post("a", &[], 1, "2024-06-03T15:00:00Z", "Image"),
        post("b", &[], 1, "2024-06-10T15:30:00Z", "Image"),
        post("c", &[], 1, "2024-06-11T09:00:00Z", "Image"),
        post("d", &[], 1, "2024-06-12T00:10:00Z", "Image"),
        post("e", &[], 1, "", "Image"),
    ];
    let trends = analyze_posting_trends(&posts);

    assert_eq!(trends.most_active_day.as_deref(), Some("Monday"));
    assert_eq!(trends.most_active_hour, Some(15));
    assert_eq!(trends.hour_formatted.as_deref(), Some("3 PM"));
    assert_eq!(trends.day_distribution["Monday"], 2);
    assert_eq!(trends.hour_distribution[&0u32], 1);
    // Four posts over a span of eight whole days, counted inclusively.
    assert!((trends.posts_per_day - 4.0 / 9.0).abs() < 1e-9);
    assert_eq!(trends.high_activity_months["June"], 4);
    assert_eq!(
        trends.summary,
        "Posts most frequently on Mondays at around 3 PM. Average posting frequency is 0.4 posts per day. \
         Higher posting activity during: June."
    );
}

#[test]
fn midnight_formats_as_twelve_am() {
    assert_eq!(format_hour(0), "12 AM");
    assert_eq!(format_hour(12), "12 PM");
    assert_eq!(format_hour(23), "11 PM");
}

#[test]
fn posting_trends_without_timestamps() {
    let trends = analyze_posting_trends(&[captioned("no time")]);
    assert!(trends.most_active_day.is_none());
    assert_eq!(
        trends.summary,
        "Insufficient timestamp data to analyze posting trends."
    );
}
