//! Prompt text sent to the generator.

/// JSON shape a prompt asks for, reused when asking the generator to
/// reformat an unparseable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponseShape {
    Recommendation,
    NextPost,
    Competitors,
    Improvements,
}

impl ResponseShape {
    fn example(self) -> &'static str {
        match self {
            ResponseShape::Recommendation => {
                r##"{
  "caption": "The main caption text",
  "hashtags": ["#hashtag1", "#hashtag2"],
  "call_to_action": "The call to action text"
}"##
            }
            ResponseShape::NextPost => {
                r##"{
  "caption": "Predicted caption text",
  "hashtags": ["#hashtag1", "#hashtag2"],
  "call_to_action": "Predicted call to action",
  "image_prompt": "Detailed image prompt for AI generator"
}"##
            }
            ResponseShape::Competitors => {
                r#"[
  {
    "account_name": "competitor1",
    "reason": "Why they are a competitor",
    "unique_value": "What makes them different"
  }
]"#
            }
            ResponseShape::Improvements => {
                r#"[
  {
    "recommendation": "Clear action item",
    "reasoning": "Why this would help",
    "implementation": "How to implement it"
  }
]"#
            }
        }
    }
}

/// Stand-in retrieval context when the index has nothing for `topic`.
pub(crate) fn synthetic_context(topic: &str) -> Vec<String> {
    vec![
        format!("Create engaging content about {topic}"),
        format!("Users respond well to posts about {topic} with clear calls to action"),
        format!("Visual content about {topic} gets high engagement"),
    ]
}

fn bullet_list(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn recommendation(topic: &str, context: &[String]) -> String {
    format!(
        "You are an expert social media content creator. Based on the following context from successful posts:\n\
         \n\
         {context}\n\
         \n\
         Generate a creative and engaging social media post about {topic}.\n\
         \n\
         Include:\n\
         1. An attention-grabbing caption\n\
         2. Relevant hashtags\n\
         3. A call to action\n\
         \n\
         Output format should be JSON with the following fields:\n\
         {shape}\n\
         \n\
         Ensure your response is only the JSON object, nothing else.",
        context = bullet_list(context),
        shape = ResponseShape::Recommendation.example(),
    )
}

pub(crate) fn reformat(text: &str, shape: ResponseShape) -> String {
    format!(
        "Convert the following text into properly formatted JSON:\n\
         \n\
         {text}\n\
         \n\
         Format as:\n\
         {shape}\n\
         \n\
         Return ONLY the JSON, nothing else.",
        shape = shape.example(),
    )
}

pub(crate) fn batch(topics: &[String], contexts: &[(String, Vec<String>)], per_topic: usize) -> String {
    let quoted = topics
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let context_section = contexts
        .iter()
        .map(|(topic, lines)| format!("Context for '{topic}':\n{}", bullet_list(lines)))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an expert social media content creator. I need you to generate content recommendations \
         for the following topics: {quoted}.\n\
         \n\
         For each topic, provide {per_topic} different content ideas. Each idea should include:\n\
         1. An attention-grabbing caption\n\
         2. Relevant hashtags\n\
         3. A call to action\n\
         \n\
         Use the following context from successful posts to inform your recommendations:\n\
         \n\
         {context_section}\n\
         \n\
         Format your response as a JSON object with topics as keys and arrays of recommendations as values:\n\
         {{\n\
           \"topic1\": [\n\
             {{\"caption\": \"Caption text\", \"hashtags\": [\"#Hashtag1\"], \"call_to_action\": \"Call to action text\"}}\n\
           ]\n\
         }}\n\
         \n\
         Be creative and engaging. Use the specific topic keywords in your recommendations."
    )
}

pub(crate) fn next_post(context: &str) -> String {
    format!(
        "Based on the following context about an Instagram account:\n\
         \n\
         {context}\n\
         \n\
         Generate a prediction for their next post, including:\n\
         1. A caption that matches their style\n\
         2. Relevant hashtags they would likely use\n\
         3. A call to action consistent with their previous posts\n\
         4. A brief image prompt that could be used with an AI image generator to create a suitable image\n\
         \n\
         Format your response as a JSON object with the following structure:\n\
         {shape}",
        shape = ResponseShape::NextPost.example(),
    )
}

pub(crate) fn competitors(context: &str, count: usize) -> String {
    format!(
        "Based on the following information about an Instagram account:\n\
         \n\
         {context}\n\
         \n\
         Identify {count} potential competitors or similar accounts that would appeal to the same audience.\n\
         For each competitor, provide:\n\
         1. A suggested account name\n\
         2. Why they are a competitor\n\
         3. What makes them different or unique\n\
         \n\
         Format your response as a JSON array with the following structure:\n\
         {shape}\n\
         \n\
         Be specific and realistic in your suggestions. If the account appears to be in a specific niche or industry, \
         suggest real competitors in that space.",
        shape = ResponseShape::Competitors.example(),
    )
}

pub(crate) fn improvements(context: &str, count: usize) -> String {
    format!(
        "Based on the following analysis of an Instagram account:\n\
         \n\
         {context}\n\
         \n\
         Generate {count} specific, actionable recommendations for how the account holder can improve their Instagram presence.\n\
         For each recommendation, provide:\n\
         1. A clear, specific action item\n\
         2. Why this would help (the reasoning)\n\
         3. How to implement it (practical steps)\n\
         \n\
         Format your response as a JSON array with the following structure:\n\
         {shape}\n\
         \n\
         Be specific, practical, and tailored to the account's current performance.",
        shape = ResponseShape::Improvements.example(),
    )
}
