use itertools::Itertools;

use crate::model::{PromptVariant, ResultRecord, Split};

/// Build the instruction block sent to the text generation model.
pub fn build_prompt(result: &ResultRecord, variant: PromptVariant) -> String {
    let splits_text = if result.splits.is_empty() {
        "Splits data not available".to_string()
    } else {
        result
            .splits
            .iter()
            .map(|s| format!("- {}: {}", s.workout, s.time))
            .join("\n")
    };

    let slowest_text = slowest_split(&result.splits)
        .map(|s| format!("Their slowest split was {} at {}.", s.workout, s.time))
        .unwrap_or_default();

    let instructions = match variant {
        PromptVariant::Structured => STRUCTURED_INSTRUCTIONS,
        PromptVariant::Plain => PLAIN_INSTRUCTIONS,
    };

    format!(
        "You are a witty, playful fitness commentator roasting a Hyrox athlete's performance. \
Your job is to create a humorous, entertaining roast that's funny but not mean-spirited.

ATHLETE PERFORMANCE DATA:
- Name: {name}
- Total Time: {total_time}
- Overall Position: #{overall}
- Category Position: #{category}

WORKOUT SPLITS:
{splits_text}
{slowest_text}

{instructions}",
        name = result.athlete_name,
        total_time = result.total_time,
        overall = result.overall_position,
        category = result.category_position,
    )
}

/// The split with the greatest time *string*.
///
/// Times are compared as text, not durations, so `"9:59"` beats
/// `"1:02:00"`. Ties keep the earlier split.
pub fn slowest_split(splits: &[Split]) -> Option<&Split> {
    splits
        .iter()
        .reduce(|slowest, current| if current.time > slowest.time { current } else { slowest })
}

const STRUCTURED_INSTRUCTIONS: &str = r##"INSTRUCTIONS FOR ROAST:
1. Create a humorous, playful roast that is SHORT and punchy (100-120 words MAX, 2-3 sentences)
2. Focus on quick one-liners and snappy humor - perfect for Instagram Stories
3. Point out interesting aspects like slowest splits, finish time, or position
4. Make playful jokes - like friendly banter between training partners
5. Keep it shareable and entertaining for social media - mobile-friendly and quick to read
6. Don't be mean-spirited or overly harsh - this should be fun and motivating
7. Use emojis naturally (2-3 emojis total) - sprinkle them for personality
8. Make it feel like a friendly roast from a fellow athlete who's been there
9. Be punchy and get to the point quickly - Instagram users scroll fast!

INSTRUCTIONS FOR TITLE:
Create a short, catchy title (3-5 words) that matches the roast tone. Examples: "WELL, WELL, WELL!", "SPEED DEMON ALERT", "FINISHER VIBES", "RESPECT THE GRIND", "YOU DID IT!". Make it playful and attention-grabbing.

INSTRUCTIONS FOR HASHTAGS:
Generate 8-12 relevant hashtags. Include a mix of:
- Hyrox-specific: #hyrox #hyroxrace #hyroxathlete #hyroxfinisher
- Fitness: #functionalfitness #fitness #crossfit #endurance
- Humor: #roast #roastme #fitnesshumor
- Engagement: #motivation #fitspo #workout #training

Format your response as JSON with three fields:
{
  "title": "YOUR TITLE HERE",
  "roast": "YOUR ROAST TEXT HERE",
  "hashtags": "#hashtag1 #hashtag2 #hashtag3 ..."
}

Generate the response now:"##;

const PLAIN_INSTRUCTIONS: &str = r#"INSTRUCTIONS:
1. Create a humorous, playful roast (2-3 short paragraphs)
2. Be witty and funny, but keep it light-hearted and constructive
3. Point out interesting aspects like slowest splits, position relative to field size
4. Make playful jokes about their performance - like a friendly banter between training partners
5. Keep it shareable and entertaining for social media
6. Don't be mean-spirited or overly harsh - this should be fun and motivating
7. Use emojis sparingly (1-2 max) if it adds to the humor
8. Make it feel like a friendly roast from a fellow athlete who's been there

Generate the roast now:"#;
