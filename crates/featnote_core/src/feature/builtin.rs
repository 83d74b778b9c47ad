//! Built-in feature catalog.
//!
//! Output formats are part of the persisted/exported contract and must stay
//! byte-for-byte stable.

use crate::feature::context::ComputeContext;
use crate::feature::definition::{
    ComputeResult, DefaultConfig, FeatureCategory, FeatureDefinition, FeatureKind, RenderHint,
};
use crate::model::note::Note;
use crate::model::value::{AttributeValue, TagCount};

pub const WORD_COUNT: &str = "word-count";
pub const READING_TIME: &str = "reading-time";
pub const CHAR_COUNT: &str = "char-count";
pub const LAST_EDITED: &str = "last-edited";
pub const PRIORITY: &str = "priority";
pub const STATUS: &str = "status";
pub const DUE_DATE: &str = "due-date";
pub const TOTAL_NOTES: &str = "total-notes";
pub const TOTAL_WORDS: &str = "total-words";
pub const TAG_STATS: &str = "tag-stats";

const WORDS_PER_MINUTE: usize = 200;
const TAG_STATS_LIMIT: usize = 5;
const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Returns every built-in definition in catalog order.
pub fn builtin_features() -> Vec<FeatureDefinition> {
    vec![
        computed(WORD_COUNT, "Word Count", FeatureCategory::Analytics)
            .with_description("Number of words in the note")
            .with_icon("📊")
            .with_render_as(RenderHint::Number)
            .with_compute(compute_word_count),
        computed(READING_TIME, "Reading Time", FeatureCategory::Analytics)
            .with_description("Estimated reading time")
            .with_icon("⏱️")
            .with_render_as(RenderHint::Text)
            .with_compute(compute_reading_time),
        computed(CHAR_COUNT, "Character Count", FeatureCategory::Analytics)
            .with_description("Total characters including spaces")
            .with_icon("🔤")
            .with_render_as(RenderHint::Number)
            .with_compute(compute_char_count),
        computed(LAST_EDITED, "Last Edited", FeatureCategory::Organization)
            .with_description("Relative time since last edit")
            .with_icon("🕐")
            .with_render_as(RenderHint::Text)
            .with_compute(compute_last_edited),
        property(PRIORITY, "Priority", FeatureCategory::Organization)
            .with_description("Set note priority level")
            .with_icon("⚡")
            .with_render_as(RenderHint::Badge)
            .with_default_config(
                DefaultConfig::with_options(["High", "Medium", "Low"])
                    .with_color("High", "red")
                    .with_color("Medium", "yellow")
                    .with_color("Low", "green"),
            ),
        property(STATUS, "Status", FeatureCategory::Productivity)
            .with_description("Track note status")
            .with_icon("✅")
            .with_render_as(RenderHint::Badge)
            .with_default_config(DefaultConfig::with_options([
                "Draft",
                "In Progress",
                "Complete",
                "Archived",
            ])),
        property(DUE_DATE, "Due Date", FeatureCategory::Productivity)
            .with_description("Set a deadline")
            .with_icon("📅")
            .with_render_as(RenderHint::Date),
        rollup(TOTAL_NOTES, "Total Notes")
            .with_description("Count of all notes")
            .with_icon("📝")
            .with_render_as(RenderHint::Number)
            .with_compute(compute_total_notes),
        rollup(TOTAL_WORDS, "Total Words")
            .with_description("Sum of words across all notes")
            .with_icon("📈")
            .with_render_as(RenderHint::Number)
            .with_compute(compute_total_words),
        rollup(TAG_STATS, "Tag Statistics")
            .with_description("Most used tags")
            .with_icon("🏷️")
            .with_compute(compute_tag_stats),
    ]
}

fn computed(id: &str, name: &str, category: FeatureCategory) -> FeatureDefinition {
    FeatureDefinition::new(id, name, FeatureKind::Computed, category).with_attribute_role(id)
}

fn property(id: &str, name: &str, category: FeatureCategory) -> FeatureDefinition {
    FeatureDefinition::new(id, name, FeatureKind::Property, category).with_attribute_role(id)
}

fn rollup(id: &str, name: &str) -> FeatureDefinition {
    FeatureDefinition::new(id, name, FeatureKind::Rollup, FeatureCategory::Analytics)
        .with_attribute_role(id)
}

/// Counts whitespace-delimited, non-empty tokens.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// `ceil(words / 200)` minutes rendered as `"<n> min"`.
pub fn reading_time(words: usize) -> String {
    format!("{} min", words.div_ceil(WORDS_PER_MINUTE))
}

/// Relative label for the elapsed milliseconds between an edit and `now`.
pub fn relative_age(elapsed_ms: i64) -> String {
    let elapsed = elapsed_ms.max(0);
    if elapsed >= DAY_MS {
        format!("{}d ago", elapsed / DAY_MS)
    } else if elapsed >= HOUR_MS {
        format!("{}h ago", elapsed / HOUR_MS)
    } else if elapsed >= MINUTE_MS {
        format!("{}m ago", elapsed / MINUTE_MS)
    } else {
        "just now".to_string()
    }
}

/// Tag occurrence ranking across `notes`.
///
/// Sorted by count descending; ties keep first-encounter order. Truncated to
/// the top five entries.
pub fn tag_stats(notes: &[Note]) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    for note in notes {
        for tag in &note.tags {
            match counts.iter_mut().find(|entry| &entry.tag == tag) {
                Some(entry) => entry.count += 1,
                None => counts.push(TagCount::new(tag.clone(), 1)),
            }
        }
    }
    // Stable sort keeps encounter order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TAG_STATS_LIMIT);
    counts
}

fn count_to_value(count: usize) -> ComputeResult {
    i64::try_from(count)
        .map(AttributeValue::Number)
        .map_err(|_| format!("count {count} exceeds the numeric attribute range"))
}

fn compute_word_count(note: &Note, _context: &ComputeContext) -> ComputeResult {
    count_to_value(word_count(&note.content))
}

fn compute_reading_time(note: &Note, _context: &ComputeContext) -> ComputeResult {
    Ok(AttributeValue::Text(reading_time(word_count(&note.content))))
}

fn compute_char_count(note: &Note, _context: &ComputeContext) -> ComputeResult {
    count_to_value(note.content.chars().count())
}

fn compute_last_edited(note: &Note, context: &ComputeContext) -> ComputeResult {
    let elapsed = context.timestamp().saturating_sub(note.updated_at);
    Ok(AttributeValue::Text(relative_age(elapsed)))
}

fn compute_total_notes(_note: &Note, context: &ComputeContext) -> ComputeResult {
    count_to_value(context.all_notes().len())
}

fn compute_total_words(_note: &Note, context: &ComputeContext) -> ComputeResult {
    let total = context
        .all_notes()
        .iter()
        .map(|note| word_count(&note.content))
        .sum();
    count_to_value(total)
}

fn compute_tag_stats(_note: &Note, context: &ComputeContext) -> ComputeResult {
    Ok(AttributeValue::Ranking(tag_stats(context.all_notes())))
}

#[cfg(test)]
mod tests {
    use super::{reading_time, relative_age, tag_stats, word_count, DAY_MS, HOUR_MS, MINUTE_MS};
    use crate::model::note::{NewNote, Note};
    use crate::model::value::TagCount;

    #[test]
    fn word_count_ignores_repeated_whitespace() {
        assert_eq!(word_count("  one\ttwo \n\n three  "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(0), "0 min");
        assert_eq!(reading_time(1), "1 min");
        assert_eq!(reading_time(200), "1 min");
        assert_eq!(reading_time(201), "2 min");
        assert_eq!(reading_time(400), "2 min");
    }

    #[test]
    fn relative_age_uses_descending_buckets() {
        assert_eq!(relative_age(0), "just now");
        assert_eq!(relative_age(MINUTE_MS - 1), "just now");
        assert_eq!(relative_age(MINUTE_MS), "1m ago");
        assert_eq!(relative_age(HOUR_MS - 1), "59m ago");
        assert_eq!(relative_age(HOUR_MS), "1h ago");
        assert_eq!(relative_age(DAY_MS - 1), "23h ago");
        assert_eq!(relative_age(3 * DAY_MS + HOUR_MS), "3d ago");
        assert_eq!(relative_age(-5_000), "just now");
    }

    #[test]
    fn tag_stats_sorts_by_count_then_encounter_order() {
        let notes = vec![
            Note::create(NewNote::new("1", "").with_tags(["a", "b"]), 0),
            Note::create(NewNote::new("2", "").with_tags(["a"]), 0),
            Note::create(NewNote::new("3", "").with_tags(["c"]), 0),
        ];
        assert_eq!(
            tag_stats(&notes),
            vec![
                TagCount::new("a", 2),
                TagCount::new("b", 1),
                TagCount::new("c", 1)
            ]
        );
    }

    #[test]
    fn tag_stats_truncates_to_top_five() {
        let notes = vec![
            Note::create(NewNote::new("1", "").with_tags(["t1", "t2", "t3", "t4", "t5", "t6"]), 0),
            Note::create(NewNote::new("2", "").with_tags(["t6"]), 0),
        ];
        let stats = tag_stats(&notes);
        assert_eq!(stats.len(), 5);
        assert_eq!(stats[0], TagCount::new("t6", 2));
        assert_eq!(stats[1], TagCount::new("t1", 1));
        assert_eq!(stats[4], TagCount::new("t4", 1));
    }
}
