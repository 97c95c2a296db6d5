//! Pattern discovery for the per-pattern activity metric.

use std::collections::BTreeSet;

/// Builds the set of patterns to probe with `PUBSUB CHANNELS <pattern>`.
///
/// The result is the operator-configured patterns plus one `<prefix>.*`
/// per channel name containing a `.`, where `<prefix>` is the text before
/// the first `.`. Only one level of hierarchy is discovered.
pub fn discover_patterns<'a>(
    known_patterns: &[String],
    channels: impl IntoIterator<Item = &'a str>,
) -> BTreeSet<String> {
    let mut patterns: BTreeSet<String> = known_patterns.iter().cloned().collect();

    patterns.extend(
        channels
            .into_iter()
            .filter_map(|channel| channel.split_once('.'))
            .map(|(prefix, _)| format!("{prefix}.*")),
    );

    patterns
}
