//! Trivia shown while AI insights are loading.

use std::time::Duration;

/// How long each fact stays on screen.
pub const FACT_INTERVAL: Duration = Duration::from_secs(5);

/// Shown above the rotating fact.
pub const LOADING_HEADLINE: &str = "Analyzing community data...";

/// Facts cycled on the insights spinner, in display order.
pub const LOADING_FACTS: &[&str] = &[
    "The U.S. Census Bureau has been conducting the national census every 10 years since 1790.",
    "ZIP codes were introduced in 1963 to make mail delivery faster and more efficient.",
    "The most populated ZIP code in the U.S. is 77449, located in Katy, Texas.",
    "Alaska has the lowest population density of any U.S. state: less than 2 people per square mile.",
    "The word \"demographics\" comes from the Greek words demos (people) and graphein (to write).",
    "In the U.S., about 82% of people live in urban areas.",
    "Hawaii is the only U.S. state that grows coffee commercially.",
    "There are over 41,000 ZIP codes across the United States.",
    "Cartography, the art and science of making maps, dates back more than 5,000 years.",
    "The geographic center of the contiguous U.S. is near Lebanon, Kansas.",
    "Over 350 languages are spoken in American homes.",
    "More than half of the world's population now lives in cities.",
    "California alone has more people than the entire country of Canada.",
    "Rural ZIP codes cover about 97% of U.S. land area but house less than 20% of the population.",
    "The highest ZIP code number in the U.S. is 99950, in Ketchikan, Alaska.",
    "The Census Bureau's American Community Survey updates data every year, not just every decade.",
    "Cartographers use satellite imagery, GPS, and AI to keep modern maps up to date.",
    "The population of the U.S. doubles roughly every 50-70 years.",
    "Washington, D.C., has no \"counties\". It's divided into neighborhoods instead.",
    "The average ZIP code in the U.S. contains about 7,000 to 10,000 people.",
];

/// The fact for the `tick`th interval, cycling through the list.
#[must_use]
pub fn fact_for(tick: usize) -> &'static str {
    LOADING_FACTS[tick % LOADING_FACTS.len()]
}

/// The fact to show after `elapsed` time spent loading.
#[must_use]
pub fn fact_after(elapsed: Duration) -> &'static str {
    let tick = elapsed.as_secs() / FACT_INTERVAL.as_secs();
    #[allow(clippy::cast_possible_truncation)]
    fact_for(tick as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facts_cycle() {
        assert_eq!(fact_for(0), LOADING_FACTS[0]);
        assert_eq!(fact_for(LOADING_FACTS.len()), LOADING_FACTS[0]);
        assert_eq!(fact_for(LOADING_FACTS.len() + 3), LOADING_FACTS[3]);
    }

    #[test]
    fn fact_changes_every_interval() {
        assert_eq!(fact_after(Duration::from_secs(4)), LOADING_FACTS[0]);
        assert_eq!(fact_after(Duration::from_secs(5)), LOADING_FACTS[1]);
        assert_eq!(fact_after(Duration::from_secs(11)), LOADING_FACTS[2]);
    }
}
