//! Proactive questions picked by keyword matching over recent memory keys.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::config::UserProfile;
use crate::memory::Facade;

const RECENT_KEYS: usize = 5;

const CAR_QUESTION: &str =
    "I noticed recent car-related activity. Should we research new automotive tech or modifications?";
const AI_QUESTION: &str =
    "Your AI projects are progressing. Want me to explore cutting-edge AI tools or techniques?";
const GIG_QUESTION: &str =
    "For your rideshare work, should we research driver optimization tools or vehicle efficiency mods?";

/// Pick a question for the given recent keys. Matching is case-insensitive
/// and checked in order: car, ai, gig work. Falls back to a random interest.
pub fn generate_question<R: Rng + ?Sized>(
    recent_keys: &[String],
    profile: &UserProfile,
    rng: &mut R,
) -> String {
    let haystack = recent_keys.join(" ").to_lowercase();

    if haystack.contains("car") {
        return CAR_QUESTION.to_string();
    }
    if haystack.contains("ai") {
        return AI_QUESTION.to_string();
    }

    let gig = ["gig".to_string(), "uber".to_string()]
        .into_iter()
        .chain(profile.work.iter().map(|w| w.to_lowercase()))
        .any(|term| !term.is_empty() && haystack.contains(&term));
    if gig {
        return GIG_QUESTION.to_string();
    }

    let topic = profile
        .interests
        .choose(rng)
        .map(String::as_str)
        .unwrap_or("tech");
    format!("I haven't seen much {topic} activity lately. Want me to find the latest developments?")
}

/// Question for the facade's current state.
pub fn contextual_question(facade: &Facade) -> String {
    generate_question(&facade.recent_keys(RECENT_KEYS), facade.profile(), &mut rand::rng())
}

/// Generate a question and file it as a medium-priority task due in two hours.
pub fn create_question_task(facade: &Facade, now: DateTime<Utc>) -> Result<(i64, String)> {
    let question = contextual_question(facade);
    let id = facade.create_task(
        "AI Generated Question",
        &format!("Question for {}: {question}", facade.profile().name),
        4,
        Some(now + Duration::hours(2)),
    )?;
    Ok((id, question))
}
