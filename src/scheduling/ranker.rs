use std::cmp::Ordering;

use crate::models::MeetingSuggestion;

/// How many suggestions a caller gets back
pub const MAX_SUGGESTIONS: usize = 3;

/// Best candidates first, at most [`MAX_SUGGESTIONS`].
///
/// The sort is stable, so among equal scores the earlier start wins.
pub fn rank(mut candidates: Vec<MeetingSuggestion>) -> Vec<MeetingSuggestion> {
    candidates.retain(|c| c.score > 0.0);
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates.truncate(MAX_SUGGESTIONS);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, SlotParticipants};

    fn candidate(start: &str, score: f64) -> MeetingSuggestion {
        MeetingSuggestion {
            date: "Monday, March 3, 2025".to_string(),
            day: Day::Monday,
            start_time: format!("{} UTC", start),
            end_time: String::new(),
            raw_start_time: start.to_string(),
            raw_end_time: String::new(),
            score,
            participants: SlotParticipants::default(),
        }
    }

    fn starts(ranked: &[MeetingSuggestion]) -> Vec<&str> {
        ranked.iter().map(|c| c.raw_start_time.as_str()).collect()
    }

    #[test]
    fn test_sorted_and_truncated() {
        let ranked = rank(vec![
            candidate("9:00", 0.25),
            candidate("10:00", 0.75),
            candidate("11:00", 0.5),
            candidate("12:00", 1.0),
            candidate("13:00", 0.1),
        ]);
        assert_eq!(starts(&ranked), vec!["12:00", "10:00", "11:00"]);
    }

    #[test]
    fn test_ties_keep_menu_order() {
        let ranked = rank(vec![
            candidate("9:00", 0.5),
            candidate("10:00", 1.0),
            candidate("11:00", 0.5),
            candidate("12:00", 1.0),
            candidate("13:00", 1.0),
            candidate("14:00", 1.0),
        ]);
        assert_eq!(starts(&ranked), vec!["10:00", "12:00", "13:00"]);
    }

    #[test]
    fn test_empty_and_zero_scores() {
        assert!(rank(Vec::new()).is_empty());
        assert!(rank(vec![candidate("9:00", 0.0)]).is_empty());
        assert_eq!(rank(vec![candidate("9:00", 0.5)]).len(), 1);
    }
}
