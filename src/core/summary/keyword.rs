//! Keyword-based summarizer.
//!
//! Detects the conversation language from the ratio of Devanagari characters
//! to Latin words, spots a handful of restaurant topics in what the caller
//! said, and fills a fixed template. No network access.

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{CallSummary, Language, Summarizer, SummaryResult};
use crate::core::transcript::{Speaker, TranscriptEntry};

/// Summary used when nothing was recorded.
const EMPTY_TRANSCRIPT_SUMMARY: &str = "कोई बातचीत रिकॉर्ड नहीं हुई।";

/// Topics recognised in caller speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Order,
    Table,
    Menu,
    Price,
}

impl Topic {
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Topic::Order => &["order", "ऑर्डर"],
            Topic::Table => &["table", "टेबल", "booking"],
            Topic::Menu => &["menu", "मेन्यू"],
            Topic::Price => &["price", "कीमत"],
        }
    }

    const ALL: [Topic; 4] = [Topic::Order, Topic::Table, Topic::Menu, Topic::Price];
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn joined_lowercase<'a>(entries: impl Iterator<Item = &'a TranscriptEntry>) -> String {
    entries
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Classify the language of a whole transcript.
pub fn detect_language(transcript: &[TranscriptEntry]) -> Language {
    let text = joined_lowercase(transcript.iter());

    let hindi_chars = text.chars().filter(|c| is_devanagari(*c)).count();
    // Maximal runs of a-z
    let english_words = text
        .split(|c: char| !c.is_ascii_lowercase())
        .filter(|w| !w.is_empty())
        .count();

    let (hindi, english) = (hindi_chars as f64, english_words as f64);
    if hindi > english * 0.3 {
        if english > hindi * 0.5 {
            Language::Mixed
        } else {
            Language::Hindi
        }
    } else if english_words > 0 {
        Language::English
    } else {
        Language::Hindi
    }
}

/// Topics mentioned by the caller, in a fixed order.
pub fn extract_topics(transcript: &[TranscriptEntry]) -> Vec<Topic> {
    let text = joined_lowercase(transcript.iter().filter(|e| e.role == Speaker::Caller));
    Topic::ALL
        .into_iter()
        .filter(|topic| topic.keywords().iter().any(|k| text.contains(k)))
        .collect()
}

/// Template summarizer for a single business.
#[derive(Debug, Clone)]
pub struct KeywordSummarizer {
    business_name: String,
}

impl KeywordSummarizer {
    pub fn new(business_name: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
        }
    }

    /// Build the summary text synchronously.
    pub fn summarize_text(&self, transcript: &[TranscriptEntry]) -> (String, Language) {
        if transcript.is_empty() {
            return (EMPTY_TRANSCRIPT_SUMMARY.to_string(), Language::Hindi);
        }

        let language = detect_language(transcript);
        let topics = extract_topics(transcript);
        let caller_messages = transcript
            .iter()
            .filter(|e| e.role == Speaker::Caller)
            .count();

        let summary = match language {
            Language::Hindi => self.hindi(&topics, caller_messages),
            Language::English => self.english(&topics, caller_messages),
            Language::Mixed => self.mixed(caller_messages),
        };
        (summary, language)
    }

    fn hindi(&self, topics: &[Topic], n: usize) -> String {
        let business = &self.business_name;
        if topics.contains(&Topic::Order) {
            format!(
                "ग्राहक ने {business} से ऑर्डर के बारे में पूछताछ की। {n} संदेश आदान-प्रदान हुए। ग्राहक की मुख्य रुचि खाना ऑर्डर करने में थी।"
            )
        } else if topics.contains(&Topic::Table) {
            format!(
                "ग्राहक ने टेबल बुकिंग के लिए संपर्क किया। बातचीत में {n} मुख्य बिंदु थे। रेस्टोरेंट की जानकारी साझा की गई।"
            )
        } else {
            format!(
                "{business} के साथ {n} संदेशों की बातचीत हुई। ग्राहक ने रेस्टोरेंट की सेवाओं के बारे में जानकारी ली।"
            )
        }
    }

    fn english(&self, topics: &[Topic], n: usize) -> String {
        let business = &self.business_name;
        if topics.contains(&Topic::Order) {
            format!(
                "Customer inquired about placing an order at {business}. {n} messages were exchanged. Main interest was in food ordering."
            )
        } else if topics.contains(&Topic::Table) {
            format!(
                "Customer contacted for table booking. Conversation had {n} main points. Restaurant information was shared."
            )
        } else {
            format!(
                "{n} message conversation with {business}. Customer inquired about restaurant services and information."
            )
        }
    }

    fn mixed(&self, n: usize) -> String {
        format!(
            "{} के साथ mixed language conversation हुई। {n} messages exchange हुए। Customer ने restaurant services के बारे में inquire किया।",
            self.business_name
        )
    }
}

#[async_trait]
impl Summarizer for KeywordSummarizer {
    async fn summarize(&self, transcript: &[TranscriptEntry]) -> SummaryResult<CallSummary> {
        let (summary, language) = self.summarize_text(transcript);
        Ok(CallSummary {
            summary,
            language,
            turns: transcript.len(),
            generated_at: OffsetDateTime::now_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: Speaker, text: &str) -> TranscriptEntry {
        TranscriptEntry::now(role, text)
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(
            detect_language(&[entry(Speaker::Caller, "I would like to book a table")]),
            Language::English
        );
        assert_eq!(
            detect_language(&[entry(Speaker::Caller, "मुझे खाना ऑर्डर करना है")]),
            Language::Hindi
        );
        assert_eq!(
            detect_language(&[entry(
                Speaker::Caller,
                "mujhe ek table book karna hai for tonight please, कल शाम"
            )]),
            Language::Mixed
        );
        assert_eq!(detect_language(&[entry(Speaker::Caller, "123 ...")]), Language::Hindi);
    }

    #[test]
    fn test_topics_only_from_caller() {
        let transcript = vec![
            entry(Speaker::Assistant, "Would you like to see the menu or order?"),
            entry(Speaker::Caller, "What is the PRICE of a table booking?"),
        ];
        assert_eq!(extract_topics(&transcript), vec![Topic::Table, Topic::Price]);
    }

    #[test]
    fn test_empty_transcript() {
        let (summary, language) = KeywordSummarizer::new("Rolling Feast").summarize_text(&[]);
        assert_eq!(summary, EMPTY_TRANSCRIPT_SUMMARY);
        assert_eq!(language, Language::Hindi);
    }

    #[test]
    fn test_english_order_summary() {
        let transcript = vec![
            entry(Speaker::Assistant, "Hello! Welcome to Rolling Feast."),
            entry(Speaker::Caller, "Hi, I want to place an order for delivery."),
            entry(Speaker::Assistant, "Sure, what would you like?"),
            entry(Speaker::Caller, "Two paneer tikka please."),
        ];
        let (summary, language) = KeywordSummarizer::new("Rolling Feast").summarize_text(&transcript);
        assert_eq!(language, Language::English);
        assert_eq!(
            summary,
            "Customer inquired about placing an order at Rolling Feast. 2 messages were exchanged. Main interest was in food ordering."
        );
    }

    #[test]
    fn test_hindi_table_summary() {
        let transcript = vec![
            entry(Speaker::Assistant, "नमस्ते! आपका स्वागत है।"),
            entry(Speaker::Caller, "मुझे आज रात के लिए टेबल चाहिए"),
        ];
        let (summary, language) = KeywordSummarizer::new("Rolling Feast").summarize_text(&transcript);
        assert_eq!(language, Language::Hindi);
        assert!(summary.starts_with("ग्राहक ने टेबल बुकिंग के लिए संपर्क किया।"));
        assert!(summary.contains("1 मुख्य बिंदु"));
    }

    #[tokio::test]
    async fn test_summarize_counts_turns() {
        let transcript = vec![
            entry(Speaker::Assistant, "Hello!"),
            entry(Speaker::Caller, "What's on the menu?"),
        ];
        let summary = KeywordSummarizer::new("Rolling Feast")
            .summarize(&transcript)
            .await
            .unwrap();
        assert_eq!(summary.turns, 2);
        assert_eq!(summary.language, Language::English);
        assert_eq!(
            summary.summary,
            "1 message conversation with Rolling Feast. Customer inquired about restaurant services and information."
        );
    }
}
