//! Chat analysis - Analisi delle conversazioni per la supervisione dei genitori
//!
//! L'analizzatore di default è deterministico: cerca termini da lessici per categoria
//! di rischio e stima il tono complessivo da due lessici (positivo/negativo).

use crate::entities::Message;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

const EXCERPT_CHARS: usize = 120;

/// Flag oltre i quali il rischio è alto anche senza categorie gravi
const HIGH_RISK_FLAG_COUNT: usize = 3;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Bullying,
    Profanity,
    PersonalInfo,
    MeetingRequest,
    SelfHarm,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Bullying => "bullying",
            RiskCategory::Profanity => "profanity",
            RiskCategory::PersonalInfo => "personal_info",
            RiskCategory::MeetingRequest => "meeting_request",
            RiskCategory::SelfHarm => "self_harm",
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedMessage {
    pub message_id: i32,
    pub sender_id: i32,
    pub from_child: bool,
    pub category: RiskCategory,
    pub matched: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnalysis {
    pub messages_analyzed: usize,
    pub child_message_count: usize,
    pub risk_level: RiskLevel,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub category_counts: BTreeMap<RiskCategory, usize>,
    pub flags: Vec<FlaggedMessage>,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Punto di estensione per analizzatori alternativi (es. un modello remoto)
pub trait ChatAnalyzer: Send + Sync {
    fn analyze(&self, child_id: i32, messages: &[Message]) -> ChatAnalysis;
}

fn word_pattern(terms: &[&str]) -> Regex {
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
}

lazy_static! {
    static ref CATEGORY_PATTERNS: Vec<(RiskCategory, Regex)> = vec![
        (
            RiskCategory::SelfHarm,
            word_pattern(&[
                "kill myself", "kill yourself", "want to die", "hurt myself", "suicide",
                "end it all", "self harm", "cut myself",
            ]),
        ),
        (
            RiskCategory::Bullying,
            word_pattern(&[
                "loser", "stupid", "idiot", "nobody likes you", "shut up", "ugly", "freak",
                "worthless", "everyone hates you",
            ]),
        ),
        (
            RiskCategory::Profanity,
            word_pattern(&["wtf", "stfu", "damn", "crap", "bastard", "bitch", "shit", "fuck"]),
        ),
        (
            RiskCategory::MeetingRequest,
            word_pattern(&[
                "meet up", "meet me", "come over", "don't tell your parents", "our secret",
                "send a pic", "send me a photo", "where do you live",
            ]),
        ),
        (
            RiskCategory::PersonalInfo,
            Regex::new(
                r"(?i)\b(?:my address|home address|my password|password is|what school)\b|\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b|[\w.+-]+@[\w-]+\.[\w.]+",
            )
            .unwrap(),
        ),
    ];
    static ref POSITIVE_WORDS: Regex = word_pattern(&[
        "thanks", "thank you", "great", "happy", "love", "awesome", "good", "nice", "fun",
        "glad", "cool", "congrats", "proud",
    ]);
    static ref NEGATIVE_WORDS: Regex = word_pattern(&[
        "hate", "sad", "angry", "bad", "awful", "terrible", "upset", "cry", "scared", "lonely",
        "alone", "afraid",
    ]);
}

/// Analizzatore a lessico, nessuna dipendenza esterna
#[derive(Debug, Default, Clone)]
pub struct LexiconAnalyzer;

impl LexiconAnalyzer {
    fn excerpt(content: &str) -> String {
        let mut excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
        if content.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        excerpt
    }

    fn sentiment(positive: usize, negative: usize) -> (Sentiment, f64) {
        let total = positive + negative;
        if total == 0 {
            return (Sentiment::Neutral, 0.0);
        }
        let score = (positive as f64 - negative as f64) / total as f64;
        let label = if score > 0.2 {
            Sentiment::Positive
        } else if score < -0.2 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };
        (label, score)
    }

    fn risk_level(flags: &[FlaggedMessage]) -> RiskLevel {
        if flags.iter().any(|f| f.category == RiskCategory::SelfHarm)
            || flags.len() >= HIGH_RISK_FLAG_COUNT
        {
            RiskLevel::High
        } else if !flags.is_empty() {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn summary(
        analyzed: usize,
        flags: &[FlaggedMessage],
        counts: &BTreeMap<RiskCategory, usize>,
        sentiment: Sentiment,
    ) -> String {
        if analyzed == 0 {
            return "No messages to analyze.".to_string();
        }
        let tone = match sentiment {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        };
        if flags.is_empty() {
            return format!(
                "Analyzed {} messages. No concerning content detected. Overall tone is {}.",
                analyzed, tone
            );
        }
        let categories = counts
            .iter()
            .map(|(category, count)| format!("{} ({})", category.as_str(), count))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Analyzed {} messages, {} flagged: {}. Overall tone is {}.",
            analyzed,
            flags.len(),
            categories,
            tone
        )
    }
}

impl ChatAnalyzer for LexiconAnalyzer {
    fn analyze(&self, child_id: i32, messages: &[Message]) -> ChatAnalysis {
        let mut flags = Vec::new();
        let mut counts: BTreeMap<RiskCategory, usize> = BTreeMap::new();
        let mut positive = 0;
        let mut negative = 0;

        for message in messages {
            for (category, pattern) in CATEGORY_PATTERNS.iter() {
                if let Some(found) = pattern.find(&message.content) {
                    *counts.entry(*category).or_insert(0) += 1;
                    flags.push(FlaggedMessage {
                        message_id: message.message_id,
                        sender_id: message.sender_id,
                        from_child: message.sender_id == child_id,
                        category: *category,
                        matched: found.as_str().to_lowercase(),
                        excerpt: Self::excerpt(&message.content),
                        created_at: message.created_at,
                    });
                }
            }
            positive += POSITIVE_WORDS.find_iter(&message.content).count();
            negative += NEGATIVE_WORDS.find_iter(&message.content).count();
        }

        let (sentiment, sentiment_score) = Self::sentiment(positive, negative);
        let risk_level = Self::risk_level(&flags);
        let summary = Self::summary(messages.len(), &flags, &counts, sentiment);

        ChatAnalysis {
            messages_analyzed: messages.len(),
            child_message_count: messages.iter().filter(|m| m.sender_id == child_id).count(),
            risk_level,
            sentiment,
            sentiment_score,
            category_counts: counts,
            flags,
            summary,
            analyzed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i32, sender: i32, content: &str) -> Message {
        Message {
            message_id: id,
            sender_id: sender,
            room_id: None,
            recipient_id: Some(if sender == 1 { 2 } else { 1 }),
            content: content.to_string(),
            attachment_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_conversation_is_low_risk() {
        let analysis = LexiconAnalyzer.analyze(1, &[]);
        assert_eq!(analysis.messages_analyzed, 0);
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert!(analysis.flags.is_empty());
    }

    #[test]
    fn test_friendly_chat_is_low_risk_and_positive() {
        let messages = vec![
            msg(1, 1, "Thanks for the help with homework, that was great"),
            msg(2, 2, "Glad it helped! See you in class"),
        ];
        let analysis = LexiconAnalyzer.analyze(1, &messages);
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert_eq!(analysis.child_message_count, 1);
    }

    #[test]
    fn test_single_insult_is_medium_risk() {
        let messages = vec![msg(1, 2, "you are such a loser")];
        let analysis = LexiconAnalyzer.analyze(1, &messages);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.flags.len(), 1);
        assert_eq!(analysis.flags[0].category, RiskCategory::Bullying);
        assert_eq!(analysis.flags[0].matched, "loser");
        assert!(!analysis.flags[0].from_child);
    }

    #[test]
    fn test_self_harm_is_always_high_risk() {
        let messages = vec![msg(1, 1, "sometimes I want to die")];
        let analysis = LexiconAnalyzer.analyze(1, &messages);
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert!(analysis.flags[0].from_child);
    }

    #[test]
    fn test_personal_info_and_meeting_requests_are_flagged() {
        let messages = vec![
            msg(1, 2, "meet me after school, don't tell your parents"),
            msg(2, 1, "ok my number is 555-123-4567"),
            msg(3, 2, "cool"),
        ];
        let analysis = LexiconAnalyzer.analyze(1, &messages);
        assert_eq!(analysis.category_counts.get(&RiskCategory::MeetingRequest), Some(&1));
        assert_eq!(analysis.category_counts.get(&RiskCategory::PersonalInfo), Some(&1));
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_words_inside_other_words_do_not_match() {
        // "classic" contiene "ass", "scrapbook" contiene "crap"
        let messages = vec![msg(1, 1, "a classic scrapbook project")];
        let analysis = LexiconAnalyzer.analyze(1, &messages);
        assert!(analysis.flags.is_empty());
    }

    #[test]
    fn test_excerpt_is_truncated() {
        let long = "a".repeat(200);
        let excerpt = LexiconAnalyzer::excerpt(&long);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 1);
    }
}
