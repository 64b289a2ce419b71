//! Outbound message policy.
//!
//! Every message passes two checks before it may reach the transport: a
//! length cap, and a blocked-term scan. The scan is deliberately
//! conservative: the trimmed, lower-cased text is split on whitespace, and
//! a message is rejected if *any contiguous substring* of any token equals
//! a blocked term. A short blocked token embedded inside a longer innocuous
//! word therefore also rejects ("classic" contains "ass"); do not narrow
//! this to whole-word matching.
//!
//! The substring scan is accelerated with an Aho-Corasick automaton over
//! the term set. Tokens contain no whitespace, so a term occurs as a
//! substring of a token exactly when the automaton matches inside it; the
//! accept/reject decision is identical to the naive all-substrings check.

use aho_corasick::AhoCorasick;
use thiserror::Error;
use tracing::{debug, warn};

/// Why an outbound message was refused. Nothing reaches the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Message too long (max {max} characters)")]
    TooLong { max: usize },

    #[error("Please avoid using offensive language.")]
    Offensive,

    #[error("message is empty")]
    Empty,
}

/// Validates and filters outbound text.
///
/// The blocked-term set is fixed at construction; there is no runtime
/// mutation.
pub struct MessagePolicy {
    matcher: AhoCorasick,
    max_len: usize,
}

impl MessagePolicy {
    /// Build a policy over `terms` with the given length cap.
    pub fn new<I, S>(terms: I, max_len: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let matcher = match AhoCorasick::builder().ascii_case_insensitive(true).build(&patterns) {
            Ok(matcher) => matcher,
            Err(err) => {
                warn!(error = ?err, "Failed to build blocked-term matcher; term matching disabled");
                let empty: Vec<String> = Vec::new();
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .build(&empty)
                    .expect("building empty Aho-Corasick should not fail")
            }
        };
        Self { matcher, max_len }
    }

    /// Validate raw input, returning the trimmed text to send.
    pub fn validate(&self, raw: &str) -> Result<String, Rejection> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Rejection::Empty);
        }
        if trimmed.chars().count() > self.max_len {
            return Err(Rejection::TooLong { max: self.max_len });
        }
        let lowered = trimmed.to_lowercase();
        for token in lowered.split_whitespace() {
            if self.matcher.is_match(token) {
                debug!("blocked term matched in outbound message");
                return Err(Rejection::Offensive);
            }
        }
        Ok(trimmed.to_string())
    }

    /// The configured length cap.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

/// The built-in blocked-term lexicon.
///
/// Multi-word entries are kept for completeness but can never match a
/// single whitespace-delimited token.
pub fn default_blocked_terms() -> &'static [&'static str] {
    &[
        // Profanity
        "fuck", "shit", "bitch", "bastard", "ass", "asshole", "dick", "pussy", "cunt", "damn",
        "crap", "bollocks", "bugger", "fucker", "motherfucker", "cock", "prick", "twat", "douche",
        "slut", "whore", "arse", "arsehole", "piss",
        // Sexual content
        "sex", "porn", "nude", "naked", "penis", "vagina", "rape", "orgy", "boobs", "tits", "cum",
        "ejaculate", "blowjob", "handjob", "masturbate", "hentai", "xxx", "fetish",
        // Violence
        "kill", "murder", "stab", "shoot", "bomb", "gun", "terrorist", "die", "slap", "punch",
        "hurt", "destroy", "assault", "behead", "choke", "fight", "brawl", "attack",
        "kill yourself", "hang", "shoot yourself",
        // Insults
        "loser", "idiot", "stupid", "dumb", "fat", "ugly", "retard", "moron", "nerd", "faggot",
        "dyke", "bitchy", "weirdo", "lame", "jerk", "coward", "scum", "losing", "suck",
        "loserface",
        // Slurs
        "nigger", "chink", "spic", "kike", "gook", "wetback", "coon", "slant", "raghead",
        "towelhead", "cracker", "wop", "hebe", "beaner", "gypsy", "oriental", "injun",
        // Self-harm
        "suicide", "cutting", "kill myself", "die myself", "depress", "self-harm", "anorexia",
        "bulimia", "starve", "faint", "die alone", "cry", "worthless", "worthlessness",
        // Substances
        "drugs", "cocaine", "heroin", "meth", "weed", "marijuana", "alcohol", "binge", "addict",
        "stoned", "stoner", "smoke weed", "ecstasy", "lsd", "molly", "crack", "hash", "opiate",
        "pill", "tripping",
        // Compound insults
        "shithead", "fuckhead", "dumbass", "asshat", "twatface", "dipshit", "tard", "idiotface",
        "asswipe", "numbnuts", "butthole", "douchebag", "wanker", "bloody", "arsewipe",
        "piss off", "screw you", "dammit", "crappy", "loserish", "moronic", "shitbag", "fuckboy",
        "fuckgirl",
        // Harassment
        "molest", "harass", "stalk", "fondle", "touch me", "grope", "perv", "pervert", "pedo",
        "paedo",
        // Graphic violence
        "torture", "beating", "lynch", "massacre", "slaughter", "exterminate", "execute",
        "kill them all", "chop off",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_test() -> MessagePolicy {
        MessagePolicy::new(default_blocked_terms().iter().copied(), 256)
    }

    #[test]
    fn test_clean_message_trimmed() {
        let policy = new_test();
        assert_eq!(policy.validate("  hello there  ").unwrap(), "hello there");
    }

    #[test]
    fn test_empty_rejected() {
        let policy = new_test();
        assert_eq!(policy.validate("   "), Err(Rejection::Empty));
    }

    #[test]
    fn test_length_cap_boundary() {
        let policy = new_test();
        let at_cap = "e".repeat(256);
        assert!(policy.validate(&at_cap).is_ok());

        let over_cap = "e".repeat(257);
        assert_eq!(policy.validate(&over_cap), Err(Rejection::TooLong { max: 256 }));

        // Surrounding whitespace does not count against the cap.
        let padded = format!("   {at_cap}   ");
        assert!(policy.validate(&padded).is_ok());
    }

    #[test]
    fn test_blocked_token() {
        let policy = new_test();
        assert_eq!(policy.validate("you are an ass"), Err(Rejection::Offensive));
    }

    #[test]
    fn test_embedded_substring_rejected() {
        // The check is intentionally containment-based: "classic" embeds
        // "ass" and is rejected even though the word itself is innocuous.
        let policy = new_test();
        assert_eq!(policy.validate("a classic move"), Err(Rejection::Offensive));
        assert_eq!(policy.validate("grasshopper"), Err(Rejection::Offensive));
    }

    #[test]
    fn test_case_insensitive() {
        let policy = new_test();
        assert_eq!(policy.validate("you ASS"), Err(Rejection::Offensive));
    }

    #[test]
    fn test_multi_word_terms_never_match_tokens() {
        // Tokens carry no whitespace, so phrase entries cannot fire unless
        // one of their words is independently blocked.
        let policy = MessagePolicy::new(["free money"], 256);
        assert!(policy.validate("free money for all").is_ok());
    }

    #[test]
    fn test_injected_extra_term() {
        let mut terms: Vec<String> =
            default_blocked_terms().iter().map(|t| t.to_string()).collect();
        terms.push("spoiler".to_string());
        let policy = MessagePolicy::new(terms, 256);
        assert_eq!(policy.validate("huge SPOILERS ahead"), Err(Rejection::Offensive));
        assert!(policy.validate("nothing to see here").is_ok());
    }

    #[test]
    fn test_custom_length_cap() {
        let policy = MessagePolicy::new(["x"], 5);
        assert_eq!(policy.max_len(), 5);
        assert_eq!(policy.validate("toolong"), Err(Rejection::TooLong { max: 5 }));
    }
}
