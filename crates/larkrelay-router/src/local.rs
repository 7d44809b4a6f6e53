// SPDX-FileCopyrightText: 2026 Larkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic local responder, the terminal fallback.
//!
//! Produces a reply from keyword matching alone. It has no failure mode,
//! so a reply always leaves the pipeline even with every backend down.

const GREETING_WORDS: [&str; 4] = ["你好", "您好", "hello", "hi"];
const HELP_WORDS: [&str; 3] = ["帮助", "help", "功能"];
const TEST_WORDS: [&str; 2] = ["测试", "test"];

pub struct LocalResponder;

impl LocalResponder {
    pub fn reply(&self, message: &str) -> String {
        let lowered = message.trim().to_lowercase();

        if contains_any(&lowered, &GREETING_WORDS) {
            "Hello! I'm the relay assistant.\n\n\
             I'm running in local reply mode right now. Full AI replies return \
             once a reply backend is configured and reachable."
                .to_string()
        } else if contains_any(&lowered, &HELP_WORDS) {
            "I relay chat messages to an AI backend and post the replies here.\n\n\
             Current status: local reply mode. Configure a reply backend to \
             enable full AI conversations."
                .to_string()
        } else if contains_any(&lowered, &TEST_WORDS) {
            "Test successful. The relay is up and can receive and send messages.\n\n\
             Configure a reply backend to enable full AI conversations."
                .to_string()
        } else {
            format!(
                "Received your message: {message}\n\n\
                 Full AI capability is unavailable right now, so this is a local \
                 echo. Please try again later or ask an administrator to check \
                 the reply backend."
            )
        }
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| text.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_in_either_language_get_the_greeting() {
        let responder = LocalResponder;
        assert!(responder.reply("你好").contains("relay assistant"));
        assert!(responder.reply("Hello there").contains("relay assistant"));
    }

    #[test]
    fn help_keywords_get_the_capability_summary() {
        let responder = LocalResponder;
        assert!(responder.reply("帮助").contains("local reply mode"));
        assert!(responder.reply("can you HELP me").contains("local reply mode"));
    }

    #[test]
    fn test_keywords_get_the_liveness_reply() {
        let responder = LocalResponder;
        assert!(responder.reply("测试").starts_with("Test successful"));
        assert!(responder.reply("just a test").starts_with("Test successful"));
    }

    #[test]
    fn everything_else_is_echoed_with_a_note() {
        let responder = LocalResponder;
        let reply = responder.reply("summarize the quarterly plan");
        assert!(reply.contains("Received your message: summarize the quarterly plan"));
        assert!(reply.contains("unavailable"));
    }
}
