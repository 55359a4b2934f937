use serde::{Deserialize, Serialize};

use crate::briefing::StoryArticle;

/// Speaking rate used to size scripts: slow enough to follow at 2x.
pub const WORDS_PER_MINUTE: u32 = 130;

pub const SYSTEM_PROMPT: &str = "You are a professional podcast scriptwriter and expert \
    news anchor who summarizes important events in a short spoken podcast.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefingMode {
    /// Fresh articles were ingested this run.
    Daily,
    /// Nothing new survived ingestion; recap what the store already holds.
    Recap,
}

pub fn target_words(minutes: u32) -> u32 {
    minutes * WORDS_PER_MINUTE
}

/// Render one article as a context block.
pub fn context_block(article: &StoryArticle) -> String {
    format!(
        "Title: {}\nSource: {}\n\n{}",
        article.title, article.source, article.text
    )
}

/// Render clustered stories as the context section of the prompt.
pub fn render_context(stories: &[Vec<StoryArticle>]) -> String {
    stories
        .iter()
        .enumerate()
        .map(|(i, story)| {
            let blocks = story.iter().map(context_block).collect::<Vec<_>>().join("\n\n---\n\n");
            format!("Story {} ({} related reports)\n\n{}", i + 1, story.len(), blocks)
        })
        .collect::<Vec<_>>()
        .join("\n\n===\n\n")
}

pub fn build_prompt(mode: BriefingMode, stories: &[Vec<StoryArticle>], minutes: u32) -> String {
    let words = target_words(minutes);
    let opening = match mode {
        BriefingMode::Daily => {
            "You are writing a spoken news script for a short AI-generated podcast."
        }
        BriefingMode::Recap => {
            "You are writing a short spoken recap for an AI-generated podcast. \
             No new stories came in since the last episode, so revisit the most important \
             recent coverage below and say so briefly at the start."
        }
    };

    format!(
        "{opening}

Guidelines:
- Focus only on major United States news and technology stories.
- Each story below groups reports about the same event; cover each story once.
- Be factual, clear, and conversational, as if a calm professional narrator is speaking.
- Do NOT include sound cues, stage directions, or brackets like [music] or [transition].
- Use smooth verbal transitions instead of sound effects.
- Keep sentences short and natural for speech.
- Avoid filler words, opinions, or speculation.
- End with a brief summary or sign-off, no outro music.
- Aim for about {words} words (~{minutes} minutes of speech).

Context (real articles to summarize):
{context}
",
        context = render_context(stories),
    )
}
