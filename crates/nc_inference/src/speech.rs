use nc_core::{write_atomic, Result, SpeechSynthesizer};
use std::path::Path;
use tracing::{info, warn};

/// Pack the words of `text` into chunks of at most `max_chars` characters,
/// breaking only at whitespace. A single word longer than the limit becomes
/// its own chunk.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Read `script` aloud and store the audio at `path`.
///
/// Returns `false` without calling the synthesizer when the script is blank.
pub async fn write_audio(
    synthesizer: &dyn SpeechSynthesizer,
    script: &str,
    path: &Path,
) -> Result<bool> {
    if script.trim().is_empty() {
        warn!("Script is empty; no audio generated");
        return Ok(false);
    }
    let audio = synthesizer.synthesize(script).await?;
    write_atomic(path, &audio).await?;
    info!("🔊 Podcast saved to {} ({} bytes)", path.display(), audio.len());
    Ok(true)
}
