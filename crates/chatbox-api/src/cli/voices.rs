//! `chatbox voices` -- print the English voice catalogue.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use chatbox_core::audio::speech::{SpeechSynthesizer, english_voices};

use crate::state::Environment;

pub async fn list_voices(env: &Environment, json: bool) -> Result<()> {
    let speech = env
        .speech()?
        .context("AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set to list voices")?;
    let voices = english_voices(speech.list_voices().await?);

    if json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
        return Ok(());
    }

    if voices.is_empty() {
        println!();
        println!(
            "  {} No English neural voices in region {}",
            style("i").blue().bold(),
            style(&env.config.audio.region).yellow()
        );
        println!();
        return Ok(());
    }

    let default_voice = &env.config.audio.default_voice;

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Voice").fg(Color::White),
        Cell::new("Gender").fg(Color::White),
        Cell::new("Language").fg(Color::White),
        Cell::new("Code").fg(Color::White),
    ]);

    for voice in &voices {
        let id = if &voice.id == default_voice {
            Cell::new(format!("{} (default)", voice.id)).fg(Color::Green)
        } else {
            Cell::new(&voice.id).fg(Color::Cyan)
        };
        table.add_row(vec![
            id,
            Cell::new(&voice.gender),
            Cell::new(&voice.language_name),
            Cell::new(&voice.language_code).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} voice(s)", style(voices.len()).cyan());
    Ok(())
}
