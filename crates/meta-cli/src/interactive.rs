//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based input. Prompts only fill in what the
//! flags left blank, so scripted runs never block.

use colored::Colorize;
use dialoguer::{Confirm, Input};
use meta_diff::RowMeta;

use crate::error::Result;

/// Complete the request metadata stamped onto every diff row, prompting
/// for whatever the flags did not provide.
pub fn complete_row_meta(
    work_team: Option<String>,
    developer: Option<String>,
    story: Option<String>,
    log_name: Option<String>,
    timestamp: String,
) -> Result<RowMeta> {
    let work_team = match work_team {
        Some(value) => value,
        None => Input::new().with_prompt("Work team").interact_text()?,
    };
    let developer = match developer {
        Some(value) => value,
        None => Input::new().with_prompt("Developer name").interact_text()?,
    };
    let user_story = match story {
        Some(value) => value,
        None => Input::new().with_prompt("User story").interact_text()?,
    };
    let log_name = log_name.unwrap_or_else(|| {
        format!("WL-{}", timestamp.replace([' ', ':', '-'], ""))
    });

    println!();
    println!("{}", "Request:".bold());
    println!("  {}: {}", "Work log".dimmed(), log_name.cyan());
    println!("  {}: {}", "Team".dimmed(), work_team.cyan());
    println!("  {}: {}", "Developer".dimmed(), developer.cyan());
    println!("  {}: {}", "Story".dimmed(), user_story.cyan());
    println!();

    Ok(RowMeta {
        log_name,
        timestamp,
        work_team,
        developer,
        user_story,
    })
}

/// A yes/no gate between phases. Declining aborts the phase cleanly.
pub fn confirm_phase(prompt: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_bypass_all_prompts() {
        let meta = complete_row_meta(
            Some("Platform".to_string()),
            Some("ada".to_string()),
            Some("US-42".to_string()),
            None,
            "2026-08-02 10:00:00".to_string(),
        )
        .unwrap();
        assert_eq!(meta.work_team, "Platform");
        assert_eq!(meta.developer, "ada");
        assert_eq!(meta.user_story, "US-42");
        assert_eq!(meta.log_name, "WL-20260802100000");
    }
}
