use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

/// How many submissions the recency buffer keeps.
pub const RECENT_LIMIT: usize = 10;

/// Upper bound on suggestions returned by [`Predictor::predict_next`].
pub const MAX_PREDICTIONS: usize = 5;

/// Usage statistics for one exact command string.
#[derive(Debug, Clone)]
pub struct CommandPattern {
    pub command: String,
    pub frequency: u32,
    pub last_used: DateTime<Utc>,
    pub context: BTreeSet<String>,
    /// Monotonic tick of the last use. Wall-clock time can repeat within a
    /// burst of submissions, the tick cannot.
    last_tick: u64,
}

impl CommandPattern {
    fn context_overlap(&self, context: &[String]) -> usize {
        context.iter().filter(|c| self.context.contains(*c)).count()
    }
}

/// Frequency/recency model over previously run commands.
///
/// One instance is created per running terminal and handed to whoever needs
/// suggestions; nothing here is global.
#[derive(Debug, Default)]
pub struct Predictor {
    patterns: HashMap<String, CommandPattern>,
    recent: Vec<String>,
    tick: u64,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one submission of `command`, tagging it with `context`.
    pub fn add_command(&mut self, command: &str, context: &[String]) {
        if command.trim().is_empty() {
            return;
        }
        self.tick += 1;
        let tick = self.tick;

        let pattern = self
            .patterns
            .entry(command.to_string())
            .or_insert_with(|| CommandPattern {
                command: command.to_string(),
                frequency: 0,
                last_used: Utc::now(),
                context: BTreeSet::new(),
                last_tick: 0,
            });
        pattern.frequency += 1;
        pattern.last_used = Utc::now();
        pattern.last_tick = tick;
        pattern.context.extend(context.iter().cloned());

        self.recent.retain(|c| c != command);
        self.recent.insert(0, command.to_string());
        self.recent.truncate(RECENT_LIMIT);
    }

    /// Commands starting with `current_input`, best first.
    ///
    /// Ranked by frequency, then by how many of `context`'s tags the command
    /// was seen with, then by how recently it ran.
    pub fn predict_next(&self, current_input: &str, context: &[String]) -> Vec<String> {
        if current_input.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<&CommandPattern> = self
            .patterns
            .values()
            .filter(|p| p.command.starts_with(current_input))
            .collect();
        matches.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| b.context_overlap(context).cmp(&a.context_overlap(context)))
                .then_with(|| b.last_tick.cmp(&a.last_tick))
        });
        matches
            .into_iter()
            .take(MAX_PREDICTIONS)
            .map(|p| p.command.clone())
            .collect()
    }

    /// Most recent distinct submissions, newest first.
    pub fn recent_commands(&self) -> &[String] {
        &self.recent
    }

    pub fn pattern(&self, command: &str) -> Option<&CommandPattern> {
        self.patterns.get(command)
    }

    /// Forget everything recorded so far.
    pub fn reset(&mut self) {
        self.patterns.clear();
        self.recent.clear();
        self.tick = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(tags: &[&str]) -> Vec<String> {
        tags.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_input_predicts_nothing() {
        let mut p = Predictor::new();
        p.add_command("ls", &[]);
        assert!(p.predict_next("", &[]).is_empty());
    }

    #[test]
    fn frequent_command_is_predicted_and_recency_is_newest_first() {
        let mut p = Predictor::new();
        for _ in 0..10 {
            p.add_command("ls", &[]);
        }
        p.add_command("pwd", &[]);

        assert!(p.predict_next("l", &[]).contains(&"ls".to_string()));

        let recent = p.recent_commands();
        assert!(recent.len() <= RECENT_LIMIT);
        assert_eq!(recent[0], "pwd");
        assert_eq!(recent[1], "ls");
    }

    #[test]
    fn recency_buffer_is_bounded() {
        let mut p = Predictor::new();
        for i in 0..25 {
            p.add_command(&format!("echo {i}"), &[]);
        }
        let recent = p.recent_commands();
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0], "echo 24");
        assert_eq!(recent[RECENT_LIMIT - 1], "echo 15");
    }

    #[test]
    fn frequency_ranks_first() {
        let mut p = Predictor::new();
        p.add_command("git status", &[]);
        p.add_command("git status", &[]);
        p.add_command("git push", &[]);
        assert_eq!(p.predict_next("git", &[]), vec!["git status", "git push"]);
    }

    #[test]
    fn context_overlap_breaks_frequency_ties() {
        let mut p = Predictor::new();
        p.add_command("cargo test", &ctx(&["/work/rust"]));
        p.add_command("cargo tree", &ctx(&["/work/other"]));
        let predicted = p.predict_next("cargo", &ctx(&["/work/rust"]));
        assert_eq!(predicted, vec!["cargo test", "cargo tree"]);
    }

    #[test]
    fn recency_breaks_remaining_ties() {
        let mut p = Predictor::new();
        p.add_command("cat a.txt", &[]);
        p.add_command("cat b.txt", &[]);
        assert_eq!(p.predict_next("cat", &[]), vec!["cat b.txt", "cat a.txt"]);
    }

    #[test]
    fn prefix_match_is_case_sensitive_and_capped() {
        let mut p = Predictor::new();
        for i in 0..8 {
            p.add_command(&format!("ls dir{i}"), &[]);
        }
        assert_eq!(p.predict_next("ls", &[]).len(), MAX_PREDICTIONS);
        assert!(p.predict_next("LS", &[]).is_empty());
    }

    #[test]
    fn repeat_updates_pattern_in_place() {
        let mut p = Predictor::new();
        p.add_command("make", &ctx(&["a"]));
        p.add_command("make", &ctx(&["b", "a"]));
        let pattern = p.pattern("make").unwrap();
        assert_eq!(pattern.frequency, 2);
        assert_eq!(pattern.context.len(), 2);
    }

    #[test]
    fn blank_commands_are_ignored() {
        let mut p = Predictor::new();
        p.add_command("   ", &[]);
        assert!(p.recent_commands().is_empty());
    }

    #[test]
    fn reset_clears_state() {
        let mut p = Predictor::new();
        p.add_command("ls", &[]);
        p.reset();
        assert!(p.recent_commands().is_empty());
        assert!(p.predict_next("l", &[]).is_empty());
    }
}
