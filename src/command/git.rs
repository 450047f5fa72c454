use anyhow::Result;

use crate::bridge::{ProcessOutput, ProcessRunner};

use super::CommandResult;
use super::help::GIT_HELP_TEXT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitSubcommand {
    Init,
    Clone,
    Add,
    Status,
    Commit,
    Reset,
    Branch,
    Checkout,
    Merge,
    Pull,
    Push,
    Log,
    Diff,
    Show,
    Remote,
    Fetch,
    Stash,
    Tag,
    Rebase,
}

impl GitSubcommand {
    pub fn parse(s: &str) -> Option<Self> {
        let sub = match s {
            "init" => GitSubcommand::Init,
            "clone" => GitSubcommand::Clone,
            "add" => GitSubcommand::Add,
            "status" => GitSubcommand::Status,
            "commit" => GitSubcommand::Commit,
            "reset" => GitSubcommand::Reset,
            "branch" => GitSubcommand::Branch,
            "checkout" => GitSubcommand::Checkout,
            "merge" => GitSubcommand::Merge,
            "pull" => GitSubcommand::Pull,
            "push" => GitSubcommand::Push,
            "log" => GitSubcommand::Log,
            "diff" => GitSubcommand::Diff,
            "show" => GitSubcommand::Show,
            "remote" => GitSubcommand::Remote,
            "fetch" => GitSubcommand::Fetch,
            "stash" => GitSubcommand::Stash,
            "tag" => GitSubcommand::Tag,
            "rebase" => GitSubcommand::Rebase,
            _ => return None,
        };
        Some(sub)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GitSubcommand::Init => "init",
            GitSubcommand::Clone => "clone",
            GitSubcommand::Add => "add",
            GitSubcommand::Status => "status",
            GitSubcommand::Commit => "commit",
            GitSubcommand::Reset => "reset",
            GitSubcommand::Branch => "branch",
            GitSubcommand::Checkout => "checkout",
            GitSubcommand::Merge => "merge",
            GitSubcommand::Pull => "pull",
            GitSubcommand::Push => "push",
            GitSubcommand::Log => "log",
            GitSubcommand::Diff => "diff",
            GitSubcommand::Show => "show",
            GitSubcommand::Remote => "remote",
            GitSubcommand::Fetch => "fetch",
            GitSubcommand::Stash => "stash",
            GitSubcommand::Tag => "tag",
            GitSubcommand::Rebase => "rebase",
        }
    }
}

/// Handle everything after the `git` token.
pub(super) fn execute(runner: &dyn ProcessRunner, cwd: &str, args: &[&str]) -> Result<CommandResult> {
    let Some((&first, rest)) = args.split_first() else {
        return Ok(CommandResult::error("git: missing command"));
    };
    if matches!(first, "--help" | "-h" | "help") {
        return Ok(CommandResult::output(GIT_HELP_TEXT));
    }
    let Some(sub) = GitSubcommand::parse(first) else {
        return Ok(CommandResult::error(format!(
            "git: '{first}' is not a git command. See 'git --help'."
        )));
    };

    let tail: Vec<String> = if sub == GitSubcommand::Commit {
        match commit_args(rest) {
            Some(tail) => tail,
            None => return Ok(CommandResult::error("git commit: missing commit message")),
        }
    } else {
        rest.iter().map(ToString::to_string).collect()
    };

    let mut argv = vec!["git".to_string(), sub.as_str().to_string()];
    argv.extend(tail);
    tracing::debug!(subcommand = sub.as_str(), "running git");
    let output = runner.run(cwd, &argv)?;
    Ok(translate(output))
}

/// Arguments for `git commit`, with everything after `-m` folded into a
/// single message. `None` when no message was given.
fn commit_args(args: &[&str]) -> Option<Vec<String>> {
    let mut out = Vec::new();
    for (i, &arg) in args.iter().enumerate() {
        match arg {
            "-m" | "--message" => {}
            "-am" => out.push("-a".to_string()),
            other => {
                out.push(other.to_string());
                continue;
            }
        }
        let message = strip_quotes(&args[i + 1..].join(" "));
        if message.is_empty() {
            return None;
        }
        out.push("-m".to_string());
        out.push(message);
        return Some(out);
    }
    None
}

fn strip_quotes(s: &str) -> String {
    for quote in ['"', '\''] {
        if s.len() >= 2
            && let Some(inner) = s.strip_prefix(quote).and_then(|r| r.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    s.to_string()
}

fn translate(output: ProcessOutput) -> CommandResult {
    let stdout = output.stdout.trim_end();
    let stderr = output.stderr.trim_end();
    if output.success {
        // Several porcelain commands report success on stderr.
        CommandResult::output(if stdout.is_empty() { stderr } else { stdout })
    } else {
        CommandResult::error(if stderr.is_empty() { stdout } else { stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        for name in [
            "init", "clone", "add", "status", "commit", "reset", "branch", "checkout", "merge",
            "pull", "push", "log", "diff", "show", "remote", "fetch", "stash", "tag", "rebase",
        ] {
            assert_eq!(GitSubcommand::parse(name).map(GitSubcommand::as_str), Some(name));
        }
        assert_eq!(GitSubcommand::parse("frobnicate"), None);
        assert_eq!(GitSubcommand::parse("STATUS"), None);
    }

    #[test]
    fn commit_message_is_folded() {
        assert_eq!(
            commit_args(&["-m", "\"fix", "the", "bug\""]),
            Some(vec!["-m".to_string(), "fix the bug".to_string()])
        );
        assert_eq!(
            commit_args(&["--amend", "-m", "msg"]),
            Some(vec!["--amend".to_string(), "-m".to_string(), "msg".to_string()])
        );
        assert_eq!(
            commit_args(&["-am", "'wip'"]),
            Some(vec!["-a".to_string(), "-m".to_string(), "wip".to_string()])
        );
    }

    #[test]
    fn commit_without_message_is_rejected() {
        assert_eq!(commit_args(&[]), None);
        assert_eq!(commit_args(&["fix", "bug"]), None);
        assert_eq!(commit_args(&["-m"]), None);
        assert_eq!(commit_args(&["-m", "\"\""]), None);
    }

    #[test]
    fn strip_quotes_only_strips_matching_pairs() {
        assert_eq!(strip_quotes("\"a b\""), "a b");
        assert_eq!(strip_quotes("'a'"), "a");
        assert_eq!(strip_quotes("\"a'"), "\"a'");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn translate_prefers_the_right_stream() {
        let ok = translate(ProcessOutput {
            success: true,
            stdout: "On branch main\n".into(),
            stderr: String::new(),
        });
        assert_eq!(ok, CommandResult::output("On branch main"));

        let ok_on_stderr = translate(ProcessOutput {
            success: true,
            stdout: String::new(),
            stderr: "Switched to branch 'dev'\n".into(),
        });
        assert_eq!(ok_on_stderr, CommandResult::output("Switched to branch 'dev'"));

        let failed = translate(ProcessOutput {
            success: false,
            stdout: String::new(),
            stderr: "fatal: not a git repository\n".into(),
        });
        assert_eq!(failed, CommandResult::error("fatal: not a git repository"));
    }
}
