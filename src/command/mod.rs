//! Command-line interpretation.
//!
//! A raw line is split on whitespace, the first token is matched against the
//! closed set of [`Builtin`]s, and whatever happens is folded into a
//! [`CommandResult`]. Nothing in here returns an error to the caller.

mod git;
mod help;

pub use git::GitSubcommand;
pub use help::{GIT_HELP_TEXT, HELP_TEXT};

use anyhow::Result;

use crate::bridge::{FileSystem, FsResponse, ProcessRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Output,
    Error,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Output => "output",
            ResultKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub content: String,
    pub kind: ResultKind,
}

impl CommandResult {
    pub fn output(content: impl Into<String>) -> Self {
        CommandResult {
            content: content.into(),
            kind: ResultKind::Output,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        CommandResult {
            content: content.into(),
            kind: ResultKind::Error,
        }
    }

    fn from_response(response: FsResponse) -> Self {
        if response.success {
            CommandResult::output(response.data.unwrap_or_default())
        } else {
            CommandResult::error(
                response
                    .error
                    .unwrap_or_else(|| "An error occurred".to_string()),
            )
        }
    }
}

/// A dispatched command: its result plus any change to the caller's
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub result: CommandResult,
    pub directory: Option<String>,
}

impl From<CommandResult> for Execution {
    fn from(result: CommandResult) -> Self {
        Execution {
            result,
            directory: None,
        }
    }
}

/// Every command handled without an external shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Clear,
    Help,
    Echo,
    Pwd,
    Ls,
    Cd,
    Cat,
    Touch,
    Mkdir,
    Rm,
    Cp,
    Mv,
    Git,
}

impl Builtin {
    /// Case-insensitive lookup by command name.
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name.to_lowercase().as_str() {
            "clear" => Builtin::Clear,
            "help" => Builtin::Help,
            "echo" => Builtin::Echo,
            "pwd" => Builtin::Pwd,
            "ls" => Builtin::Ls,
            "cd" => Builtin::Cd,
            "cat" => Builtin::Cat,
            "touch" => Builtin::Touch,
            "mkdir" => Builtin::Mkdir,
            "rm" => Builtin::Rm,
            "cp" => Builtin::Cp,
            "mv" => Builtin::Mv,
            "git" => Builtin::Git,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Clear => "clear",
            Builtin::Help => "help",
            Builtin::Echo => "echo",
            Builtin::Pwd => "pwd",
            Builtin::Ls => "ls",
            Builtin::Cd => "cd",
            Builtin::Cat => "cat",
            Builtin::Touch => "touch",
            Builtin::Mkdir => "mkdir",
            Builtin::Rm => "rm",
            Builtin::Cp => "cp",
            Builtin::Mv => "mv",
            Builtin::Git => "git",
        }
    }
}

/// Routes command lines to built-ins, git, or "not found".
pub struct Dispatcher {
    fs: Box<dyn FileSystem>,
    runner: Box<dyn ProcessRunner>,
}

impl Dispatcher {
    pub fn new(fs: Box<dyn FileSystem>, runner: Box<dyn ProcessRunner>) -> Self {
        Dispatcher { fs, runner }
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Run one command line with `cwd` as the working directory.
    pub fn execute_command(&self, raw: &str, cwd: &str) -> Execution {
        match self.dispatch(raw, cwd) {
            Ok(execution) => execution,
            Err(e) => {
                tracing::warn!("command failed: {e:#}");
                let message = format!("{e:#}");
                let message = if message.is_empty() {
                    "An error occurred".to_string()
                } else {
                    message
                };
                CommandResult::error(message).into()
            }
        }
    }

    fn dispatch(&self, raw: &str, cwd: &str) -> Result<Execution> {
        let mut tokens = raw.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(CommandResult::output("").into());
        };
        let args: Vec<&str> = tokens.collect();

        let Some(builtin) = Builtin::from_name(name) else {
            return Ok(CommandResult::error(format!(
                "Command not found: {name}. Type 'help' for available commands."
            ))
            .into());
        };
        tracing::debug!(command = builtin.name(), "dispatching");

        let fs = self.fs.as_ref();
        let result = match builtin {
            Builtin::Clear => CommandResult::output(""),
            Builtin::Help => CommandResult::output(HELP_TEXT),
            Builtin::Echo => CommandResult::output(args.join(" ")),
            Builtin::Pwd => CommandResult::output(fs.pwd(cwd)?),
            Builtin::Ls => {
                let path = args.iter().copied().find(|a| !a.starts_with('-'));
                CommandResult::output(fs.ls(cwd, path)?.join("  "))
            }
            Builtin::Cd => {
                let Some(&target) = args.first() else {
                    return Ok(CommandResult::error("cd: missing directory argument").into());
                };
                let response = fs.cd(cwd, target)?;
                if response.success {
                    return Ok(Execution {
                        result: CommandResult::output(""),
                        directory: response.data,
                    });
                }
                CommandResult::from_response(response)
            }
            Builtin::Cat => {
                let mut content = Vec::new();
                for_each_operand(builtin, &args, |path| {
                    let response = fs.cat(cwd, path)?;
                    if let (true, Some(data)) = (response.success, response.data.as_ref()) {
                        content.push(data.clone());
                    }
                    Ok(response)
                })?
                .unwrap_or_else(|| CommandResult::output(content.concat()))
            }
            Builtin::Touch => for_each_operand(builtin, &args, |p| fs.touch(cwd, p))?
                .unwrap_or_else(|| CommandResult::output("")),
            Builtin::Mkdir => for_each_operand(builtin, &args, |p| fs.mkdir(cwd, p))?
                .unwrap_or_else(|| CommandResult::output("")),
            Builtin::Rm => {
                let recursive = args
                    .iter()
                    .any(|a| a.starts_with('-') && (a.contains('r') || a.contains('R')));
                let operands: Vec<&str> =
                    args.iter().copied().filter(|a| !a.starts_with('-')).collect();
                for_each_operand(builtin, &operands, |p| fs.rm(cwd, p, recursive))?
                    .unwrap_or_else(|| CommandResult::output(""))
            }
            Builtin::Cp | Builtin::Mv => match args.as_slice() {
                [src, dest, ..] => {
                    let response = if builtin == Builtin::Cp {
                        fs.cp(cwd, src, dest)?
                    } else {
                        fs.mv(cwd, src, dest)?
                    };
                    CommandResult::from_response(response)
                }
                _ => CommandResult::error(format!(
                    "{}: missing destination operand",
                    builtin.name()
                )),
            },
            Builtin::Git => git::execute(self.runner.as_ref(), cwd, &args)?,
        };
        Ok(result.into())
    }
}

/// Apply `op` to every operand, stopping at the first failure.
///
/// Returns `Some(error)` for a missing operand or a failed call, `None` when
/// every call succeeded.
fn for_each_operand<F>(builtin: Builtin, operands: &[&str], mut op: F) -> Result<Option<CommandResult>>
where
    F: FnMut(&str) -> Result<FsResponse>,
{
    if operands.is_empty() {
        return Ok(Some(CommandResult::error(format!(
            "{}: missing operand",
            builtin.name()
        ))));
    }
    for operand in operands {
        let response = op(operand)?;
        if !response.success {
            return Ok(Some(CommandResult::from_response(response)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::bail;

    use super::*;
    use crate::bridge::{MockFileSystem, ProcessOutput};

    const HOME: &str = "/home/user";

    /// Records every argv it is asked to run and answers with a canned output.
    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<Vec<String>>>,
        output: ProcessOutput,
        fail: bool,
    }

    impl ProcessRunner for Rc<RecordingRunner> {
        fn run(&self, _cwd: &str, argv: &[String]) -> Result<ProcessOutput> {
            self.calls.borrow_mut().push(argv.to_vec());
            if self.fail {
                bail!("failed to run git: No such file or directory");
            }
            Ok(self.output.clone())
        }
    }

    fn dispatcher_with(runner: &Rc<RecordingRunner>) -> Dispatcher {
        Dispatcher::new(Box::new(MockFileSystem::new()), Box::new(Rc::clone(runner)))
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(&Rc::new(RecordingRunner::default()))
    }

    fn run(d: &Dispatcher, line: &str) -> CommandResult {
        d.execute_command(line, HOME).result
    }

    #[test]
    fn clear_is_empty_output() {
        assert_eq!(run(&dispatcher(), "clear"), CommandResult::output(""));
    }

    #[test]
    fn cd_without_argument() {
        assert_eq!(
            run(&dispatcher(), "cd"),
            CommandResult::error("cd: missing directory argument")
        );
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            run(&dispatcher(), "bogus"),
            CommandResult::error("Command not found: bogus. Type 'help' for available commands.")
        );
    }

    #[test]
    fn help_is_fixed_text() {
        let result = run(&dispatcher(), "HELP");
        assert_eq!(result, CommandResult::output(HELP_TEXT));
        assert!(result.content.lines().count() > 1);
    }

    #[test]
    fn builtins_are_case_insensitive() {
        assert_eq!(run(&dispatcher(), "PwD"), CommandResult::output(HOME));
    }

    #[test]
    fn echo_joins_arguments() {
        assert_eq!(
            run(&dispatcher(), "echo   hello    world"),
            CommandResult::output("hello world")
        );
    }

    #[test]
    fn ls_joins_with_two_spaces_and_skips_flags() {
        assert_eq!(
            run(&dispatcher(), "ls -la"),
            CommandResult::output("documents  readme.txt")
        );
    }

    #[test]
    fn ls_missing_directory_becomes_error_line() {
        let result = run(&dispatcher(), "ls ghost");
        assert_eq!(result.kind, ResultKind::Error);
        assert!(result.content.contains("ghost"));
    }

    #[test]
    fn cd_reports_new_directory() {
        let d = dispatcher();
        let exec = d.execute_command("cd documents", HOME);
        assert_eq!(exec.result, CommandResult::output(""));
        assert_eq!(exec.directory.as_deref(), Some("/home/user/documents"));

        let failed = d.execute_command("cd nowhere", HOME);
        assert_eq!(failed.result.kind, ResultKind::Error);
        assert_eq!(failed.directory, None);
    }

    #[test]
    fn file_operations_round_through_the_filesystem() {
        let d = dispatcher();
        assert_eq!(run(&d, "mkdir src"), CommandResult::output(""));
        assert_eq!(run(&d, "touch src/a src/b"), CommandResult::output(""));
        assert_eq!(run(&d, "ls src"), CommandResult::output("a  b"));
        assert_eq!(run(&d, "cp readme.txt src"), CommandResult::output(""));
        assert_eq!(run(&d, "mv src/a src/c"), CommandResult::output(""));
        assert_eq!(run(&d, "ls src"), CommandResult::output("b  c  readme.txt"));
        assert_eq!(
            run(&d, "cat readme.txt src/readme.txt"),
            CommandResult::output("Welcome to pandora.\nWelcome to pandora.\n")
        );
        assert_eq!(run(&d, "rm src").kind, ResultKind::Error);
        assert_eq!(run(&d, "rm -rf src"), CommandResult::output(""));
        assert_eq!(run(&d, "ls"), CommandResult::output("documents  readme.txt"));
    }

    #[test]
    fn missing_operands() {
        let d = dispatcher();
        assert_eq!(run(&d, "cat"), CommandResult::error("cat: missing operand"));
        assert_eq!(run(&d, "rm -r"), CommandResult::error("rm: missing operand"));
        assert_eq!(
            run(&d, "mv only-one"),
            CommandResult::error("mv: missing destination operand")
        );
    }

    #[test]
    fn soft_failure_carries_collaborator_message() {
        assert_eq!(
            run(&dispatcher(), "cat nope.txt"),
            CommandResult::error("cat: nope.txt: No such file or directory")
        );
    }

    #[test]
    fn git_without_subcommand() {
        assert_eq!(
            run(&dispatcher(), "git"),
            CommandResult::error("git: missing command")
        );
    }

    #[test]
    fn git_unknown_subcommand() {
        assert_eq!(
            run(&dispatcher(), "git frob"),
            CommandResult::error("git: 'frob' is not a git command. See 'git --help'.")
        );
    }

    #[test]
    fn git_commit_requires_message() {
        let runner = Rc::new(RecordingRunner::default());
        let d = dispatcher_with(&runner);
        assert_eq!(
            run(&d, "git commit"),
            CommandResult::error("git commit: missing commit message")
        );
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn git_passes_argv_to_runner() {
        let runner = Rc::new(RecordingRunner {
            output: ProcessOutput {
                success: true,
                stdout: "ok\n".into(),
                stderr: String::new(),
            },
            ..RecordingRunner::default()
        });
        let d = dispatcher_with(&runner);

        assert_eq!(run(&d, "git commit -m \"first commit\""), CommandResult::output("ok"));
        assert_eq!(run(&d, "Git log --oneline -3"), CommandResult::output("ok"));
        assert_eq!(
            *runner.calls.borrow(),
            vec![
                vec!["git", "commit", "-m", "first commit"],
                vec!["git", "log", "--oneline", "-3"],
            ]
        );
    }

    #[test]
    fn runner_failure_is_caught() {
        let d = dispatcher_with(&Rc::new(RecordingRunner {
            fail: true,
            ..RecordingRunner::default()
        }));
        assert_eq!(
            run(&d, "git status"),
            CommandResult::error("failed to run git: No such file or directory")
        );
    }

    #[test]
    fn blank_line_is_empty_output() {
        assert_eq!(run(&dispatcher(), "   "), CommandResult::output(""));
    }
}
