pub const HELP_TEXT: &str = "\
Available commands:
  help                 Show this help
  clear                Clear the current tab
  echo <text>          Print text
  pwd                  Print working directory
  ls [path]            List directory contents
  cd <path>            Change directory
  cat <file>...        Print file contents
  touch <file>...      Create empty files
  mkdir <dir>...       Create directories
  rm [-r] <path>...    Remove files or directories
  cp <src> <dest>      Copy a file
  mv <src> <dest>      Move or rename a file
  git <command>        Run a git command (git --help for a list)

Keyboard shortcuts:
  Up / Down            Browse command history
  Tab                  Accept suggestion
  Ctrl+L               Clear screen
  Ctrl+T / Ctrl+W      New tab / close tab
  F1                   All shortcuts";

pub const GIT_HELP_TEXT: &str = "\
usage: git <command> [<args>]

start a working area
   clone      Clone a repository into a new directory
   init       Create an empty Git repository

work on the current change
   add        Add file contents to the index
   reset      Reset current HEAD to the specified state

examine the history and state
   diff       Show changes between commits, commit and working tree, etc
   log        Show commit logs
   show       Show various types of objects
   status     Show the working tree status

grow, mark and tweak your common history
   branch     List, create, or delete branches
   checkout   Switch branches or restore working tree files
   commit     Record changes to the repository (requires -m <message>)
   merge      Join two or more development histories together
   rebase     Reapply commits on top of another base tip
   stash      Stash the changes in a dirty working directory away
   tag        Create, list, delete or verify a tag object

collaborate
   fetch      Download objects and refs from another repository
   pull       Fetch from and integrate with another repository or a local branch
   push       Update remote refs along with associated objects
   remote     Manage set of tracked repositories";
