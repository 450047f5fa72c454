/// Whole-input typos with a fixed replacement. Checked against the full line
/// first, then against the first token.
const COMMON_MISTAKES: &[(&str, &str)] = &[
    ("gti", "git"),
    ("sl", "ls"),
    ("cd..", "cd .."),
    ("grpe", "grep"),
    ("pythno", "python"),
];

/// Commands the fuzzy matcher may correct towards. Order matters: on equal
/// distance the earlier entry wins.
pub const KNOWN_COMMANDS: &[&str] = &[
    "git", "ls", "cd", "pwd", "mkdir", "rm", "cp", "mv", "cat", "grep", "echo", "touch", "chmod",
    "chown", "ssh", "npm", "yarn", "node", "python", "docker", "kubectl",
];

/// Largest edit distance still accepted as a typo.
const MAX_DISTANCE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub corrected: String,
    pub is_correction: bool,
    /// The fix came from the fixed typo table rather than the fuzzy matcher.
    pub known_typo: bool,
}

impl Correction {
    fn unchanged(input: &str) -> Self {
        Correction {
            corrected: input.to_string(),
            is_correction: false,
            known_typo: false,
        }
    }
}

/// Map a mistyped command line to the nearest known command.
///
/// Only the first token is ever rewritten; arguments and the whitespace
/// between them are preserved as typed.
pub fn correct_command(input: &str) -> Correction {
    if let Some(fixed) = lookup_mistake(input) {
        return Correction {
            corrected: fixed.to_string(),
            is_correction: true,
            known_typo: true,
        };
    }

    let leading = input.len() - input.trim_start().len();
    let body = &input[leading..];
    let token_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let candidate = &body[..token_end];
    if candidate.is_empty() {
        return Correction::unchanged(input);
    }

    let replacement = match lookup_mistake(candidate) {
        Some(cmd) => Some((cmd, true)),
        None => closest_known(candidate).map(|cmd| (cmd, false)),
    };
    match replacement {
        Some((cmd, known_typo)) if cmd != candidate => Correction {
            corrected: format!("{}{cmd}{}", &input[..leading], &body[token_end..]),
            is_correction: true,
            known_typo,
        },
        _ => Correction::unchanged(input),
    }
}

fn lookup_mistake(s: &str) -> Option<&'static str> {
    COMMON_MISTAKES
        .iter()
        .find(|(typo, _)| *typo == s)
        .map(|(_, fixed)| *fixed)
}

fn closest_known(candidate: &str) -> Option<&'static str> {
    let needle = candidate.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for &cmd in KNOWN_COMMANDS {
        let distance = levenshtein(&needle, cmd);
        if distance <= MAX_DISTANCE && best.is_none_or(|(_, d)| distance < d) {
            best = Some((cmd, distance));
        }
    }
    best.map(|(cmd, _)| cmd)
}

/// Classic dynamic-programming edit distance over `char`s, keeping one row.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut row: Vec<usize> = (0..=a.len()).collect();
    for (j, cb) in b.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = j + 1;
        for (i, ca) in a.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[i + 1];
            row[i + 1] = substitution.min(row[i] + 1).min(row[i + 1] + 1);
        }
    }
    row[a.len()]
}
