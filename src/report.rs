//! Human-readable rendering for terminal output.
//!
//! Renders password analyses, policies and hash records as colored text
//! blocks. Color is governed globally by `colored::control`.
use colored::*;

use crate::{
    analysis::{PasswordAnalysis, StrengthLevel},
    charset::CharClass,
    hashing::HashInfo,
    policy::{Complexity, Policy},
};

fn visible_len(s: &str) -> usize {
    // Strip ANSI escape sequences (\x1b[ ... m) to compute printable width
    let mut len = 0;
    let mut iter = s.chars().peekable();
    while let Some(ch) = iter.next() {
        if ch == '\u{1b}' {
            if let Some('[') = iter.peek().cloned() {
                let _ = iter.next();
            }
            for c in iter.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            len += 1;
        }
    }
    len
}

fn section_header(title: &str) -> String {
    let len = visible_len(title);
    let mut s = String::new();
    s.push('\n');
    s.push_str(title);
    s.push('\n');
    s.push_str(&"─".repeat(len));
    s.push_str("\n\n");
    s
}

fn push_lines(out: &mut String, lines: Vec<String>) {
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn colored_level(level: StrengthLevel) -> ColoredString {
    let s = level.as_str();
    match level {
        StrengthLevel::VeryWeak | StrengthLevel::Weak => s.red().bold(),
        StrengthLevel::Moderate => s.yellow().bold(),
        StrengthLevel::Good | StrengthLevel::Strong => s.green().bold(),
        StrengthLevel::VeryStrong | StrengthLevel::Excellent => s.bright_green().bold(),
    }
}

pub fn render_analysis(analysis: &PasswordAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&section_header(
        &"Password Analysis".bold().cyan().to_string(),
    ));

    let c = &analysis.character_analysis;
    let mut classes: Vec<&str> = Vec::new();
    for (present, name) in [
        (c.has_lowercase, "lowercase"),
        (c.has_uppercase, "uppercase"),
        (c.has_digits, "digits"),
        (c.has_symbols, "symbols"),
        (c.has_ambiguous, "ambiguous"),
        (c.has_similar, "similar"),
        (c.has_unicode, "unicode"),
    ] {
        if present {
            classes.push(name);
        }
    }
    let mut summary = vec![
        format!("Password: {}", analysis.password),
        format!(
            "Strength: {} ({:.1}/100)",
            colored_level(analysis.strength_level),
            analysis.strength_score
        ),
        format!("Entropy: {:.1} bits", analysis.entropy),
    ];
    summary.push(if classes.is_empty() {
        "Characters: (none recognized)".to_string()
    } else {
        format!("Characters: {}", classes.join(", "))
    });
    push_lines(&mut out, summary);

    out.push_str(&section_header(&"Time to Crack".bold().yellow().to_string()));
    push_lines(
        &mut out,
        analysis
            .time_to_crack
            .iter()
            .map(|(scenario, time)| format!("  {}: {}", scenario.label(), time))
            .collect(),
    );

    if !analysis.policy_compliance.is_empty() {
        out.push_str(&section_header(
            &"Policy Compliance".bold().blue().to_string(),
        ));
        push_lines(
            &mut out,
            analysis
                .policy_compliance
                .iter()
                .map(|(check, passed)| {
                    let mark = if *passed {
                        "pass".green()
                    } else {
                        "FAIL".red().bold()
                    };
                    format!("  {}: {}", check, mark)
                })
                .collect(),
        );
    }

    out.push_str(&section_header(
        &"Vulnerabilities".bold().magenta().to_string(),
    ));
    let vulnerabilities = if analysis.vulnerabilities.is_empty() {
        vec!["(None found)".dimmed().to_string()]
    } else {
        analysis
            .vulnerabilities
            .iter()
            .map(|v| format!("  - {}", v.message().red()))
            .collect()
    };
    push_lines(&mut out, vulnerabilities);

    out.push_str(&section_header(
        &"Recommendations".bold().cyan().to_string(),
    ));
    push_lines(
        &mut out,
        analysis
            .recommendations
            .iter()
            .map(|r| format!("  - {}", r))
            .collect(),
    );

    let d = &analysis.display_digests;
    out.push_str(&section_header(
        &"Digests (display only, not for storage)".bold().to_string(),
    ));
    push_lines(
        &mut out,
        vec![
            format!("  MD5: {}", d.md5.dimmed()),
            format!("  SHA-1: {}", d.sha1.dimmed()),
            format!("  SHA-256: {}", d.sha256.dimmed()),
            format!("  SHA-512: {}", d.sha512.dimmed()),
        ],
    );
    out
}

pub fn render_policy(title: &str, policy: &Policy) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", title.bold().cyan()));

    let mut lines = vec![
        format!("Length: {}-{}", policy.min_length, policy.max_length),
        "Required classes:".bold().blue().to_string(),
    ];
    for class in CharClass::ALL {
        lines.push(if policy.requires(class) {
            format!("  {}: at least {}", class, policy.minimum(class))
        } else {
            format!("  {}: {}", class, "not required".dimmed())
        });
    }
    lines.push("Exclusions:".bold().blue().to_string());
    lines.push(format!("  ambiguous: {}", yes_no(policy.exclude_ambiguous)));
    lines.push(format!("  similar: {}", yes_no(policy.exclude_similar)));
    lines.push(format!("  sequential: {}", yes_no(policy.exclude_sequential)));
    lines.push(if policy.exclude_repetitive {
        format!("  repetitive: yes (max {} in a row)", policy.max_consecutive)
    } else {
        "  repetitive: no".to_string()
    });
    lines.push(format!("  dictionary: {}", yes_no(policy.exclude_dictionary)));
    lines.push(if policy.custom_exclusions.is_empty() {
        format!("  custom: {}", "(none)".dimmed())
    } else {
        format!("  custom: {}", policy.custom_exclusions.join(" "))
    });
    lines.push(format!(
        "Entropy threshold: {:.1} bits",
        policy.entropy_threshold
    ));
    push_lines(&mut out, lines);
    out
}

pub fn render_policy_list() -> String {
    let mut out = String::new();
    out.push_str(&section_header(
        &"Complexity Tiers".bold().cyan().to_string(),
    ));
    for tier in Complexity::ALL {
        let p = Policy::for_complexity(tier);
        out.push_str(&format!(
            "  {:<9} length {}-{}, entropy >= {:.0} bits\n",
            tier.name().bold(),
            p.min_length,
            p.max_length,
            p.entropy_threshold
        ));
    }
    out
}

pub fn render_hash_info(info: &HashInfo) -> String {
    let mut out = String::new();
    out.push_str(&section_header(&"Hash".bold().cyan().to_string()));
    let mut lines = vec![
        format!("Algorithm: {}", info.algorithm),
        format!("Salt: {}", info.salt),
        format!("Hash: {}", info.hash.green()),
    ];
    if let Some(iterations) = info.iterations {
        lines.push(format!("Iterations: {}", iterations));
    }
    lines.push(format!("Timestamp: {}", info.timestamp.to_rfc3339()));
    push_lines(&mut out, lines);
    out
}
