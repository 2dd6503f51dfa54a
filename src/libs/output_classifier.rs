//! Presentation of build output.
//!
//! Every stdout line of a command run under the build environment goes through
//! an ordered list of rules; the first rule whose pattern matches decides the
//! line's kind and how it is rendered. Lines no rule matches are passed through
//! behind a dimmed `| ` marker. This is display only: nothing here looks at exit
//! codes or changes what the caller does with the command's result.

use colored::Colorize;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// What a line of build output turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    LinkerWarning,
    CompilerWarning,
    LinkerError,
    CompilerError,
    /// `LINK : command "..." failed (exit code N) with the following output:`
    LinkFailed,
    Plain,
}

impl LineKind {
    pub fn is_error(self) -> bool {
        matches!(self, LineKind::LinkerError | LineKind::CompilerError | LineKind::LinkFailed)
    }

    pub fn is_warning(self) -> bool {
        matches!(self, LineKind::LinkerWarning | LineKind::CompilerWarning)
    }
}

/// A classified line, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: LineKind,
    pub text: String,
}

type Render = fn(&str, &Captures) -> String;

struct Rule {
    kind: LineKind,
    pattern: Regex,
    render: Render,
}

impl Rule {
    fn new(kind: LineKind, pattern: &str, render: Render) -> Self {
        Rule {
            kind,
            pattern: Regex::new(pattern).expect("output classification pattern should compile"),
            render,
        }
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            LineKind::LinkerWarning,
            r"(?P<token>warning LNK\d+|ld(?:\.\w+)?: warning)",
            render_warning,
        ),
        Rule::new(
            LineKind::CompilerWarning,
            r"(?P<token>warning [CD]\d{4}|warning:)",
            render_warning,
        ),
        Rule::new(
            LineKind::LinkerError,
            r"(?P<token>(?:fatal )?error LNK\d+|ld(?:\.\w+)?: error|undefined reference to)",
            render_error,
        ),
        Rule::new(
            LineKind::CompilerError,
            r"(?P<token>(?:fatal )?error [CD]\d{4}|(?:fatal )?error:)",
            render_error,
        ),
        Rule::new(
            LineKind::LinkFailed,
            r#"(?P<head>LINK : command ")(?P<command>.*)(?P<tail>" failed \(exit code -?\d+\) with the following output:)"#,
            render_link_failed,
        ),
    ]
});

/// Splits `line` around the `token` group and renders the token with `paint`.
fn render_token(line: &str, caps: &Captures, paint: fn(&str) -> String) -> String {
    match caps.name("token") {
        Some(token) => format!(
            "{}{}{}",
            &line[..token.start()],
            paint(token.as_str()),
            &line[token.end()..]
        ),
        None => line.to_string(),
    }
}

fn render_warning(line: &str, caps: &Captures) -> String {
    render_token(line, caps, |t| t.yellow().bold().to_string())
}

fn render_error(line: &str, caps: &Captures) -> String {
    render_token(line, caps, |t| t.red().bold().to_string())
}

fn render_link_failed(line: &str, caps: &Captures) -> String {
    let (Some(head), Some(command), Some(tail)) = (caps.name("head"), caps.name("command"), caps.name("tail")) else {
        return line.to_string();
    };
    let mut out = format!("{}{}", &line[..head.start()], head.as_str().magenta().bold());
    for argument in split_arguments(command.as_str()) {
        out.push_str("\n    ");
        out.push_str(&argument);
    }
    out.push('\n');
    out.push_str(&tail.as_str().magenta().bold().to_string());
    out.push_str(&line[tail.end()..]);
    out
}

/// Splits a command line on whitespace, keeping double-quoted runs together.
pub fn split_arguments(command: &str) -> Vec<String> {
    let mut arguments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in command.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    arguments.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        arguments.push(current);
    }
    arguments
}

/// Classifies one line of build output. First matching rule wins.
pub fn classify(line: &str) -> Classified {
    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(line) {
            return Classified {
                kind: rule.kind,
                text: (rule.render)(line, &caps),
            };
        }
    }
    Classified {
        kind: LineKind::Plain,
        text: format!("{}{}", "| ".dimmed(), line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_error_is_flagged_and_plain_line_is_not() {
        let error = classify(r"main.cpp(12): error C2065: 'x': undeclared identifier");
        let plain = classify("[3/8] Building CXX object main.cpp.obj");

        assert_eq!(error.kind, LineKind::CompilerError);
        assert!(error.kind.is_error());
        assert!(error.text.contains("error C2065"));
        assert!(error.text.ends_with(": 'x': undeclared identifier"));

        assert_eq!(plain.kind, LineKind::Plain);
        assert!(!plain.kind.is_error());
        assert!(plain.text.ends_with("[3/8] Building CXX object main.cpp.obj"));
        assert_ne!(plain.text, "[3/8] Building CXX object main.cpp.obj");
    }

    #[test]
    fn rules_apply_in_order() {
        assert_eq!(
            classify("foo.obj : warning LNK4075: ignoring '/EDITANDCONTINUE'").kind,
            LineKind::LinkerWarning
        );
        assert_eq!(classify("/usr/bin/ld.gold: warning: hidden symbol").kind, LineKind::LinkerWarning);
        assert_eq!(
            classify("util.h(3): warning C4996: 'strcpy': This function may be unsafe").kind,
            LineKind::CompilerWarning
        );
        assert_eq!(classify("main.c:4:5: warning: unused variable 'y'").kind, LineKind::CompilerWarning);
        assert_eq!(
            classify("app.exe : fatal error LNK1120: 1 unresolved externals").kind,
            LineKind::LinkerError
        );
        assert_eq!(classify("main.c:(.text+0x1f): undefined reference to `foo'").kind, LineKind::LinkerError);
        assert_eq!(
            classify("cl : Command line error D8021 : invalid numeric argument").kind,
            LineKind::CompilerError
        );
        assert_eq!(classify("main.c(1): fatal error C1083: Cannot open include file").kind, LineKind::CompilerError);
        assert_eq!(classify("main.c:1:10: fatal error: foo.h: No such file").kind, LineKind::CompilerError);
    }

    #[test]
    fn warning_rule_wins_over_error_rule_on_the_same_line() {
        // "warning:" comes before "error:" in rule order
        let classified = classify("main.c:9: warning: treating 'error:' as text");
        assert_eq!(classified.kind, LineKind::CompilerWarning);
        assert!(classified.kind.is_warning());
    }

    #[test]
    fn link_failure_puts_each_argument_on_its_own_line() {
        let line = r#"LINK : command "C:\VS\link.exe /nologo "CMakeFiles\app.dir\main.obj" /out:app.exe" failed (exit code 1120) with the following output:"#;
        let classified = classify(line);
        assert_eq!(classified.kind, LineKind::LinkFailed);

        let lines: Vec<&str> = classified.text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], r"    C:\VS\link.exe");
        assert_eq!(lines[2], "    /nologo");
        assert_eq!(lines[3], r"    CMakeFiles\app.dir\main.obj");
        assert_eq!(lines[4], "    /out:app.exe");
        assert!(lines[5].contains("failed (exit code 1120) with the following output:"));
    }

    #[test]
    fn split_arguments_respects_quotes() {
        assert_eq!(
            split_arguments(r#"link.exe  "/LIBPATH:C:\Program Files\lib" a.obj"#),
            vec!["link.exe", r"/LIBPATH:C:\Program Files\lib", "a.obj"]
        );
        assert!(split_arguments("   ").is_empty());
    }
}
