use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::model::{JudgeCode, Testcase, Verdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false;
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for JudgeCode {
    fn color(&self) -> Color {
        use JudgeCode::*;
        if !self::is_truecolor_supported() {
            return match self {
                AC => Color::Green,
                WA => Color::Yellow,
                TLE => Color::Red,
                RE => Color::Magenta,
            };
        }

        let (r, g, b) = match self {
            AC => (30, 180, 40),
            WA => (210, 138, 4),
            TLE => (220, 42, 42),
            RE => (171, 40, 200),
        };
        Color::TrueColor { r, g, b }
    }
}

pub fn judge_icon(judge: JudgeCode) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", judge)
        .on_color(judge.color())
        .bold()
        .color(fg)
}

/// One-line summary, e.g. `Testcase 0 ...  AC   [12ms]`.
pub fn verdict_summary(verdict: &Verdict) -> String {
    let judge = verdict.judge_code();
    let mut s = format!(
        "Testcase {} ... {}{} [{}ms]",
        verdict.id,
        judge_icon(judge),
        " ".repeat(3 - judge.to_string().len()),
        verdict.record.time.as_millis(),
    );
    if let Some(code) = verdict.record.code.filter(|&c| c != 0) {
        s += &format!(" exitcode={}", code);
    }
    if let Some(sig) = &verdict.record.signal {
        s += &format!(" signal={}", sig);
    }
    s
}

pub fn print_verdict_detail(verdict: &Verdict, testcase: &Testcase) {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let cols = cols as usize;

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();

    println!(
        "\n{}: {} [{}ms]\n{}",
        format!("Testcase {}", verdict.id)
            .color(Color::BrightYellow)
            .bold(),
        self::judge_icon(verdict.judge_code()),
        verdict.record.time.as_millis(),
        bold_bar,
    );

    fn print_sub_title(s: &str, cols: usize) {
        println!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE.repeat(cols.saturating_sub(s.len() + 1)).bright_black(),
        )
    }

    fn print_lines(entire_str: &str) {
        let lines: Vec<_> = entire_str.lines().collect();
        if lines.is_empty() {
            println!("{}", "<EMPTY>".magenta().dimmed());
            return;
        }
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim_end();
            print!("{}", trimmed);

            let num_trailing_whitespace = line.len() - trimmed.len();
            if num_trailing_whitespace > 0 {
                print!(
                    "{}{}",
                    " ".repeat(num_trailing_whitespace).on_red(),
                    "(Trailing whitespace)".bright_red().bold()
                );
            }

            let is_last_line = i + 1 == lines.len();
            if is_last_line && !entire_str.ends_with('\n') {
                print!("{}", " Missing new line ".on_yellow().black().bold());
            }

            println!();
        }
    }

    print_sub_title("[input]", cols);
    print_lines(&testcase.input);

    print_sub_title("[expected]", cols);
    print_lines(&testcase.output);

    print_sub_title("[stdout]", cols);
    print_lines(&verdict.record.stdout);

    if !verdict.record.stderr.is_empty() {
        print_sub_title("[stderr]", cols);
        print!("{}", verdict.record.stderr);
    }

    println!("{}", bold_bar);
}
