//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Format a time value as compact scientific notation.
///
/// Trailing zeros of the mantissa are dropped and the exponent is omitted
/// for magnitudes in `[1, 10)`: `-25e6` renders as `-2.5e7`, `3.0` as `3`.
pub fn format_time(value: f64, decimals: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let mut exponent = value.abs().log10().floor() as i32;
    let mut mantissa = format!("{:.*}", decimals, value / 10f64.powi(exponent));
    // rounding may carry into a new digit (9.999 -> 10.00)
    if mantissa.trim_start_matches('-').starts_with("10") {
        exponent += 1;
        mantissa = format!("{:.*}", decimals, value / 10f64.powi(exponent));
    }
    if mantissa.contains('.') {
        mantissa = mantissa.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    if exponent == 0 {
        mantissa
    } else {
        format!("{mantissa}e{exponent}")
    }
}
