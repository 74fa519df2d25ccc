/// Number of decimal places kept by [`num2str`].
pub const DISPLAY_DECIMALS: i32 = 4;

/// Format a number rounded to four decimal places for display.
///
/// Integral values keep a trailing `.0` so that feature values read as
/// floats: `num2str(2.0) == "2.0"`.
pub fn num2str(number: f64) -> String {
    let scale = 10f64.powi(DISPLAY_DECIMALS);
    let rounded = (number * scale).round() / scale;
    format!("{rounded:?}")
}

/// Format a vector as `[a, b, c]` using [`num2str`] for each element.
pub fn vec2str(vector: &[f64]) -> String {
    let parts: Vec<String> = vector.iter().copied().map(num2str).collect();
    format!("[{}]", parts.join(", "))
}

/// Naive tokenizer: drop `.` and `,`, lowercase, split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    text.replace(['.', ','], "")
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
