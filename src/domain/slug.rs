//! Slug derivation for stories and topics.
//!
//! A slug keeps the first ASCII alphanumeric run of every space-separated
//! word, lower-cased and joined with `-`. Words without any alphanumeric
//! characters are dropped, so the result may be empty.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Lower-case, dash-joined slug of `input`. Pure and total.
pub fn slugify(input: &str) -> String {
    input
        .split(' ')
        .filter_map(first_alphanumeric_run)
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Like [`slugify`], but rejects inputs that do not yield a usable slug.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

fn first_alphanumeric_run(word: &str) -> Option<&str> {
    let start = word.find(|c: char| c.is_ascii_alphanumeric())?;
    let rest = &word[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}
