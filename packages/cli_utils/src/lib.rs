#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the zip map tools.
//!
//! Provides [`init_logger`], which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while spinners redraw, plus
//! spinner and prompt helpers used by the interactive mode.

use std::str::FromStr;
use std::time::Duration;

use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Adds a spinner showing `message` to `multi`.
///
/// The spinner ticks on its own until it is finished or dropped.
#[must_use]
pub fn spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Like [`spinner`], but also shows elapsed time. Used for slow requests
/// such as AI insights.
#[must_use]
pub fn slow_spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.yellow} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Parses optional user input: blank means `None`.
///
/// # Errors
///
/// Returns the parse error if the trimmed input is non-empty and invalid.
pub fn parse_optional<T: FromStr>(input: &str) -> Result<Option<T>, T::Err> {
    let input = input.trim();
    if input.is_empty() {
        Ok(None)
    } else {
        input.parse().map(Some)
    }
}

/// Prompts for a value that may be left empty.
///
/// # Errors
///
/// Returns an error if the prompt fails or the input doesn't parse.
pub fn prompt_optional<T>(prompt: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::error::Error + 'static,
{
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    Ok(parse_optional(&input)?)
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while spinners redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Already set in tests

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn blank_input_is_none() {
        assert_eq!(parse_optional::<f64>("  "), Ok(None));
        assert_eq!(parse_optional::<f64>(" 37.5 "), Ok(Some(37.5)));
        assert!(parse_optional::<f64>("north").is_err());
    }

    #[test]
    fn spinner_carries_message() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = spinner(&multi, "Loading 94043");
        assert_eq!(bar.message(), "Loading 94043");
        bar.finish_and_clear();
    }
}
