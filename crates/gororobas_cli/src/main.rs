//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `gororobas_core` linkage (`ping`, `version`).
//! - Project a rich-text JSON document from stdin to its card preview
//!   (`preview [max_len]`).
//! - Keep output deterministic for quick local sanity checks.

use gororobas_core::schema::note::NOTE_TITLE_PREVIEW_CHARS;
use gororobas_core::Document;
use std::io::Read;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let result = match args.first().map(String::as_str) {
        None => {
            println!("gororobas_core ping={}", gororobas_core::ping());
            println!("gororobas_core version={}", gororobas_core::core_version());
            Ok(())
        }
        Some("preview") => preview(args.get(1).map(String::as_str)),
        Some(other) => Err(format!(
            "unknown command `{other}`; expected `preview [max_len]`"
        )),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn preview(max_len: Option<&str>) -> Result<(), String> {
    let max_len = match max_len {
        None => NOTE_TITLE_PREVIEW_CHARS,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| format!("max_len must be a non-negative integer, got `{raw}`"))?,
    };

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|err| format!("failed to read stdin: {err}"))?;

    let document =
        Document::from_json_str(&input).map_err(|err| format!("invalid document json: {err}"))?;
    document
        .validate()
        .map_err(|err| format!("invalid document: {err}"))?;
    println!("{}", document.preview(max_len));
    Ok(())
}
