use crate::backend::Backend;
use crate::formatter::{format_ranking, format_resolution, mask_sensitive};
use crate::mapping::{ElementMapping, PageObjectPayload};
use crate::resolution::LocatorEngine;
use crate::step::{action_data, decompose_step};
use std::error::Error;
use std::io;

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub enum FileErrorMode {
    Plain,
    WithLine,
}

pub struct FileOptions {
    pub stop_on_error: bool,
    pub error_mode: FileErrorMode,
}

/// Resolve each intent and print one line per result.
pub async fn run_intents(
    backend: &mut dyn Backend,
    engine: &mut LocatorEngine,
    output: OutputHandlers,
    intents: &[String],
) -> usize {
    let results = engine.resolve_batch(backend, intents).await;
    let mut failures = 0;
    for (intent, result) in intents.iter().zip(&results) {
        let line = format_resolution(intent, result);
        if result.is_ok() {
            (output.out)(&line);
        } else {
            failures += 1;
            (output.err)(&line);
        }
    }
    failures
}

/// Print the ranked candidate table for each intent.
pub async fn run_explain(
    backend: &mut dyn Backend,
    engine: &LocatorEngine,
    output: OutputHandlers,
    intents: &[String],
) {
    for intent in intents {
        match engine.rank(backend, intent).await {
            Ok(ranking) => (output.out)(&format_ranking(&ranking)),
            Err(e) => (output.err)(&format!("{} -> Error: {}", intent, e)),
        }
    }
}

/// Process a steps file: every `[ai]` step is decomposed into intents which
/// are resolved and recorded in the payload.
pub async fn run_file(
    backend: &mut dyn Backend,
    engine: &mut LocatorEngine,
    output: OutputHandlers,
    path: &str,
    options: FileOptions,
    payload: &mut PageObjectPayload,
) -> Result<(), Box<dyn Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let plan = match decompose_step(trimmed) {
            Ok(plan) => plan,
            Err(e) => {
                report(output, &options, "Error", trimmed, &e.to_string());
                if options.stop_on_error {
                    return Err(io::Error::other(e.to_string()).into());
                }
                continue;
            }
        };
        if !plan.ai_tagged {
            (output.out)(&format!("Skipped (no [ai] tag): {}", trimmed));
            continue;
        }

        (output.out)(&format!("Step: {} ({})", plan.text, plan.method_name()));
        if let Some(data) = action_data(&plan.text) {
            (output.out)(&format!("  Data: {}", mask_sensitive(&plan.text, &data)));
        }
        let intents: Vec<String> = plan.intents.iter().map(|i| i.intent.clone()).collect();
        let results = engine.resolve_batch(backend, &intents).await;

        for (step_intent, result) in plan.intents.iter().zip(results) {
            let mut line = format!("  {}", format_resolution(&step_intent.intent, &result));
            match result {
                Ok(locator) => {
                    let argument = step_intent.parameter.as_ref().map(|p| p.argument.clone());
                    if let Some(p) = &step_intent.parameter {
                        line.push_str(&format!(
                            " value={}",
                            mask_sensitive(&step_intent.intent, &p.value)
                        ));
                    }
                    (output.out)(&line);
                    payload.push(ElementMapping::new(&step_intent.intent, &locator, argument));
                }
                Err(e) => {
                    let label = if e.is_not_found() { "Unresolved" } else { "Error" };
                    report(output, &options, label, trimmed, &e.to_string());
                    if options.stop_on_error {
                        return Err(io::Error::other(e.to_string()).into());
                    }
                }
            }
        }
    }
    Ok(())
}

fn report(output: OutputHandlers, options: &FileOptions, label: &str, line: &str, err: &str) {
    match options.error_mode {
        FileErrorMode::Plain => (output.err)(&format!("{}: {}", label, err)),
        FileErrorMode::WithLine => {
            (output.err)(&format!("{} in step '{}': {}", label, line, err))
        }
    }
}
