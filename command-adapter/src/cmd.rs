//! Command-line argument construction for the runner binary.

use crate::types::{CommandConfig, MODEL_PLACEHOLDER, PROMPT_PLACEHOLDER, PromptDelivery};
use std::ffi::OsString;

/// Builds the argument list for one invocation.
///
/// With [`PromptDelivery::Argument`] a template without `{prompt}` gets the
/// prompt appended as the last argument. With [`PromptDelivery::Stdin`] any
/// `{prompt}` argument is dropped.
#[must_use]
pub fn build_args(model: &str, prompt: &str, config: &CommandConfig) -> Vec<OsString> {
    let mut args = Vec::with_capacity(config.args.len() + 1);
    let mut prompt_placed = false;

    for arg in &config.args {
        if arg == PROMPT_PLACEHOLDER {
            if config.prompt_delivery == PromptDelivery::Argument {
                args.push(OsString::from(prompt));
                prompt_placed = true;
            }
            continue;
        }
        args.push(OsString::from(arg.replace(MODEL_PLACEHOLDER, model)));
    }

    if config.prompt_delivery == PromptDelivery::Argument && !prompt_placed {
        args.push(OsString::from(prompt));
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_ollama_template() {
        let args = build_args("llama3.2", "What is 2 + 2?", &CommandConfig::ollama());
        assert_eq!(strings(args), vec!["run", "llama3.2", "What is 2 + 2?"]);
    }

    #[test]
    fn test_prompt_appended_when_missing() {
        let config = CommandConfig::default().with_args(["generate", "--model={model}"]);
        let args = build_args("mistral", "hi", &config);
        assert_eq!(strings(args), vec!["generate", "--model=mistral", "hi"]);
    }

    #[test]
    fn test_stdin_delivery_drops_prompt_argument() {
        let config = CommandConfig::ollama().with_prompt_delivery(PromptDelivery::Stdin);
        let args = build_args("llama3.2", "secret prompt", &config);
        assert_eq!(strings(args), vec!["run", "llama3.2"]);
    }

    #[test]
    fn test_prompt_is_not_template_expanded() {
        let args = build_args("m", "literal {model}", &CommandConfig::ollama());
        assert_eq!(strings(args), vec!["run", "m", "literal {model}"]);
    }
}
