//! Script size limit check

use tracing::{info, warn};

use crate::pipeline::{ComposedProcessor, PackContext, Processor};
use crate::result::Result;

/// Largest script the game accepts, in characters
pub const MAX_SCRIPT_CHARACTERS: usize = 100_000;

/// Warns when the composed script is larger than the in-game limit. The
/// script is passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptSizeCheck;

impl Processor for ScriptSizeCheck {
    fn name(&self) -> &str {
        "script-size-check"
    }
}

impl ComposedProcessor for ScriptSizeCheck {
    fn process(&self, script: String, context: &PackContext) -> Result<String> {
        let characters = script.chars().count();
        if exceeds_limit(characters) {
            warn!(
                "{}: script is {} characters, over the limit of {}",
                context.project_name(),
                characters,
                MAX_SCRIPT_CHARACTERS
            );
        } else {
            info!("{}: script is {} characters", context.project_name(), characters);
        }
        Ok(script)
    }
}

fn exceeds_limit(characters: usize) -> bool {
    characters > MAX_SCRIPT_CHARACTERS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;

    #[test]
    fn test_limit_boundary() {
        assert!(!exceeds_limit(MAX_SCRIPT_CHARACTERS));
        assert!(exceeds_limit(MAX_SCRIPT_CHARACTERS + 1));
    }

    #[test]
    fn test_script_passes_through() {
        let context = PackContext::new("Demo", "/tmp/demo", PackOptions::default());
        let script = "x".repeat(MAX_SCRIPT_CHARACTERS + 10);
        assert_eq!(ScriptSizeCheck.process(script.clone(), &context).unwrap(), script);
    }
}
