//! Variable interpolation for strings
//!
//! Replaces `${var}` references with values from a map, falling back to the
//! process environment.

use crate::error::{InterpolationError, InterpolationResult};
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

const MAX_PASSES: usize = 32;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid interpolation pattern"))
}

/// Interpolate variables in a string
///
/// Supports:
/// - `${var}` - variable from the map
/// - Environment variables (when not found in the map)
///
/// Unknown variables are left as-is.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let re = var_pattern();

    let mut result = s.to_string();
    let mut passes = 0;

    // values may themselves contain references
    loop {
        let mut changed = false;

        result = re
            .replace_all(&result, |caps: &regex::Captures| {
                let var_name = &caps[1];

                if let Some(value) = vars.get(var_name) {
                    changed = true;
                    return value.clone();
                }

                if let Ok(value) = env::var(var_name) {
                    changed = true;
                    return value;
                }

                format!("${{{}}}", var_name)
            })
            .to_string();

        if !changed {
            break;
        }

        passes += 1;
        if passes > MAX_PASSES {
            return Err(InterpolationError::RecursiveInterpolation);
        }
    }

    Ok(result)
}

/// Interpolate with strict mode - errors on undefined variables
pub fn interpolate_strict(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let result = interpolate(s, vars)?;

    if let Some(caps) = var_pattern().captures(&result) {
        return Err(InterpolationError::UndefinedVariable(caps[1].to_string()));
    }

    Ok(result)
}
