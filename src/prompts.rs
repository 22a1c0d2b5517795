pub const ANATOMY_ENHANCEMENT: &str = include_str!("../data/prompts/anatomy_enhancement.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// The text actually sent to the model for an already-trimmed prompt.
pub fn effective_prompt(trimmed: &str, enhance: bool) -> String {
    if enhance {
        render(ANATOMY_ENHANCEMENT.trim_end(), &[("prompt", trimmed)])
    } else {
        trimmed.to_string()
    }
}
