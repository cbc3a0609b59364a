use std::collections::HashMap;

/// Literal `{{key}}` substitution.
///
/// Each variable is replaced with its value via direct string replace, in
/// arbitrary order, without escaping or conditional logic. Placeholders with
/// no matching variable are left in place; rendering never fails.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in vars {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}
