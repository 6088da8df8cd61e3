//! System instruction assembly.
//!
//! The persona preamble is rebuilt on every request so the chat's display
//! name shows up as soon as it is known.

/// Persona preamble plus the per-chat addressing line.
///
/// The display name is mentioned exactly once. Returns `None` when there is
/// nothing to send.
pub fn build_system_prompt(instructions: &str, display_name: Option<&str>) -> Option<String> {
    let instructions = instructions.trim();
    let name = display_name.map(str::trim).filter(|n| !n.is_empty());

    let mut prompt = String::with_capacity(instructions.len() + 64);
    prompt.push_str(instructions);

    if let Some(name) = name {
        if !prompt.is_empty() {
            prompt.push_str("\n\n");
        }
        prompt.push_str(&format!(
            "El usuario se llama {name}. Dirígete a él por su nombre cuando sea natural."
        ));
    }

    (!prompt.is_empty()).then_some(prompt)
}

/// Fill the `{name}` placeholder: ", Ana" when the name is known, nothing
/// otherwise.
pub fn render_template(template: &str, display_name: Option<&str>) -> String {
    let fill = display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| format!(", {n}"))
        .unwrap_or_default();
    template.replace("{name}", &fill)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_name() {
        assert_eq!(
            build_system_prompt("  Eres un asistente. ", None).as_deref(),
            Some("Eres un asistente.")
        );
    }

    #[test]
    fn test_prompt_mentions_name_once() {
        let prompt = build_system_prompt("Eres un asistente.", Some("Carlos")).unwrap();
        assert!(prompt.starts_with("Eres un asistente.\n\n"));
        assert_eq!(prompt.matches("Carlos").count(), 1);
    }

    #[test]
    fn test_prompt_blank_inputs() {
        assert_eq!(build_system_prompt("", None), None);
        assert_eq!(build_system_prompt(" ", Some(" ")), None);
        assert_eq!(
            build_system_prompt("", Some("Ana")).as_deref(),
            Some("El usuario se llama Ana. Dirígete a él por su nombre cuando sea natural.")
        );
    }

    #[test]
    fn test_render_template() {
        assert_eq!(render_template("¡Hola{name}!", Some("Ana")), "¡Hola, Ana!");
        assert_eq!(render_template("¡Hola{name}!", None), "¡Hola!");
        assert_eq!(render_template("¡Hola{name}!", Some("  ")), "¡Hola!");
        assert_eq!(render_template("sin marcador", Some("Ana")), "sin marcador");
    }
}
