use buildroll_core::Build;

/// Turns a build into something a person or a program can read.
pub trait BuildRenderer {
    fn render(&self, build: &Build) -> anyhow::Result<String>;
}

/// Multi-line chat-style message.
pub struct TextRenderer;

impl BuildRenderer for TextRenderer {
    fn render(&self, build: &Build) -> anyhow::Result<String> {
        let heroes = build
            .characters
            .iter()
            .map(|c| format!("- {} ({})", c.name, c.attribute))
            .collect::<Vec<_>>()
            .join("\n");

        let items = build
            .equipment
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {} ({} gold)", i + 1, e.name, e.cost))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!(
            "Heroes:\n{}\n\nItems:\n{}\n\nTotal cost: {} gold",
            heroes,
            items,
            build.total_cost()
        ))
    }
}

/// Pretty-printed JSON.
pub struct JsonRenderer;

impl BuildRenderer for JsonRenderer {
    fn render(&self, build: &Build) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(build)?)
    }
}
