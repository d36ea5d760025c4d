use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/report.html");

/// HTML document with `{{ slot }}` placeholders.
#[derive(Debug, Clone)]
pub struct HtmlTemplate {
    source: String,
    slot_pattern: Regex,
}

impl HtmlTemplate {
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let slot_pattern = Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").map_err(|e| {
            EtlError::RenderError {
                message: format!("Invalid slot pattern: {}", e),
            }
        })?;
        Ok(Self {
            source: source.into(),
            slot_pattern,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(BUILTIN_TEMPLATE)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::new(source)
    }

    pub fn slots(&self) -> Vec<String> {
        let mut slots: Vec<String> = self
            .slot_pattern
            .captures_iter(&self.source)
            .map(|caps| caps[1].to_string())
            .collect();
        slots.dedup();
        slots
    }

    /// 未提供值的 slot 保留原樣
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let rendered = self
            .slot_pattern
            .replace_all(&self.source, |caps: &regex::Captures| {
                let slot = &caps[1];
                match values.get(slot) {
                    Some(value) => value.clone(),
                    None => {
                        tracing::warn!("Template slot '{}' has no value", slot);
                        caps[0].to_string()
                    }
                }
            });
        rendered.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_render_fills_known_slots() {
        let template = HtmlTemplate::new("<h1>{{ prof_name }}</h1><p>{{missing}}</p>").unwrap();
        let mut values = HashMap::new();
        values.insert("prof_name", "Analyst".to_string());

        assert_eq!(template.render(&values), "<h1>Analyst</h1><p>{{missing}}</p>");
    }

    #[test]
    fn test_builtin_template_exposes_report_slots() {
        let slots = HtmlTemplate::builtin().unwrap().slots();
        for slot in [
            "prof_name",
            "image_name",
            "year_head",
            "city_head",
            "years_headers",
            "years_rows",
            "cities_headers",
            "cities_rows",
        ] {
            assert!(slots.iter().any(|s| s == slot), "missing slot {}", slot);
        }
    }

    #[test]
    fn test_template_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"<title>{{ prof_name }}</title>").unwrap();

        let template = HtmlTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.slots(), vec!["prof_name"]);
    }
}
