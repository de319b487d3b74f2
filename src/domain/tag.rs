/// Template rendered by literal placeholder replacement
/// (e.g. `"Release v{VERSION}"` with placeholder `"{VERSION}"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTemplate {
    pub template: String,
    pub placeholder: String,
}

impl VersionTemplate {
    pub fn new(template: impl Into<String>, placeholder: impl Into<String>) -> Self {
        VersionTemplate {
            template: template.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Replace every occurrence of the placeholder with `version`
    pub fn render(&self, version: &str) -> String {
        if self.placeholder.is_empty() {
            return self.template.clone();
        }
        self.template.replace(&self.placeholder, version)
    }

    pub fn has_placeholder(&self) -> bool {
        !self.placeholder.is_empty() && self.template.contains(&self.placeholder)
    }
}
