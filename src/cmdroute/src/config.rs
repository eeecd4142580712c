//! Dispatcher configuration.

use std::path::Path;

use crate::template::{Template, TemplateError};
use crate::usage::{DEFAULT_USAGE_TEMPLATE, PROGRAM_FIELDS};

/// Program name used when none is configured and `argv[0]` is unusable.
pub const DEFAULT_PROGRAM_NAME: &str = "cmd";

/// Default program short description.
pub const DEFAULT_SHORT: &str = "Command-line tool";

/// Display settings for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    program_name: Option<String>,
    short: String,
    usage_template: Template,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            program_name: None,
            short: DEFAULT_SHORT.to_string(),
            usage_template: default_template(),
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed program name instead of the executable's file name.
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }

    /// Set the program short description.
    pub fn with_short(mut self, short: impl Into<String>) -> Self {
        self.short = short.into();
        self
    }

    /// Replace the program-level usage template.
    ///
    /// The template may reference `Name`, `Short`, `Commands` and `Flags`.
    pub fn with_usage_template(mut self, text: &str) -> Result<Self, TemplateError> {
        let template = Template::parse(text)?;
        if let Some(field) = template
            .fields()
            .into_iter()
            .find(|field| !PROGRAM_FIELDS.contains(field))
        {
            return Err(TemplateError::UnknownField(field.to_string()));
        }
        self.usage_template = template;
        Ok(self)
    }

    /// Program name: the configured one, else the base file name of
    /// `argv[0]`, else [`DEFAULT_PROGRAM_NAME`].
    pub fn program_name(&self) -> String {
        if let Some(name) = &self.program_name {
            return name.clone();
        }
        std::env::args_os()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string())
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn usage_template(&self) -> &Template {
        &self.usage_template
    }
}

fn default_template() -> Template {
    match Template::parse(DEFAULT_USAGE_TEMPLATE) {
        Ok(template) => template,
        Err(err) => unreachable!("default usage template is invalid: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.short(), DEFAULT_SHORT);
        assert_eq!(config.usage_template().source(), DEFAULT_USAGE_TEMPLATE);
        assert!(!config.program_name().is_empty());
    }

    #[test]
    fn test_default_template_fields() {
        let config = DispatchConfig::default();
        assert_eq!(
            config.usage_template().fields(),
            vec!["Name", "Short", "Commands", "Flags"]
        );
    }

    #[test]
    fn test_program_name_override() {
        let config = DispatchConfig::new().with_program_name("git-lite");
        assert_eq!(config.program_name(), "git-lite");
    }

    #[test]
    fn test_program_name_from_argv0_is_a_base_name() {
        let name = DispatchConfig::new().program_name();
        assert!(!name.contains('/'), "name: {name}");
    }

    #[test]
    fn test_usage_template_validation() {
        let config = DispatchConfig::new().with_usage_template("{{.Name}}: {{.Short}}");
        assert!(config.is_ok());

        let err = DispatchConfig::new()
            .with_usage_template("{{.Name}} {{.Long}}")
            .unwrap_err();
        assert_eq!(err, TemplateError::UnknownField("Long".to_string()));

        let err = DispatchConfig::new().with_usage_template("{{.Name").unwrap_err();
        assert_eq!(err, TemplateError::Unterminated(0));
    }
}
