//! Module pipeline: module list in, one line of display text out

use super::error::ModuleError;
use super::modules::{parse_modules, ModuleKind, ModuleOutput};
use super::telemetry::Telemetry;
use log::trace;
use std::sync::Arc;
use tickhud_core::UserHandle;
use tickhud_types::Theme;

/// Turns one module's output into text
///
/// Hosts plug in colourisation here; the theme gives the tier colours.
pub type RenderFn = Arc<dyn Fn(&ModuleOutput, &Theme) -> String + Send + Sync>;

/// Plain `"Label: value"` rendering
pub fn standard_render() -> RenderFn {
    Arc::new(|output: &ModuleOutput, _theme: &Theme| format!("{}: {}", output.label, output.value))
}

/// An ordered, validated list of modules bound to a theme and separator
///
/// Rendering reads telemetry only and is safe from any number of threads.
pub struct ModulePipeline {
    modules: Vec<ModuleKind>,
    user: Option<Arc<dyn UserHandle>>,
    theme: Arc<Theme>,
    separator: String,
    render_fn: RenderFn,
}

impl ModulePipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn render(&self, telemetry: &Telemetry) -> String {
        let user = self.user.as_deref();
        self.modules
            .iter()
            .map(|kind| (self.render_fn)(&kind.produce(telemetry, user), &self.theme))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn modules(&self) -> &[ModuleKind] {
        &self.modules
    }
}

pub struct PipelineBuilder {
    modules: Vec<ModuleKind>,
    user: Option<Arc<dyn UserHandle>>,
    theme: Arc<Theme>,
    separator: String,
    render_fn: RenderFn,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            user: None,
            theme: Arc::new(Theme::default()),
            separator: " ".to_string(),
            render_fn: standard_render(),
        }
    }
}

impl PipelineBuilder {
    /// Set modules from a comma separated list
    pub fn modules(mut self, list: &str) -> Result<Self, ModuleError> {
        self.modules = parse_modules(list)?;
        Ok(self)
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = ModuleKind>) -> Self {
        self.modules = kinds.into_iter().collect();
        self
    }

    /// User for modules that need a connection (ping)
    pub fn user(mut self, user: Arc<dyn UserHandle>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn theme(mut self, theme: Arc<Theme>) -> Self {
        self.theme = theme;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn render_fn(mut self, render_fn: RenderFn) -> Self {
        self.render_fn = render_fn;
        self
    }

    /// Finish the pipeline; modules needing a user are dropped when none was given
    pub fn build(self) -> ModulePipeline {
        let has_user = self.user.is_some();
        let modules = self
            .modules
            .into_iter()
            .filter(|kind| {
                let keep = has_user || !kind.needs_user();
                if !keep {
                    trace!("Dropping module '{}' from a render without a user", kind);
                }
                keep
            })
            .collect();

        ModulePipeline {
            modules,
            user: self.user,
            theme: self.theme,
            separator: self.separator,
            render_fn: self.render_fn,
        }
    }
}

/// One-shot render of a module list with the standard render function
pub fn render_modules(
    list: &str,
    user: Option<Arc<dyn UserHandle>>,
    telemetry: &Telemetry,
    separator: &str,
) -> Result<String, ModuleError> {
    let mut builder = ModulePipeline::builder().modules(list)?.separator(separator);
    if let Some(user) = user {
        builder = builder.user(user);
    }
    Ok(builder.build().render(telemetry))
}
