use archimedes_config::TemplateId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
  #[error("failed to load template '{name}'")]
  Load {
    name: String,
    #[source]
    source: minijinja::Error,
  },

  #[error("failed to render template '{name}'")]
  Render {
    name: String,
    #[source]
    source: minijinja::Error,
  },

  #[error("template '{template}' rendered an empty {part} instruction")]
  EmptyRender {
    template: TemplateId,
    part: &'static str,
  },

  #[error("template '{0}' requires financial assumptions")]
  MissingAssumptions(TemplateId),
}
